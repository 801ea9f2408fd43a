use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a single placement or backport copy failed.
///
/// Per-item: the run records it and moves on to the next file.
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("source file does not exist")]
    SourceMissing,

    #[error("source is not a regular file")]
    SourceNotFile,

    #[error("cannot create directory {}: {source}", .path.display())]
    CreateParent { path: PathBuf, source: io::Error },

    #[error("cannot remove existing destination: {0}")]
    RemoveExisting(io::Error),

    #[error("destination exists as a directory")]
    DestinationIsDirectory,

    #[error("not allowed to create symbolic links here ({0}); use copy mode instead")]
    SymlinkPrivilege(io::Error),

    #[error("permission denied: {0}")]
    PermissionDenied(io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("symbolic link verification failed: {0}")]
    VerifyFailed(String),
}

impl PlacementError {
    pub fn verify_failed(msg: impl Into<String>) -> Self {
        Self::VerifyFailed(msg.into())
    }

    /// Map a write failure, separating permission problems from other I/O.
    pub fn from_write(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::PermissionDenied {
            Self::PermissionDenied(err)
        } else {
            Self::Io(err)
        }
    }

    /// Map a symlink creation failure. Missing privilege (Windows without
    /// developer mode, or a filesystem that rejects links) gets its own
    /// variant so the caller can suggest copying instead.
    pub fn from_symlink(err: io::Error) -> Self {
        if is_symlink_privilege_error(&err) {
            Self::SymlinkPrivilege(err)
        } else {
            Self::from_write(err)
        }
    }

    pub fn is_privilege(&self) -> bool {
        matches!(self, Self::SymlinkPrivilege(_))
    }
}

#[cfg(windows)]
fn is_symlink_privilege_error(err: &io::Error) -> bool {
    // ERROR_PRIVILEGE_NOT_HELD
    err.raw_os_error() == Some(1314)
}

#[cfg(unix)]
fn is_symlink_privilege_error(err: &io::Error) -> bool {
    // EPERM: the filesystem does not support symlinks (FAT, exFAT, some SMB mounts)
    err.raw_os_error() == Some(1)
}

#[cfg(not(any(unix, windows)))]
fn is_symlink_privilege_error(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::Unsupported
}
