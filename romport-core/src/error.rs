use std::path::PathBuf;

use thiserror::Error;

use crate::profile::ProfileError;

/// Fatal errors. Any of these aborts the run before a file is touched.
///
/// Per-item problems (a symlink that cannot be created, a permission denied
/// on one file) are not represented here; they are recorded as failed
/// outcomes and the run continues.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Missing or invalid destination profile fields
    #[error("Configuration error: {0}")]
    Configuration(ProfileError),

    /// The archive is missing a required root directory
    #[error("Invalid archive structure: {0}")]
    Structure(String),

    /// No destination profile matches the requested identifier
    #[error("{0}")]
    NotFound(ProfileError),

    /// The external catalog input could not be read
    #[error("Cannot read catalog input: {0}")]
    Catalog(String),

    /// The destination root could not be prepared
    #[error("Cannot prepare destination {}: {source}", .path.display())]
    Destination {
        path: PathBuf,
        source: std::io::Error,
    },

    /// I/O error outside of per-item processing
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    pub fn structure(msg: impl Into<String>) -> Self {
        Self::Structure(msg.into())
    }

    pub fn catalog(msg: impl ToString) -> Self {
        Self::Catalog(msg.to_string())
    }

    /// True for errors caused by configuration rather than the filesystem.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::NotFound(_))
    }
}

impl From<ProfileError> for ExportError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::NotFound { .. } => Self::NotFound(err),
            other => Self::Configuration(other),
        }
    }
}
