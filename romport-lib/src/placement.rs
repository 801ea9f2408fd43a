//! Placement Engine: make one source file available at one destination path.
//!
//! Knows nothing about games, platforms or categories. Given a source, a
//! destination and a policy it decides what to do, then does it (or, in a
//! dry run, reports what it would have done with the same decision).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use serde::Serialize;

use crate::error::PlacementError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PlacementMode {
    /// Reference the source without duplicating bytes
    Symlink,
    /// Duplicate content, preserving the modification time
    Copy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PlacementAction {
    Create,
    SkipExisting,
    Overwrite,
}

/// What the engine decided for one file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PlacementDecision {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub action: PlacementAction,
    pub mode: PlacementMode,
}

#[derive(Debug)]
pub enum PlacementOutcome {
    Created(PlacementDecision),
    Skipped(PlacementDecision),
    /// Dry run: the decision a real run would act on
    Simulated(PlacementDecision),
    Failed {
        source: PathBuf,
        destination: PathBuf,
        error: PlacementError,
    },
}

impl PlacementOutcome {
    pub fn decision(&self) -> Option<&PlacementDecision> {
        match self {
            Self::Created(d) | Self::Skipped(d) | Self::Simulated(d) => Some(d),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Decide what placing `source` at `destination` means. Read-only.
pub fn plan(
    source: &Path,
    destination: &Path,
    mode: PlacementMode,
    force: bool,
) -> Result<PlacementDecision, PlacementError> {
    let source_meta = match fs::metadata(source) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(PlacementError::SourceMissing),
        Err(e) => return Err(PlacementError::Io(e)),
    };
    if !source_meta.is_file() {
        return Err(PlacementError::SourceNotFile);
    }

    // symlink_metadata so a dangling link still counts as existing
    let action = match fs::symlink_metadata(destination) {
        Ok(_) if !force => PlacementAction::SkipExisting,
        Ok(meta) if meta.file_type().is_dir() => return Err(PlacementError::DestinationIsDirectory),
        Ok(_) => PlacementAction::Overwrite,
        Err(e) if e.kind() == io::ErrorKind::NotFound => PlacementAction::Create,
        Err(e) => return Err(PlacementError::Io(e)),
    };

    Ok(PlacementDecision {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        action,
        mode,
    })
}

/// Place `source` at `destination`.
///
/// An existing destination is skipped unless `force` is set; with `force` it
/// is removed first (never when it is a directory). `dry_run` performs no
/// filesystem mutation.
pub fn place(
    source: &Path,
    destination: &Path,
    mode: PlacementMode,
    force: bool,
    dry_run: bool,
) -> PlacementOutcome {
    let failed = |error| PlacementOutcome::Failed {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        error,
    };

    let decision = match plan(source, destination, mode, force) {
        Ok(decision) => decision,
        Err(e) => return failed(e),
    };

    if dry_run {
        log::debug!(
            "DRY-RUN: {:?} {} -> {}",
            decision.action,
            source.display(),
            destination.display()
        );
        return PlacementOutcome::Simulated(decision);
    }

    if decision.action == PlacementAction::SkipExisting {
        log::debug!("Skipping existing {}", destination.display());
        return PlacementOutcome::Skipped(decision);
    }

    match execute(&decision) {
        Ok(()) => PlacementOutcome::Created(decision),
        Err(e) => failed(e),
    }
}

fn execute(decision: &PlacementDecision) -> Result<(), PlacementError> {
    let destination = &decision.destination;

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|source| PlacementError::CreateParent {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    if decision.action == PlacementAction::Overwrite {
        fs::remove_file(destination).map_err(PlacementError::RemoveExisting)?;
    }

    match decision.mode {
        PlacementMode::Symlink => {
            let target = std::path::absolute(&decision.source)?;
            create_symlink(&target, destination).map_err(PlacementError::from_symlink)?;
            verify_symlink(&target, destination)?;
            log::debug!("Linked {} -> {}", destination.display(), target.display());
        }
        PlacementMode::Copy => {
            fs::copy(&decision.source, destination).map_err(PlacementError::from_write)?;
            preserve_mtime(&decision.source, destination);
            log::debug!(
                "Copied {} -> {}",
                decision.source.display(),
                destination.display()
            );
        }
    }
    Ok(())
}

fn verify_symlink(target: &Path, link: &Path) -> Result<(), PlacementError> {
    let meta = fs::symlink_metadata(link)?;
    if !meta.file_type().is_symlink() {
        return Err(PlacementError::verify_failed(format!(
            "{} is not a symbolic link",
            link.display()
        )));
    }
    let points_to = fs::read_link(link)?;
    if points_to != target {
        return Err(PlacementError::verify_failed(format!(
            "{} points to {} instead of {}",
            link.display(),
            points_to.display(),
            target.display()
        )));
    }
    Ok(())
}

/// Copy the source modification time onto `dest`. Failure only warns.
pub(crate) fn preserve_mtime(source: &Path, dest: &Path) {
    let Ok(meta) = fs::metadata(source) else {
        return;
    };
    let mtime = FileTime::from_last_modification_time(&meta);
    if let Err(e) = filetime::set_file_mtime(dest, mtime) {
        log::warn!("Cannot preserve modification time on {}: {e}", dest.display());
    }
}

#[cfg(unix)]
fn create_symlink(source: &Path, dest: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, dest)
}

#[cfg(windows)]
fn create_symlink(source: &Path, dest: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(source, dest)
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_source: &Path, _dest: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "symlink unavailable on this platform",
    ))
}

#[cfg(test)]
#[path = "tests/placement_tests.rs"]
mod tests;
