//! Backport Reconciler: copy metadata found at the destination back into the
//! archive when the archive lacks it.
//!
//! The archive side is never overwritten, whatever `force` says.

use std::fs;
use std::path::{Path, PathBuf};

use romport_core::archive::{EntryFilter, list_dir_names};
use romport_core::util::{dotted_extension, file_stem_str};
use romport_core::{Archive, DestinationProfile, GameFile};
use serde::Serialize;

use crate::candidates::{destination_stem, search_space};
use crate::error::PlacementError;
use crate::layout::DestinationLayout;
use crate::placement::preserve_mtime;
use crate::session::SubdirectorySelection;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BackportOutcome {
    Copied { from: PathBuf, to: PathBuf },
    /// Dry run: would have copied
    Simulated { from: PathBuf, to: PathBuf },
    SkippedArchiveHasIt { path: PathBuf },
    SkippedDestinationMissing,
    Failed {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },
}

/// Everything needed to reconcile one platform.
pub struct BackportContext<'a> {
    pub archive: &'a Archive,
    pub profile: &'a DestinationProfile,
    pub layout: &'a DestinationLayout,
    pub platform_name: &'a str,
    pub system_id: &'a str,
    /// Variant subdirectories export searched in the archive
    pub subdirectories: Option<&'a SubdirectorySelection>,
    pub dry_run: bool,
}

/// Reconcile every mapped category for one game. Returns `(category, outcome)`
/// pairs in mapping order.
pub fn reconcile_game(ctx: &BackportContext<'_>, game: &GameFile) -> Vec<(String, BackportOutcome)> {
    ctx.profile
        .mapped_categories()
        .map(|(category, target)| {
            let dest_dir = ctx.layout.metadata_dir(ctx.system_id, &target.subdir);
            let stem = destination_stem(game, target, ctx.profile.rename_metadata_to_match_rom);
            let archive_dir = ctx.archive.category_dir(category, ctx.platform_name);
            let outcome = reconcile(
                &dest_dir,
                &stem,
                &archive_dir,
                ctx.subdirectories,
                &game.name,
                ctx.dry_run,
            );
            (category.to_string(), outcome)
        })
        .collect()
}

/// Reconcile one category for one game.
///
/// `dest_stem` is the file stem export would have used at the destination;
/// the archive copy is named `<game_name><ext>` in `archive_dir`. The archive
/// already has the file when any directory export searches (the base plus the
/// selected variant subdirectories) holds one with that stem.
pub fn reconcile(
    dest_dir: &Path,
    dest_stem: &str,
    archive_dir: &Path,
    subdirectories: Option<&SubdirectorySelection>,
    game_name: &str,
    dry_run: bool,
) -> BackportOutcome {
    let Some(dest_file) = find_by_stem(dest_dir, dest_stem) else {
        return BackportOutcome::SkippedDestinationMissing;
    };

    let existing = search_space(archive_dir, subdirectories)
        .into_iter()
        .find_map(|(dir, _)| find_by_stem(&dir, game_name));
    if let Some(existing) = existing {
        return BackportOutcome::SkippedArchiveHasIt { path: existing };
    }

    // A link placed by export already points into the archive
    if let Ok(target) = fs::read_link(&dest_file) {
        let resolved = dest_file.parent().map(|p| p.join(&target)).unwrap_or(target);
        if resolved.is_file() {
            return BackportOutcome::SkippedArchiveHasIt { path: resolved };
        }
    }

    let archive_file = archive_dir.join(format!("{game_name}{}", dotted_extension(&dest_file)));
    if dry_run {
        log::info!(
            "DRY-RUN: Would backport {} -> {}",
            dest_file.display(),
            archive_file.display()
        );
        return BackportOutcome::Simulated {
            from: dest_file,
            to: archive_file,
        };
    }

    match copy_new(&dest_file, &archive_file) {
        Ok(()) => {
            log::info!(
                "Backported {} -> {}",
                dest_file.display(),
                archive_file.display()
            );
            BackportOutcome::Copied {
                from: dest_file,
                to: archive_file,
            }
        }
        Err(e) => BackportOutcome::Failed {
            from: dest_file,
            to: archive_file,
            reason: e.to_string(),
        },
    }
}

/// First file (sorted) in `dir` whose stem is exactly `stem`.
fn find_by_stem(dir: &Path, stem: &str) -> Option<PathBuf> {
    let mut names = list_dir_names(dir, EntryFilter::Files).ok()?;
    names.sort();
    names
        .into_iter()
        .map(|name| dir.join(name))
        .find(|path| file_stem_str(path) == Some(stem))
}

/// Copy `from` to a path that must not exist yet.
fn copy_new(from: &Path, to: &Path) -> Result<(), PlacementError> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|source| PlacementError::CreateParent {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    // Re-check right before writing; the archive side is never replaced
    if fs::symlink_metadata(to).is_ok() {
        return Err(PlacementError::from_write(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "archive file appeared during backport",
        )));
    }
    fs::copy(from, to).map_err(PlacementError::from_write)?;
    preserve_mtime(from, to);
    Ok(())
}

#[cfg(test)]
#[path = "tests/backport_tests.rs"]
mod tests;
