//! Candidate Resolver: pick at most one archive file per (game, category).
//!
//! The search space for a category is its base directory
//! (`Metadata/<Root>/[<Subtype>/]<Platform>`) plus every selected variant
//! subdirectory present under it. The variant selection is made once for
//! the whole archive and held by the [`SessionState`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use romport_core::archive::{EntryFilter, list_dir_names};
use romport_core::util::{dotted_extension, file_stem_str, format_bytes_approx};
use romport_core::{Answer, Archive, GameFile, Interaction, MetadataTarget, Question};

use crate::session::{SessionState, SubdirectorySelection};

/// One archive file that could satisfy a category for a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub size: u64,
    /// Variant subdirectory the file came from, `None` for the base directory
    pub variant: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateResolution {
    /// No file matches; the category contributes nothing
    NoMatch,
    Selected(Candidate),
    /// The user skipped the choice
    Skipped,
    /// Several files matched and nobody could choose
    Ambiguous(usize),
}

/// Union of variant subdirectory names across every platform and category.
pub fn scan_subdirectories(archive: &Archive, platforms: &[String]) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for platform in platforms {
        let categories = match archive.metadata_categories(platform, platforms) {
            Ok(categories) => categories,
            Err(e) => {
                log::warn!("Cannot list metadata for '{platform}': {e}");
                continue;
            }
        };
        for category in categories {
            let dir = archive.category_dir(&category.name, platform);
            match list_dir_names(&dir, EntryFilter::Dirs) {
                Ok(subdirs) => names.extend(subdirs),
                Err(e) => log::warn!("Cannot list {}: {e}", dir.display()),
            }
        }
    }
    names
}

/// Ask once which variant subdirectories to search.
///
/// With nothing to choose from, or nobody to ask, only base directories are
/// searched.
pub fn choose_subdirectories(
    available: &BTreeSet<String>,
    prompter: &mut dyn Interaction,
) -> SubdirectorySelection {
    if available.is_empty() {
        return SubdirectorySelection::none();
    }
    if !prompter.is_interactive() {
        log::info!(
            "Found {} variant subdirectories; searching base directories only",
            available.len()
        );
        return SubdirectorySelection::none();
    }

    let listing = available.iter().cloned().collect::<Vec<_>>().join(", ");
    let prompt = format!(
        "Variant subdirectories found: {listing}\nInclude which? (all / none / comma-separated names)"
    );
    match prompter.ask(&Question::text(&prompt, "none")) {
        Some(Answer::Text(answer)) => SubdirectorySelection::parse(&answer, available),
        Some(Answer::All) => SubdirectorySelection::all(available),
        _ => SubdirectorySelection::none(),
    }
}

/// Directories searched for one category of one platform, base first.
pub fn search_space(base: &Path, selection: Option<&SubdirectorySelection>) -> Vec<(PathBuf, Option<String>)> {
    let mut dirs = vec![(base.to_path_buf(), None)];
    let Some(selection) = selection else {
        return dirs;
    };
    for name in &selection.selected {
        if !selection.includes(name) {
            continue;
        }
        let dir = base.join(name);
        if dir.is_dir() {
            dirs.push((dir, Some(name.clone())));
        }
    }
    dirs
}

/// Files in the search space whose stem equals `game_name` exactly.
pub fn find_candidates(search_space: &[(PathBuf, Option<String>)], game_name: &str) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for (dir, variant) in search_space {
        let mut names = match list_dir_names(dir, EntryFilter::Files) {
            Ok(names) => names,
            Err(e) => {
                log::warn!("Cannot list {}: {e}", dir.display());
                continue;
            }
        };
        names.sort();
        for name in names {
            let path = dir.join(&name);
            if file_stem_str(&path) != Some(game_name) {
                continue;
            }
            let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            candidates.push(Candidate {
                path,
                size,
                variant: variant.clone(),
            });
        }
    }
    candidates
}

/// Reduce the candidates for one (game, category) to at most one file.
pub fn resolve_candidates(
    game_name: &str,
    category: &str,
    base: &Path,
    session: &mut SessionState,
    prompter: &mut dyn Interaction,
) -> CandidateResolution {
    let space = search_space(base, session.subdirectories());
    let mut candidates = find_candidates(&space, game_name);

    match candidates.len() {
        0 => return CandidateResolution::NoMatch,
        1 => return CandidateResolution::Selected(candidates.remove(0)),
        _ => {}
    }

    if session.always_first() {
        return CandidateResolution::Selected(candidates.remove(0));
    }
    if !prompter.is_interactive() {
        log::warn!(
            "{} candidates for '{}' ({}); skipping",
            candidates.len(),
            game_name,
            category
        );
        return CandidateResolution::Ambiguous(candidates.len());
    }

    let options: Vec<String> = candidates
        .iter()
        .map(|c| {
            let location = c.variant.as_deref().unwrap_or("base");
            let file = c.path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            format!("{file} [{location}] ({})", format_bytes_approx(c.size))
        })
        .collect();
    let prompt = format!("Multiple {category} files for '{game_name}'");
    match prompter.ask(&Question::select_or_skip(&prompt, &options)) {
        Some(Answer::Index(i)) if i < candidates.len() => {
            CandidateResolution::Selected(candidates.swap_remove(i))
        }
        Some(Answer::All) => {
            session.enable_always_first();
            CandidateResolution::Selected(candidates.remove(0))
        }
        Some(_) => CandidateResolution::Skipped,
        None => CandidateResolution::Ambiguous(candidates.len()),
    }
}

/// Destination file stem for a metadata file.
///
/// With `rename_to_rom` the ROM's own stem is used, otherwise
/// `<game>-<prefix>`.
pub fn destination_stem(game: &GameFile, target: &MetadataTarget, rename_to_rom: bool) -> String {
    if rename_to_rom {
        game.name.clone()
    } else {
        format!("{}-{}", game.name, target.prefix)
    }
}

/// Destination file name: [`destination_stem`] plus the source extension.
pub fn destination_file_name(
    game: &GameFile,
    target: &MetadataTarget,
    source: &Path,
    rename_to_rom: bool,
) -> String {
    format!(
        "{}{}",
        destination_stem(game, target, rename_to_rom),
        dotted_extension(source)
    )
}

#[cfg(test)]
#[path = "tests/candidates_tests.rs"]
mod tests;
