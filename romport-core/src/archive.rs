//! Read-only view of the source archive.
//!
//! Layout:
//! ```text
//! <root>/
//!   Games/<Platform>/<file>
//!   Metadata/<CategoryRoot>/[<Subtype>/]<Platform>/[<Variant>/]<Game>.<ext>
//! ```
//! Entities are discovered by listing directories; nothing here creates them.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ExportError;

pub const GAMES_DIR: &str = "Games";
pub const METADATA_DIR: &str = "Metadata";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ArchiveEntityKind {
    Game,
    MetadataCategory,
}

/// A game or metadata category as named in the archive tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ArchiveEntity {
    pub platform_name: String,
    /// Game stem or category path (e.g. `Images/Box - Front`)
    pub name: String,
    pub kind: ArchiveEntityKind,
}

impl ArchiveEntity {
    pub fn category(platform_name: &str, category: &str) -> Self {
        Self {
            platform_name: platform_name.to_string(),
            name: category.to_string(),
            kind: ArchiveEntityKind::MetadataCategory,
        }
    }
}

/// A game file under `Games/<Platform>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameFile {
    /// File name without extension, used to match metadata
    pub name: String,
    pub file_name: String,
    pub path: PathBuf,
    pub size: u64,
    /// Extension including the dot, empty when there is none
    pub extension: String,
}

impl GameFile {
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.clone());
        Ok(Self {
            name,
            file_name,
            path: path.to_path_buf(),
            size: metadata.len(),
            extension: crate::util::dotted_extension(path),
        })
    }

    pub fn entity(&self, platform_name: &str) -> ArchiveEntity {
        ArchiveEntity {
            platform_name: platform_name.to_string(),
            name: self.name.clone(),
            kind: ArchiveEntityKind::Game,
        }
    }
}

/// An opened, structurally valid archive.
#[derive(Debug, Clone)]
pub struct Archive {
    root: PathBuf,
    games_dir: PathBuf,
    metadata_dir: Option<PathBuf>,
}

impl Archive {
    /// Open an archive root. `Games/` is required; `Metadata/` is optional.
    pub fn open(root: &Path) -> Result<Self, ExportError> {
        if !root.exists() {
            return Err(ExportError::structure(format!(
                "Source path does not exist: {}",
                root.display()
            )));
        }
        if !root.is_dir() {
            return Err(ExportError::structure(format!(
                "Source path is not a directory: {}",
                root.display()
            )));
        }

        let games_dir = root.join(GAMES_DIR);
        if !games_dir.is_dir() {
            return Err(ExportError::structure(format!(
                "'{GAMES_DIR}' directory not found at {} (expected {}/{GAMES_DIR}/[Platform]/[games])",
                games_dir.display(),
                root.display()
            )));
        }

        let metadata_dir = root.join(METADATA_DIR);
        let metadata_dir = if metadata_dir.is_dir() {
            Some(metadata_dir)
        } else {
            log::warn!(
                "Metadata directory not found at {}; metadata export and backport will be skipped",
                metadata_dir.display()
            );
            None
        };

        Ok(Self {
            root: root.to_path_buf(),
            games_dir,
            metadata_dir,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn has_metadata(&self) -> bool {
        self.metadata_dir.is_some()
    }

    /// Where metadata lives, whether or not it exists yet.
    pub fn metadata_root(&self) -> PathBuf {
        self.metadata_dir
            .clone()
            .unwrap_or_else(|| self.root.join(METADATA_DIR))
    }

    /// Sorted platform names (directories under `Games/`).
    pub fn platforms(&self) -> std::io::Result<Vec<String>> {
        let mut platforms = list_dir_names(&self.games_dir, EntryFilter::Dirs)?;
        platforms.sort();
        Ok(platforms)
    }

    /// Game files for a platform, sorted case-insensitively by name.
    pub fn games(&self, platform: &str) -> std::io::Result<Vec<GameFile>> {
        let dir = self.games_dir.join(platform);
        let mut games = Vec::new();
        for name in list_dir_names(&dir, EntryFilter::Files)? {
            match GameFile::from_path(&dir.join(&name)) {
                Ok(game) => games.push(game),
                Err(e) => log::warn!("Cannot read {}: {}", dir.join(&name).display(), e),
            }
        }
        games.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.file_name.cmp(&b.file_name))
        });
        Ok(games)
    }

    /// Directory holding one category's files for one platform:
    /// `Metadata/<Root>/[<Subtype>/]<Platform>`.
    pub fn category_dir(&self, category: &str, platform: &str) -> PathBuf {
        let mut dir = self.metadata_root();
        for part in category.split('/').filter(|p| !p.is_empty()) {
            dir.push(part);
        }
        dir.join(platform)
    }

    /// Metadata categories present for a platform.
    ///
    /// A directory directly under a category root is the platform directory
    /// when its name is a known archive platform, otherwise it is a subtype.
    pub fn metadata_categories(
        &self,
        platform: &str,
        known_platforms: &[String],
    ) -> std::io::Result<Vec<ArchiveEntity>> {
        let Some(metadata_dir) = &self.metadata_dir else {
            return Ok(Vec::new());
        };

        let mut categories = Vec::new();
        let mut roots = list_dir_names(metadata_dir, EntryFilter::Dirs)?;
        roots.sort();
        for root in roots {
            let root_dir = metadata_dir.join(&root);
            if root_dir.join(platform).is_dir() {
                categories.push(ArchiveEntity::category(platform, &root));
            }
            let mut subtypes = list_dir_names(&root_dir, EntryFilter::Dirs)?;
            subtypes.sort();
            for subtype in subtypes {
                if known_platforms.iter().any(|p| *p == subtype) {
                    continue;
                }
                if root_dir.join(&subtype).join(platform).is_dir() {
                    categories.push(ArchiveEntity::category(
                        platform,
                        &format!("{root}/{subtype}"),
                    ));
                }
            }
        }
        Ok(categories)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryFilter {
    Files,
    Dirs,
}

/// Names of the non-hidden files or directories directly under `dir`.
/// A missing directory yields an empty list.
pub fn list_dir_names(dir: &Path, filter: EntryFilter) -> std::io::Result<Vec<String>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut names = Vec::new();
    for entry in entries.flatten() {
        let name = match entry.file_name().to_str() {
            Some(name) => name.to_string(),
            None => continue,
        };
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        let keep = match filter {
            EntryFilter::Files => path.is_file(),
            EntryFilter::Dirs => path.is_dir(),
        };
        if keep {
            names.push(name);
        }
    }
    Ok(names)
}

#[cfg(test)]
#[path = "tests/archive_tests.rs"]
mod tests;
