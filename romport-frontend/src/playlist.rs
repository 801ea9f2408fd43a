//! RetroArch-style playlists: the custom playlist definitions file and the
//! per-system `.lpl` catalog document.

use std::path::{Path, PathBuf};

use romport_core::util::normalize_identifier;
use romport_core::{AppendOutcome, CustomEntity, CustomEntityError, CustomEntityKind, CustomEntityStore};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{CatalogEntry, CatalogWriter, FrontendError, write_atomic};

/// Placeholder RetroArch resolves on first launch.
const DETECT: &str = "DETECT";
const LPL_VERSION: &str = "1.5";

/// One entry of the playlist definitions file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistDefinition {
    pub name: String,
    pub fullname: String,
    pub path: String,
    pub extensions: String,
    pub core: String,
    pub category: String,
    /// Archive platform the definition was created for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_name: Option<String>,
}

impl From<&CustomEntity> for PlaylistDefinition {
    fn from(entity: &CustomEntity) -> Self {
        Self {
            name: entity.identifier.clone(),
            fullname: entity.display_name.clone(),
            path: entity.path.clone(),
            extensions: entity.extensions.clone(),
            core: entity.command.clone(),
            category: entity.theme.clone(),
            archive_name: Some(entity.archive_name.clone()).filter(|n| !n.is_empty()),
        }
    }
}

/// Custom playlist definitions, stored as a JSON array.
#[derive(Debug, Clone)]
pub struct PlaylistDefinitionsFile {
    path: PathBuf,
}

impl PlaylistDefinitionsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All definitions; a missing file holds none.
    pub fn definitions(&self) -> Result<Vec<PlaylistDefinition>, CustomEntityError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(CustomEntityError::Io {
                    path: self.path.display().to_string(),
                    source,
                });
            }
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&contents)
            .map_err(|e| CustomEntityError::parse(self.path.display().to_string(), e))
    }
}

impl CustomEntityStore for PlaylistDefinitionsFile {
    fn kind(&self) -> CustomEntityKind {
        CustomEntityKind::PlaylistDefinition
    }

    fn find_existing(&self, archive_name: &str) -> Result<Option<String>, CustomEntityError> {
        let normalized = normalize_identifier(archive_name);
        Ok(self
            .definitions()?
            .into_iter()
            .find(|d| {
                d.archive_name.as_deref() == Some(archive_name)
                    || d.fullname == archive_name
                    || d.name == normalized
            })
            .map(|d| d.name))
    }

    fn append(
        &mut self,
        entity: &CustomEntity,
        dry_run: bool,
    ) -> Result<AppendOutcome, CustomEntityError> {
        let mut definitions = self.definitions()?;
        if let Some(existing) = definitions.iter().find(|d| d.name == entity.identifier) {
            log::warn!(
                "Playlist '{}' already exists in {}; using existing configuration",
                existing.name,
                self.path.display()
            );
            return Ok(AppendOutcome::AlreadyPresent(existing.name.clone()));
        }

        let definition = PlaylistDefinition::from(entity);
        let preview = serde_json::to_string_pretty(&definition)
            .map_err(|e| CustomEntityError::parse(self.path.display().to_string(), e))?;
        log::info!("Custom playlist definition to be added:\n{preview}");

        if dry_run {
            log::info!(
                "DRY-RUN: Would add '{}' to {}",
                entity.display_name,
                self.path.display()
            );
            return Ok(AppendOutcome::Simulated);
        }

        definitions.push(definition);
        let mut json = serde_json::to_string_pretty(&definitions)
            .map_err(|e| CustomEntityError::parse(self.path.display().to_string(), e))?;
        json.push('\n');
        write_atomic(&self.path, &json).map_err(|source| CustomEntityError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        log::info!(
            "Added custom playlist '{}' to {}",
            entity.identifier,
            self.path.display()
        );
        Ok(AppendOutcome::Added)
    }
}

/// RetroArch `.lpl` playlist writer, one document per system.
pub struct PlaylistWriter;

impl PlaylistWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlaylistWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogWriter for PlaylistWriter {
    fn name(&self) -> &'static str {
        "RetroArch playlist"
    }

    fn catalog_path(&self, system_id: &str, dir: &Path) -> PathBuf {
        dir.join(format!("{system_id}.lpl"))
    }

    fn write_catalog(
        &self,
        system_id: &str,
        entries: &[CatalogEntry],
        dir: &Path,
        dry_run: bool,
    ) -> Result<PathBuf, FrontendError> {
        let playlist_path = self.catalog_path(system_id, dir);
        let document = render_playlist(system_id, entries);

        if dry_run {
            log::info!(
                "DRY-RUN: Would write {} playlist items to {}",
                entries.len(),
                playlist_path.display()
            );
            return Ok(playlist_path);
        }

        let mut json = serde_json::to_string_pretty(&document)?;
        json.push('\n');
        write_atomic(&playlist_path, &json)?;
        log::info!(
            "Wrote {} playlist items to {}",
            entries.len(),
            playlist_path.display()
        );
        Ok(playlist_path)
    }
}

/// Build the `.lpl` document. Catalog fields other than `path`, `label` and
/// `name` are carried on each item after the standard keys.
pub fn render_playlist(system_id: &str, entries: &[CatalogEntry]) -> Value {
    let db_name = format!("{system_id}.lpl");
    let items: Vec<Value> = entries
        .iter()
        .map(|entry| {
            let label = entry.record.get("name").map(str::to_string).unwrap_or_else(|| {
                entry
                    .rom_path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| entry.rom_file_name.clone())
            });

            let mut item = Map::new();
            item.insert("path".into(), json!(entry.rom_path.display().to_string()));
            item.insert("label".into(), json!(label));
            item.insert("core_path".into(), json!(DETECT));
            item.insert("core_name".into(), json!(DETECT));
            item.insert("crc32".into(), json!(DETECT));
            item.insert("db_name".into(), json!(db_name));
            for (field, value) in entry.record.iter() {
                if matches!(field, "path" | "label" | "name") || item.contains_key(field) {
                    continue;
                }
                item.insert(field.to_string(), json!(value));
            }
            Value::Object(item)
        })
        .collect();

    json!({
        "version": LPL_VERSION,
        "default_core_path": "",
        "default_core_name": "",
        "label_display_mode": 0,
        "right_thumbnail_mode": 0,
        "left_thumbnail_mode": 0,
        "sort_mode": 0,
        "items": items,
    })
}

#[cfg(test)]
#[path = "tests/playlist_tests.rs"]
mod tests;
