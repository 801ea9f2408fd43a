//! Custom entities: destination-side records created for platforms that have
//! no configured mapping.
//!
//! A destination either knows systems (ES-DE style, one XML `<system>` per
//! platform) or playlists (RetroArch style). The engine collects the same
//! fields for both and hands them to a [`CustomEntityStore`] implemented by
//! the matching serializer in `romport-frontend`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::normalize_identifier;

/// Extension allow-list suggested when the user gives none.
pub const DEFAULT_EXTENSIONS: &str = ".zip,.7z";

/// Core name that asks a playlist-style destination to pick a core itself.
pub const DETECT_CORE: &str = "DETECT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CustomEntityKind {
    #[default]
    #[serde(rename = "system")]
    SystemDefinition,
    #[serde(rename = "playlist")]
    PlaylistDefinition,
}

impl CustomEntityKind {
    pub fn label(self) -> &'static str {
        match self {
            CustomEntityKind::SystemDefinition => "custom system",
            CustomEntityKind::PlaylistDefinition => "custom playlist",
        }
    }

    /// Prompt text for the execution field.
    pub fn command_prompt(self) -> &'static str {
        match self {
            CustomEntityKind::SystemDefinition => {
                "RetroArch core name (e.g., mame, nestopia, snes9x), or a full command containing %ROM%"
            }
            CustomEntityKind::PlaylistDefinition => "Default core name (DETECT to let the frontend choose)",
        }
    }

    /// Default answer offered for the execution field.
    pub fn default_command_answer(self) -> &'static str {
        match self {
            CustomEntityKind::SystemDefinition => "",
            CustomEntityKind::PlaylistDefinition => DETECT_CORE,
        }
    }

    /// Turn the user's execution answer into the stored command/core value.
    ///
    /// For system definitions a bare core name expands to a RetroArch launch
    /// command and anything containing `%ROM%` is kept verbatim.
    pub fn command_from_answer(self, answer: &str) -> String {
        let answer = answer.trim();
        match self {
            CustomEntityKind::SystemDefinition => {
                if answer.contains("%ROM%") {
                    answer.to_string()
                } else if answer.is_empty() {
                    "%EMULATOR_RETROARCH% %ROM%".to_string()
                } else {
                    format!("%EMULATOR_RETROARCH% -L %CORE_RETROARCH%/{answer}_libretro.so %ROM%")
                }
            }
            CustomEntityKind::PlaylistDefinition => {
                if answer.is_empty() {
                    DETECT_CORE.to_string()
                } else {
                    answer.to_string()
                }
            }
        }
    }
}

/// Fields collected for a new custom entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomEntity {
    /// Short identifier, also used as the destination system directory
    pub identifier: String,
    pub display_name: String,
    /// Path of the entity's ROM directory as the frontend sees it
    pub path: String,
    /// Comma-separated extension allow-list
    pub extensions: String,
    /// Launch command (systems) or core name (playlists)
    pub command: String,
    /// Theme or category reference
    pub theme: String,
    /// Archive platform the entity was created for
    pub archive_name: String,
}

impl CustomEntity {
    /// Build an entity from collected answers, filling the derived fields.
    pub fn new(
        archive_name: &str,
        identifier: &str,
        display_name: &str,
        extensions: &str,
        command: String,
    ) -> Self {
        Self {
            identifier: identifier.to_string(),
            display_name: display_name.to_string(),
            path: format!("./roms/{identifier}"),
            extensions: extensions.to_string(),
            command,
            theme: identifier.to_string(),
            archive_name: archive_name.to_string(),
        }
    }

    /// Identifier suggested for an archive platform name.
    pub fn default_identifier(archive_name: &str) -> String {
        normalize_identifier(archive_name)
    }
}

/// Result of appending an entity to a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Written to the store
    Added,
    /// An entry with the same identifier already exists; nothing written
    AlreadyPresent(String),
    /// Dry-run: would have been written
    Simulated,
}

#[derive(Debug, Error)]
pub enum CustomEntityError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Cannot parse {path}: {reason}")]
    Parse { path: String, reason: String },
}

impl CustomEntityError {
    pub fn parse(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::Parse {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Append-only store of custom entities for one destination.
pub trait CustomEntityStore {
    fn kind(&self) -> CustomEntityKind;

    /// Find an existing entity created for `archive_name`.
    ///
    /// Matches the archive name recorded when the entity was created, a
    /// display name equal to the archive name, or an identifier equal to the
    /// normalized archive name. Returns the identifier.
    fn find_existing(&self, archive_name: &str) -> Result<Option<String>, CustomEntityError>;

    /// Append `entity` unless an entry with the same identifier exists.
    /// Never writes when `dry_run` is set.
    fn append(
        &mut self,
        entity: &CustomEntity,
        dry_run: bool,
    ) -> Result<AppendOutcome, CustomEntityError>;
}
