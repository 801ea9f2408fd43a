//! Destination profiles loaded from the formats document (`fe_formats.json`).
//!
//! The document is parsed once at startup. Each entry under `formats` is
//! checked for required fields, deserialized into a raw serde struct, and
//! then validated into a [`DestinationProfile`]. Nothing downstream
//! re-validates profile fields.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::CustomEntityKind;
use crate::util::expand_tilde;

/// Keys every format entry must carry.
pub const REQUIRED_FIELDS: &[&str] = &["name", "default_destination", "description"];

/// Formats-document key that holds prose rather than a profile.
const DOCUMENTATION_KEY: &str = "_documentation";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("JSON parse error in {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("Invalid formats document: {0}")]
    InvalidDocument(String),

    #[error(
        "Format '{format}' is missing required fields: {} (required: {})",
        .fields.join(", "),
        REQUIRED_FIELDS.join(", ")
    )]
    MissingFields { format: String, fields: Vec<String> },

    #[error("Format '{format}' has an empty 'default_destination' field")]
    EmptyDestination { format: String },

    #[error(
        "Format '{format}': metadata mapping '{category}' -> '{value}' must have the form '<subdir>/<prefix>'"
    )]
    InvalidMetadataMapping {
        format: String,
        category: String,
        value: String,
    },

    #[error("Format '{format}': invalid conversion for field '{field}': {reason}")]
    InvalidConversion {
        format: String,
        field: String,
        reason: String,
    },

    #[error("Format '{format}': {source}")]
    InvalidField {
        format: String,
        source: serde_json::Error,
    },

    #[error("Unsupported destination format: {requested}. Supported formats: {}", .available.join(", "))]
    NotFound {
        requested: String,
        available: Vec<String>,
    },
}

impl ProfileError {
    pub fn invalid_document(msg: impl Into<String>) -> Self {
        Self::InvalidDocument(msg.into())
    }
}

/// Where a mapped metadata category lands in a destination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetadataTarget {
    /// Directory under the platform's metadata root (e.g. `images`)
    pub subdir: String,
    /// Type tag appended to the game name when not renaming to the ROM stem
    pub prefix: String,
}

impl MetadataTarget {
    /// Split a mapping value of the form `subdir/prefix`.
    ///
    /// Returns `None` unless the value yields exactly two non-empty tokens.
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.split('/');
        let subdir = parts.next()?.trim();
        let prefix = parts.next()?.trim();
        if parts.next().is_some() || subdir.is_empty() || prefix.is_empty() {
            return None;
        }
        Some(Self {
            subdir: subdir.to_string(),
            prefix: prefix.to_string(),
        })
    }
}

/// Output document written for the generated catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogFormat {
    /// ES-DE style `gamelist.xml`
    Gamelist,
    /// RetroArch style `.lpl` JSON playlist
    Playlist,
}

/// A typed conversion applied to one catalog field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConversionRule {
    /// Compose a date from `{year}`, `{month}` and `{day}` placeholders.
    Date {
        format: String,
        #[serde(default = "default_month_day")]
        default_month: u32,
        #[serde(default = "default_month_day")]
        default_day: u32,
    },
    /// Rescale a number linearly: `value * target_scale / source_scale`.
    Normalize {
        source_scale: f64,
        target_scale: f64,
        #[serde(default = "default_decimal_places")]
        decimal_places: u32,
    },
}

fn default_month_day() -> u32 {
    1
}

/// Most decimal places a `normalize` rule may ask for; beyond this `f64`
/// carries no more precision.
pub const MAX_DECIMAL_PLACES: u32 = 15;

fn default_decimal_places() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

fn default_name_field() -> String {
    "Name".to_string()
}

impl ConversionRule {
    fn validate(&self) -> Result<(), String> {
        match self {
            ConversionRule::Date {
                format,
                default_month,
                default_day,
            } => {
                if !format.contains("{year}") {
                    return Err("date format must contain '{year}'".to_string());
                }
                if !(1..=12).contains(default_month) {
                    return Err(format!("default_month {default_month} is out of range"));
                }
                if !(1..=31).contains(default_day) {
                    return Err(format!("default_day {default_day} is out of range"));
                }
                Ok(())
            }
            ConversionRule::Normalize {
                source_scale,
                target_scale,
                decimal_places,
            } => {
                if *source_scale == 0.0 || !source_scale.is_finite() {
                    return Err("source_scale must be a non-zero number".to_string());
                }
                if !target_scale.is_finite() {
                    return Err("target_scale must be a finite number".to_string());
                }
                if *decimal_places > MAX_DECIMAL_PLACES {
                    return Err(format!(
                        "decimal_places {decimal_places} exceeds {MAX_DECIMAL_PLACES}"
                    ));
                }
                Ok(())
            }
        }
    }
}

/// One format entry exactly as it appears in the document.
#[derive(Debug, Deserialize)]
struct RawProfile {
    name: String,
    description: String,
    default_destination: String,
    #[serde(default)]
    roms_path: String,
    #[serde(default)]
    metadata_path: Option<String>,
    #[serde(default)]
    metadata_subdir: bool,
    #[serde(default)]
    rename_metadata_to_match_rom: bool,
    #[serde(default = "default_true")]
    platforms_have_subdirectories: bool,
    #[serde(default)]
    custom_systems_path: Option<String>,
    #[serde(default)]
    custom_entity_kind: CustomEntityKind,
    #[serde(default)]
    catalog_format: Option<CatalogFormat>,
    #[serde(default)]
    catalog_path: Option<String>,
    #[serde(default = "default_name_field")]
    catalog_name_field: String,
    #[serde(default)]
    platform_mappings: BTreeMap<String, String>,
    #[serde(default)]
    metadata_mappings: BTreeMap<String, Option<String>>,
    #[serde(default)]
    catalog_field_mappings: BTreeMap<String, String>,
    #[serde(default)]
    catalog_field_conversions: BTreeMap<String, ConversionRule>,
}

/// A validated destination layout.
///
/// Read-only for the whole run. Mappings resolved interactively live in the
/// engine's session state, not here.
#[derive(Debug, Clone)]
pub struct DestinationProfile {
    /// Format identifier (the key in the formats document)
    pub id: String,
    /// Display name
    pub name: String,
    pub description: String,
    /// Root used when the user gives no destination
    pub default_destination: PathBuf,
    /// ROM directory relative to the destination root (may be empty)
    pub roms_path: PathBuf,
    /// Metadata root override, relative to the destination root unless absolute
    pub metadata_path: Option<PathBuf>,
    /// Metadata lives inside each platform's ROM directory
    pub metadata_colocated_with_roms: bool,
    /// Metadata files take the ROM's stem instead of `<game>-<prefix>`
    pub rename_metadata_to_match_rom: bool,
    /// Each system gets its own directory under the ROM root
    pub platforms_have_subdirectories: bool,
    /// File holding custom system/playlist definitions
    pub custom_entities_path: Option<PathBuf>,
    pub custom_entity_kind: CustomEntityKind,
    pub catalog_format: Option<CatalogFormat>,
    /// Catalog root relative to the destination root; defaults to the ROM root
    pub catalog_path: Option<PathBuf>,
    /// Catalog input column used as the join key
    pub catalog_name_field: String,
    /// Archive platform name -> destination system identifier
    pub platform_mappings: BTreeMap<String, String>,
    /// Archive category path -> target, `None` for explicitly unsupported
    pub metadata_mappings: BTreeMap<String, Option<MetadataTarget>>,
    pub catalog_field_mappings: BTreeMap<String, String>,
    pub catalog_field_conversions: BTreeMap<String, ConversionRule>,
}

impl DestinationProfile {
    /// Validate one raw format entry.
    pub fn from_value(id: &str, value: serde_json::Value) -> Result<Self, ProfileError> {
        let object = value.as_object().ok_or_else(|| {
            ProfileError::invalid_document(format!("format '{id}' is not an object"))
        })?;

        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|field| !object.contains_key(**field))
            .map(|field| field.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ProfileError::MissingFields {
                format: id.to_string(),
                fields: missing,
            });
        }

        let raw: RawProfile =
            serde_json::from_value(value).map_err(|source| ProfileError::InvalidField {
                format: id.to_string(),
                source,
            })?;

        if raw.default_destination.trim().is_empty() {
            return Err(ProfileError::EmptyDestination {
                format: id.to_string(),
            });
        }

        let mut metadata_mappings = BTreeMap::new();
        for (category, value) in raw.metadata_mappings {
            let target = match value {
                None => None,
                Some(v) => Some(MetadataTarget::parse(&v).ok_or_else(|| {
                    ProfileError::InvalidMetadataMapping {
                        format: id.to_string(),
                        category: category.clone(),
                        value: v.clone(),
                    }
                })?),
            };
            metadata_mappings.insert(category, target);
        }

        for (field, rule) in &raw.catalog_field_conversions {
            rule.validate()
                .map_err(|reason| ProfileError::InvalidConversion {
                    format: id.to_string(),
                    field: field.clone(),
                    reason,
                })?;
        }

        Ok(Self {
            id: id.to_string(),
            name: raw.name,
            description: raw.description,
            default_destination: expand_tilde(&raw.default_destination),
            roms_path: PathBuf::from(raw.roms_path),
            metadata_path: raw.metadata_path.as_deref().map(expand_tilde),
            metadata_colocated_with_roms: raw.metadata_subdir,
            rename_metadata_to_match_rom: raw.rename_metadata_to_match_rom,
            platforms_have_subdirectories: raw.platforms_have_subdirectories,
            custom_entities_path: raw.custom_systems_path.as_deref().map(expand_tilde),
            custom_entity_kind: raw.custom_entity_kind,
            catalog_format: raw.catalog_format,
            catalog_path: raw.catalog_path.as_deref().map(expand_tilde),
            catalog_name_field: raw.catalog_name_field,
            platform_mappings: raw.platform_mappings,
            metadata_mappings,
            catalog_field_mappings: raw.catalog_field_mappings,
            catalog_field_conversions: raw.catalog_field_conversions,
        })
    }

    /// Non-null metadata mappings, in key order.
    pub fn mapped_categories(&self) -> impl Iterator<Item = (&str, &MetadataTarget)> {
        self.metadata_mappings
            .iter()
            .filter_map(|(category, target)| target.as_ref().map(|t| (category.as_str(), t)))
    }
}

/// All profiles from one formats document, keyed by identifier.
#[derive(Debug, Clone)]
pub struct Formats {
    source: Option<PathBuf>,
    profiles: BTreeMap<String, DestinationProfile>,
}

impl Formats {
    /// Load and validate the formats document at `path`.
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut formats = Self::parse(&contents).map_err(|e| match e {
            ProfileError::Parse { source, .. } => ProfileError::Parse {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })?;
        formats.source = Some(path.to_path_buf());
        log::debug!(
            "Loaded {} format(s) from {}",
            formats.profiles.len(),
            path.display()
        );
        Ok(formats)
    }

    /// Parse and validate a formats document from a string.
    pub fn parse(contents: &str) -> Result<Self, ProfileError> {
        let doc: serde_json::Value =
            serde_json::from_str(contents).map_err(|source| ProfileError::Parse {
                path: "<string>".to_string(),
                source,
            })?;
        let entries = doc
            .get("formats")
            .and_then(|f| f.as_object())
            .ok_or_else(|| ProfileError::invalid_document("missing 'formats' key"))?;

        let mut profiles = BTreeMap::new();
        for (id, value) in entries {
            if id == DOCUMENTATION_KEY {
                continue;
            }
            let profile = DestinationProfile::from_value(id, value.clone())?;
            log::debug!("Validated format configuration: {id}");
            profiles.insert(id.to_lowercase(), profile);
        }

        Ok(Self {
            source: None,
            profiles,
        })
    }

    /// Path the document was loaded from, if it came from disk.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Look up a profile by identifier (case-insensitive).
    pub fn get(&self, id: &str) -> Result<&DestinationProfile, ProfileError> {
        self.profiles
            .get(&id.to_lowercase())
            .ok_or_else(|| ProfileError::NotFound {
                requested: id.to_string(),
                available: self.ids().map(str::to_string).collect(),
            })
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DestinationProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/profile_tests.rs"]
mod tests;
