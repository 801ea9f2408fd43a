//! User settings (`settings.toml`) and formats file discovery.
//!
//! The settings file is always `<config dir>/romport/settings.toml`:
//!
//! ```toml
//! [archive]
//! root = "/mnt/archive"
//!
//! [export]
//! format = "es-de"
//! formats_file = "/home/me/fe_formats.json"
//! ```
//!
//! Updates edit the document as a `toml::Value` so unknown keys survive.

use std::io;
use std::path::{Path, PathBuf};

/// Name of the formats document looked up next to the settings file and in
/// the working directory.
pub const FORMATS_FILE_NAME: &str = "fe_formats.json";

/// Format used when neither the command line nor the settings choose one.
pub const DEFAULT_FORMAT: &str = "es-de";

fn config_root() -> PathBuf {
    let config = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    config.join("romport")
}

/// Canonical path to the settings file: `<config dir>/romport/settings.toml`.
pub fn settings_path() -> PathBuf {
    config_root().join("settings.toml")
}

/// `<config dir>/romport/fe_formats.json`
pub fn default_formats_path() -> PathBuf {
    config_root().join(FORMATS_FILE_NAME)
}

/// Values read from `settings.toml`. Missing keys are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub archive_root: Option<PathBuf>,
    pub export_format: Option<String>,
    pub formats_file: Option<PathBuf>,
}

impl Settings {
    fn from_doc(doc: &toml::Value) -> Self {
        let string = |table: &str, key: &str| {
            doc.get(table)
                .and_then(|t| t.get(key))
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            archive_root: string("archive", "root").map(PathBuf::from),
            export_format: string("export", "format"),
            formats_file: string("export", "formats_file").map(PathBuf::from),
        }
    }
}

/// Read the settings file. A missing or unreadable file yields defaults.
pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

pub fn load_settings_from(path: &Path) -> Settings {
    match read_doc(path) {
        Some(doc) => Settings::from_doc(&doc),
        None => Settings::default(),
    }
}

fn read_doc(path: &Path) -> Option<toml::Value> {
    let contents = std::fs::read_to_string(path).ok()?;
    match contents.parse() {
        Ok(doc) => Some(doc),
        Err(e) => {
            log::warn!("Ignoring unreadable settings file {}: {e}", path.display());
            None
        }
    }
}

/// Set (or with `None`, clear) `[table] key` in the settings file.
pub fn set_setting(table: &str, key: &str, value: Option<&str>) -> io::Result<()> {
    set_setting_at(&settings_path(), table, key, value)
}

/// [`set_setting`] on an explicit file.
pub fn set_setting_at(path: &Path, table: &str, key: &str, value: Option<&str>) -> io::Result<()> {
    let mut doc = read_doc(path).unwrap_or_else(|| toml::Value::Table(Default::default()));

    let root = doc
        .as_table_mut()
        .ok_or_else(|| io::Error::other("settings.toml root is not a table"))?;
    let section = root
        .entry(table)
        .or_insert_with(|| toml::Value::Table(Default::default()));
    let section = section
        .as_table_mut()
        .ok_or_else(|| io::Error::other(format!("[{table}] is not a table")))?;

    match value {
        Some(v) => {
            section.insert(key.to_string(), toml::Value::String(v.to_string()));
        }
        None => {
            section.remove(key);
        }
    }

    // Write atomically
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let serialized = toml::to_string_pretty(&doc).map_err(io::Error::other)?;
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, &serialized)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Remember the archive root.
pub fn save_archive_root(root: Option<&Path>) -> io::Result<()> {
    let value = root.map(|p| p.to_string_lossy().into_owned());
    set_setting("archive", "root", value.as_deref())
}

/// Remember the default export format.
pub fn save_export_format(format: Option<&str>) -> io::Result<()> {
    set_setting("export", "format", format)
}

/// Load the full settings file as a pretty-printed TOML string for display.
pub fn load_settings_string() -> Option<String> {
    let doc = read_doc(&settings_path())?;
    toml::to_string_pretty(&doc).ok()
}

/// Archive root: CLI value, then `[archive] root`, then the working directory.
pub fn resolve_archive_root(cli_override: Option<PathBuf>) -> PathBuf {
    if let Some(p) = cli_override {
        return p;
    }
    if let Some(p) = load_settings().archive_root {
        return p;
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Export format: CLI value, then `[export] format`, then [`DEFAULT_FORMAT`].
pub fn resolve_format(cli_override: Option<String>) -> String {
    cli_override
        .or_else(|| load_settings().export_format)
        .unwrap_or_else(|| DEFAULT_FORMAT.to_string())
}

/// Formats document: CLI value, then `[export] formats_file`, then the
/// config directory copy, then `./fe_formats.json`.
///
/// The CLI and settings values are returned even when they do not exist so
/// the caller reports the path the user asked for.
pub fn resolve_formats_path(cli_override: Option<PathBuf>) -> PathBuf {
    resolve_formats_path_with(cli_override, &load_settings(), &default_formats_path())
}

fn resolve_formats_path_with(
    cli_override: Option<PathBuf>,
    settings: &Settings,
    config_default: &Path,
) -> PathBuf {
    if let Some(p) = cli_override {
        return p;
    }
    if let Some(p) = &settings.formats_file {
        return p.clone();
    }
    if config_default.is_file() {
        return config_default.to_path_buf();
    }
    PathBuf::from(FORMATS_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_load_preserves_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("romport").join("settings.toml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[ui]\ntheme = \"dark\"\n").unwrap();

        set_setting_at(&path, "archive", "root", Some("/mnt/archive")).unwrap();
        set_setting_at(&path, "export", "format", Some("retroarch")).unwrap();

        let settings = load_settings_from(&path);
        assert_eq!(settings.archive_root, Some(PathBuf::from("/mnt/archive")));
        assert_eq!(settings.export_format.as_deref(), Some("retroarch"));
        assert_eq!(settings.formats_file, None);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("theme = \"dark\""));
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_clear_setting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        set_setting_at(&path, "export", "format", Some("es-de")).unwrap();
        set_setting_at(&path, "export", "format", None).unwrap();
        assert_eq!(load_settings_from(&path).export_format, None);
    }

    #[test]
    fn test_missing_or_broken_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_settings_from(&dir.path().join("nope.toml")), Settings::default());

        let broken = dir.path().join("broken.toml");
        std::fs::write(&broken, "[archive\nroot=").unwrap();
        assert_eq!(load_settings_from(&broken), Settings::default());
    }

    #[test]
    fn test_formats_path_priority() {
        let dir = tempfile::tempdir().unwrap();
        let config_default = dir.path().join("fe_formats.json");
        let settings = Settings {
            formats_file: Some(PathBuf::from("/from/settings.json")),
            ..Settings::default()
        };

        assert_eq!(
            resolve_formats_path_with(Some(PathBuf::from("/cli.json")), &settings, &config_default),
            PathBuf::from("/cli.json")
        );
        assert_eq!(
            resolve_formats_path_with(None, &settings, &config_default),
            PathBuf::from("/from/settings.json")
        );
        assert_eq!(
            resolve_formats_path_with(None, &Settings::default(), &config_default),
            PathBuf::from(FORMATS_FILE_NAME)
        );

        std::fs::write(&config_default, "{}").unwrap();
        assert_eq!(
            resolve_formats_path_with(None, &Settings::default(), &config_default),
            config_default
        );
    }
}
