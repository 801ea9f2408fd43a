use std::path::{Path, PathBuf};

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use romport_core::Formats;
use romport_lib::settings;

use crate::error::CliError;

/// Show the settings file and what it resolves to.
pub(crate) fn run_config_show(formats_override: Option<PathBuf>) {
    let path = settings::settings_path();
    log::info!(
        "{}",
        "romport settings".if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!("");

    if path.exists() {
        log::info!(
            "  Settings file: {} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(exists)".if_supports_color(Stdout, |t| t.green()),
        );
    } else {
        log::info!(
            "  Settings file: {} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(not found)".if_supports_color(Stdout, |t| t.dimmed()),
        );
    }

    let current = settings::load_settings();
    let show = |name: &str, value: Option<String>| match value {
        Some(v) => log::info!(
            "  {} {}",
            format!("{name}:").if_supports_color(Stdout, |t| t.cyan()),
            v
        ),
        None => log::info!(
            "  {} {}",
            format!("{name}:").if_supports_color(Stdout, |t| t.cyan()),
            "not set".if_supports_color(Stdout, |t| t.yellow()),
        ),
    };
    show(
        "archive root",
        current.archive_root.map(|p| p.display().to_string()),
    );
    show("export format", current.export_format);
    show(
        "formats file",
        current.formats_file.map(|p| p.display().to_string()),
    );

    let formats_path = settings::resolve_formats_path(formats_override);
    let status = if formats_path.is_file() {
        "(exists)".if_supports_color(Stdout, |t| t.green()).to_string()
    } else {
        "(not found)".if_supports_color(Stdout, |t| t.red()).to_string()
    };
    log::info!("");
    log::info!(
        "  Formats in use: {} {}",
        formats_path.display().if_supports_color(Stdout, |t| t.cyan()),
        status,
    );

    if let Some(contents) = settings::load_settings_string() {
        log::info!("");
        for line in contents.lines() {
            log::info!("    {}", line.if_supports_color(Stdout, |t| t.dimmed()));
        }
    }
}

/// Print the settings file path.
pub(crate) fn run_config_path() {
    println!("{}", settings::settings_path().display());
}

/// Remember the archive root after checking it looks like an archive.
pub(crate) fn run_config_set_archive(path: &Path) -> Result<(), CliError> {
    let absolute = std::path::absolute(path)?;
    if !absolute.join(romport_core::archive::GAMES_DIR).is_dir() {
        log::warn!(
            "{} has no {} directory; saving anyway",
            absolute.display(),
            romport_core::archive::GAMES_DIR
        );
    }
    settings::save_archive_root(Some(&absolute))
        .map_err(|e| CliError::config(format!("{}: {e}", settings::settings_path().display())))?;
    log::info!(
        "Archive root set to {}",
        absolute.display().if_supports_color(Stdout, |t| t.cyan())
    );
    Ok(())
}

/// Remember the default export format. The format must exist.
pub(crate) fn run_config_set_format(formats: &Formats, format_id: &str) -> Result<(), CliError> {
    let profile = formats.get(format_id)?;
    settings::save_export_format(Some(&profile.id))
        .map_err(|e| CliError::config(format!("{}: {e}", settings::settings_path().display())))?;
    log::info!(
        "Default format set to {} ({})",
        profile.id.if_supports_color(Stdout, |t| t.bold()),
        profile.name
    );
    Ok(())
}
