use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use romport_core::{CustomEntityKind, Formats};

use crate::error::CliError;

/// List every format in the formats document.
pub(crate) fn run_formats(formats: &Formats) {
    if let Some(path) = formats.source() {
        log::info!(
            "Formats from {}",
            path.display().if_supports_color(Stdout, |t| t.cyan())
        );
        log::info!("");
    }
    if formats.is_empty() {
        log::warn!("No formats defined");
        return;
    }

    for profile in formats.iter() {
        log::info!(
            "{} {}",
            profile.id.if_supports_color(Stdout, |t| t.bold()),
            format!("[{}]", profile.name).if_supports_color(Stdout, |t| t.cyan()),
        );
        log::info!("    {}", profile.description);
        log::info!(
            "    Default destination: {}",
            profile.default_destination.display()
        );
        log::info!(
            "    Platform mappings: {}, metadata mappings: {}",
            profile.platform_mappings.len(),
            profile.mapped_categories().count(),
        );
        if let Some(format) = profile.catalog_format {
            log::info!(
                "    Catalog: {}",
                romport_frontend::catalog_writer(format).name()
            );
        }
    }
}

/// Show one format's mapping tables.
pub(crate) fn run_mappings(formats: &Formats, format_id: &str) -> Result<(), CliError> {
    let profile = formats.get(format_id)?;

    log::info!(
        "{} {}",
        profile.name.if_supports_color(Stdout, |t| t.bold()),
        format!("({})", profile.id).if_supports_color(Stdout, |t| t.dimmed()),
    );
    log::info!("");

    log::info!("{}", "Platforms".if_supports_color(Stdout, |t| t.bold()));
    if profile.platform_mappings.is_empty() {
        log::info!("  {}", "none".if_supports_color(Stdout, |t| t.dimmed()));
    }
    let width = profile
        .platform_mappings
        .keys()
        .map(|k| k.chars().count())
        .max()
        .unwrap_or(0);
    for (archive_name, system_id) in &profile.platform_mappings {
        log::info!(
            "  {:<width$}  {}",
            archive_name,
            system_id.if_supports_color(Stdout, |t| t.cyan()),
        );
    }

    log::info!("");
    log::info!("{}", "Metadata".if_supports_color(Stdout, |t| t.bold()));
    let width = profile
        .metadata_mappings
        .keys()
        .map(|k| k.chars().count())
        .max()
        .unwrap_or(0);
    for (category, target) in &profile.metadata_mappings {
        match target {
            Some(target) => log::info!(
                "  {:<width$}  {}/{}",
                category,
                target.subdir.if_supports_color(Stdout, |t| t.cyan()),
                target.prefix,
            ),
            None => log::info!(
                "  {:<width$}  {}",
                category,
                "not supported".if_supports_color(Stdout, |t| t.dimmed()),
            ),
        }
    }

    if let Some(path) = &profile.custom_entities_path {
        let label = match profile.custom_entity_kind {
            CustomEntityKind::SystemDefinition => "Custom systems",
            CustomEntityKind::PlaylistDefinition => "Custom playlists",
        };
        log::info!("");
        log::info!("{label}: {}", path.display());
    }
    Ok(())
}
