use std::io::IsTerminal;
use std::path::Path;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use romport_core::util::format_bytes_approx;
use romport_core::{Archive, Formats, Headless, Interaction};
use romport_lib::settings;
use romport_lib::{
    ExportOptions, ExportProgress, ExportSummary, Exporter, MappingOrigin, PlacementMode,
    PlatformSummary, Selector,
};

use crate::cli_types::ExportArgs;
use crate::error::CliError;
use crate::terminal::{TerminalInteraction, spinner};

pub(crate) fn run_export(
    args: ExportArgs,
    formats: &Formats,
    quiet: bool,
) -> Result<(), CliError> {
    let format_id = settings::resolve_format(args.format.clone());
    let profile = formats.get(&format_id)?;
    let source = settings::resolve_archive_root(args.source.clone());
    let archive = Archive::open(&source)?;

    let options = ExportOptions {
        destination: args.dest.clone().or(args.destination.clone()),
        platform_selector: args.platform.as_deref().map(Selector::parse),
        game_selector: Selector::parse(&args.games),
        mode: if args.copy {
            PlacementMode::Copy
        } else {
            PlacementMode::Symlink
        },
        force: args.force,
        dry_run: args.dry_run,
        include_metadata: !args.no_metadata,
        backport: args.backport,
        catalog: args.catalog.clone(),
        variants: args.variants.clone(),
    };

    log::info!(
        "Exporting {} to {} ({})",
        source.display().if_supports_color(Stdout, |t| t.cyan()),
        profile.name.if_supports_color(Stdout, |t| t.bold()),
        profile.description,
    );
    if args.dry_run {
        log::info!(
            "{}",
            "Dry run: no files will be written".if_supports_color(Stdout, |t| t.dimmed()),
        );
    }

    let pb = spinner(quiet);
    let headless = args.no_input || !std::io::stdin().is_terminal();
    let mut terminal = TerminalInteraction::new(pb.clone());
    let mut batch = Headless;
    let prompter: &mut dyn Interaction = if headless { &mut batch } else { &mut terminal };

    let progress_callback = |progress: ExportProgress| match progress {
        ExportProgress::Platform { name, index, total } => {
            pb.set_message(format!("[{}/{}] {}", index + 1, total, name));
            pb.tick();
        }
        ExportProgress::Game { name, index, total } => {
            pb.set_message(format!("[{}/{}] {}", index + 1, total, name));
            pb.tick();
        }
        ExportProgress::Catalog { system_id } => {
            pb.set_message(format!("Writing catalog for {system_id}"));
            pb.tick();
        }
        ExportProgress::Done => pb.finish_and_clear(),
    };

    crate::logger::attach_progress(&pb);
    let result = Exporter::new(&archive, profile, options, prompter).run(&progress_callback);
    crate::logger::detach_progress();
    pb.finish_and_clear();
    let summary = result?;

    print_report(&summary, formats.source());

    if let Some(path) = &args.summary_json {
        write_summary_json(&summary, path)?;
    }
    Ok(())
}

fn write_summary_json(summary: &ExportSummary, path: &Path) -> Result<(), CliError> {
    let json = summary.to_json_pretty()?;
    std::fs::write(path, json)?;
    log::info!(
        "Summary written to {}",
        path.display().if_supports_color(Stdout, |t| t.cyan())
    );
    Ok(())
}

fn origin_label(origin: Option<MappingOrigin>) -> &'static str {
    match origin {
        Some(MappingOrigin::Configured) | None => "configured",
        Some(MappingOrigin::InteractivelyCreated) => "new custom entry",
        Some(MappingOrigin::ExistingCustomEntityDetected) => "existing custom entry",
    }
}

fn print_platform(p: &PlatformSummary, dry_run: bool) {
    log::info!(
        "{} {} {} {}",
        p.platform_name.if_supports_color(Stdout, |t| t.bold()),
        "->".if_supports_color(Stdout, |t| t.dimmed()),
        p.system_id.as_deref().unwrap_or("?").if_supports_color(Stdout, |t| t.cyan()),
        format!("({})", origin_label(p.origin)).if_supports_color(Stdout, |t| t.dimmed()),
    );

    let placed = if dry_run { p.games.simulated } else { p.games.created };
    log::info!(
        "  Games:    {} {}, {} existing, {} failed ({})",
        placed,
        if dry_run { "would be placed" } else { "placed" },
        p.games.skipped,
        p.games.failed,
        format_bytes_approx(p.games.bytes),
    );

    let meta_placed = if dry_run { p.metadata.simulated } else { p.metadata.created };
    if p.metadata.total() > 0 {
        let by_root: Vec<String> = p
            .metadata_by_root
            .iter()
            .map(|(root, n)| format!("{root}: {n}"))
            .collect();
        log::info!(
            "  Metadata: {} {}, {} existing, {} failed{}",
            meta_placed,
            if dry_run { "would be placed" } else { "placed" },
            p.metadata.skipped,
            p.metadata.failed,
            if by_root.is_empty() {
                String::new()
            } else {
                format!(" [{}]", by_root.join(", "))
            },
        );
    }

    let bp = &p.backport;
    if bp.copied + bp.simulated + bp.skipped_archive_has_it + bp.failed > 0 {
        log::info!(
            "  Backport: {} {}, {} already in archive, {} failed",
            if dry_run { bp.simulated } else { bp.copied },
            if dry_run { "would be copied" } else { "copied" },
            bp.skipped_archive_has_it,
            bp.failed,
        );
    }
    if p.ambiguous > 0 {
        log::warn!(
            "  {} game(s) had several metadata candidates and were skipped",
            p.ambiguous
        );
    }
    if !p.unmapped_categories.is_empty() {
        log::warn!(
            "  Unmapped metadata categories: {}",
            p.unmapped_categories.join(", ")
        );
    }
    if let Some(path) = &p.catalog_path {
        log::info!(
            "  Catalog:  {} entries -> {}",
            p.catalog_entries,
            path.display().if_supports_color(Stdout, |t| t.cyan()),
        );
    }
}

fn print_report(summary: &ExportSummary, formats_source: Option<&Path>) {
    log::info!("");
    for platform in &summary.platforms {
        print_platform(platform, summary.dry_run);
    }

    let totals = &summary.totals;
    log::info!("");
    log::info!("{}", "Summary".if_supports_color(Stdout, |t| t.bold()));
    if summary.dry_run {
        log::info!(
            "  {} {}",
            format!("{} would be placed", totals.simulated()).if_supports_color(Stdout, |t| t.cyan()),
            format!("({})", format_bytes_approx(totals.games.bytes)).if_supports_color(Stdout, |t| t.dimmed()),
        );
    } else {
        log::info!(
            "  {} {}",
            format!("{} placed", totals.created()).if_supports_color(Stdout, |t| t.green()),
            format!("({})", format_bytes_approx(totals.games.bytes)).if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    log::info!("  {} already present", totals.skipped());
    if totals.backport.copied + totals.backport.simulated > 0 {
        log::info!(
            "  {} backported",
            totals.backport.copied + totals.backport.simulated
        );
    }
    if totals.catalog_entries > 0 {
        log::info!("  {} catalog entries", totals.catalog_entries);
    }
    if totals.failed() > 0 {
        log::warn!("  {} failed", totals.failed());
    }

    if summary.has_failures() {
        log::warn!("");
        log::warn!("Failures:");
        for failure in &summary.failures {
            log::warn!(
                "  {} -> {}: {}",
                failure.source.display(),
                failure.destination.display(),
                failure.reason
            );
        }
    }

    if summary.has_privilege_failures() {
        log::warn!("");
        log::warn!("Symbolic links could not be created at this destination.");
        log::warn!("On Windows, enable Developer Mode or run as administrator; on FAT/exFAT");
        log::warn!("and some network shares links are not supported at all.");
        log::warn!("Re-run with --copy to copy files instead.");
    }

    if !summary.unmapped_platforms.is_empty() {
        log::warn!("");
        log::warn!(
            "{} platform(s) have no mapping for {}:",
            summary.unmapped_platforms.len(),
            summary.format
        );
        for name in &summary.unmapped_platforms {
            log::warn!("  - {name}");
        }
        let file = formats_source
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| settings::FORMATS_FILE_NAME.to_string());
        log::warn!("Add them to \"platform_mappings\" in {file},");
        log::warn!("or run without --no-input to create custom entries interactively.");
    }

    if summary.quit {
        log::info!("Stopped early at user request.");
    }
}
