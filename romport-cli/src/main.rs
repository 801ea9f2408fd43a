//! romport CLI
//!
//! Exports a Games/Metadata archive to frontend layouts described by a
//! formats document.

mod cli_types;
mod commands;
mod error;
mod logger;
mod terminal;

use std::path::PathBuf;

use clap::Parser;
use romport_core::Formats;
use romport_lib::settings;

use cli_types::{Cli, Commands, ConfigAction};
use error::CliError;

fn main() {
    let cli = Cli::parse();
    if let Err(e) = logger::init(cli.quiet, cli.verbose, cli.logfile.as_deref()) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    if let Err(e) = run(cli) {
        log::error!("{e}");
        log::logger().flush();
        std::process::exit(1);
    }
    log::logger().flush();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Export(args) => {
            let formats = load_formats(cli.formats)?;
            commands::export::run_export(args, &formats, cli.quiet)
        }
        Commands::Formats => {
            let formats = load_formats(cli.formats)?;
            commands::formats::run_formats(&formats);
            Ok(())
        }
        Commands::Mappings { format } => {
            let formats = load_formats(cli.formats)?;
            commands::formats::run_mappings(&formats, &format)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                commands::config::run_config_show(cli.formats);
                Ok(())
            }
            ConfigAction::Path => {
                commands::config::run_config_path();
                Ok(())
            }
            ConfigAction::SetArchive { path } => commands::config::run_config_set_archive(&path),
            ConfigAction::SetFormat { format } => {
                let formats = load_formats(cli.formats)?;
                commands::config::run_config_set_format(&formats, &format)
            }
        },
    }
}

fn load_formats(cli_override: Option<PathBuf>) -> Result<Formats, CliError> {
    let path = settings::resolve_formats_path(cli_override);
    log::debug!("Using formats document {}", path.display());
    Ok(Formats::load(&path)?)
}
