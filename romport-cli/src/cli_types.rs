//! CLI type definitions: command enums and argument structs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "romport")]
#[command(
    about = "Export a game archive to frontend layouts (ES-DE, RetroArch, ...)",
    long_about = None
)]
pub(crate) struct Cli {
    /// Only show warnings and errors (suppress normal output)
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Enable verbose/debug logging (timestamps + debug-level messages)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write log output to a file (ANSI codes stripped)
    #[arg(long, global = true)]
    pub logfile: Option<PathBuf>,

    /// Formats document (defaults to settings, then the config directory,
    /// then ./fe_formats.json)
    #[arg(long, global = true)]
    pub formats: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Export games and metadata to a destination layout
    Export(ExportArgs),

    /// List available destination formats
    Formats,

    /// Show the platform and metadata mappings of a format
    Mappings {
        /// Format identifier (e.g., es-de, retroarch)
        format: String,
    },

    /// Show or change saved settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args, Clone)]
pub(crate) struct ExportArgs {
    /// Archive root containing Games/ and Metadata/ (defaults to the saved
    /// archive root, then the current directory)
    pub source: Option<PathBuf>,

    /// Destination root (defaults to the format's default destination)
    pub destination: Option<PathBuf>,

    /// Destination root; same as the positional DESTINATION
    #[arg(long)]
    pub dest: Option<PathBuf>,

    /// Destination format (defaults to the saved format, then es-de)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Platforms: ALL, INTERACTIVE, or a name to search for
    #[arg(short, long)]
    pub platform: Option<String>,

    /// Games per platform: ALL, INTERACTIVE, or a name to search for
    #[arg(short, long, default_value = "ALL")]
    pub games: String,

    /// Replace files that already exist at the destination
    #[arg(long)]
    pub force: bool,

    /// Export games only
    #[arg(long)]
    pub no_metadata: bool,

    /// Copy files instead of creating symbolic links
    #[arg(long)]
    pub copy: bool,

    /// Show what would be done without touching any file
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Copy metadata found at the destination back into the archive when
    /// the archive lacks it (never overwrites)
    #[arg(long)]
    pub backport: bool,

    /// CSV catalog input used to generate gamelists/playlists
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Variant subdirectories to search: all, none, or a list (Japan,World)
    #[arg(long)]
    pub variants: Option<String>,

    /// Write the run summary as JSON to this file
    #[arg(long)]
    pub summary_json: Option<PathBuf>,

    /// Never prompt; unmapped platforms and ambiguous choices are skipped
    #[arg(long)]
    pub no_input: bool,
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Show current settings
    Show,

    /// Print the settings file path
    Path,

    /// Remember the archive root
    SetArchive {
        /// Archive root containing Games/ and Metadata/
        path: PathBuf,
    },

    /// Remember the default destination format
    SetFormat {
        /// Format identifier (e.g., es-de, retroarch)
        format: String,
    },
}
