//! Console and log file output for the `log` facade.
//!
//! Info and debug go to stdout, warnings and errors to stderr. While a
//! spinner is attached, lines are printed with the spinner suspended so the
//! two never interleave.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use indicatif::ProgressBar;
use log::{Level, LevelFilter, Log, Metadata, Record};
use owo_colors::OwoColorize;
use owo_colors::Stream::{Stderr, Stdout};

use crate::error::CliError;

static LOGGER: OnceLock<CliLogger> = OnceLock::new();

struct CliLogger {
    console_level: LevelFilter,
    verbose: bool,
    file: Option<Mutex<File>>,
    bar: Mutex<Option<ProgressBar>>,
}

/// Install the logger.
///
/// `quiet` limits the console to warnings and errors, `verbose` enables
/// debug output with timestamps. A log file receives every record.
pub(crate) fn init(quiet: bool, verbose: bool, logfile: Option<&Path>) -> Result<(), CliError> {
    let console_level = if quiet {
        LevelFilter::Warn
    } else if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let file = match logfile {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| CliError::logging(format!("{}: {e}", path.display())))?;
            Some(Mutex::new(file))
        }
        None => None,
    };
    let max_level = if file.is_some() {
        LevelFilter::Debug
    } else {
        console_level
    };

    let logger = LOGGER.get_or_init(|| CliLogger {
        console_level,
        verbose,
        file,
        bar: Mutex::new(None),
    });
    log::set_logger(logger).map_err(CliError::logging)?;
    log::set_max_level(max_level);
    Ok(())
}

/// Route console output around `bar` until [`detach_progress`].
pub(crate) fn attach_progress(bar: &ProgressBar) {
    if let Some(logger) = LOGGER.get() {
        if let Ok(mut slot) = logger.bar.lock() {
            *slot = Some(bar.clone());
        }
    }
}

pub(crate) fn detach_progress() {
    if let Some(logger) = LOGGER.get() {
        if let Ok(mut slot) = logger.bar.lock() {
            *slot = None;
        }
    }
}

impl CliLogger {
    fn console_line(&self, record: &Record) -> String {
        let message = match record.level() {
            Level::Error => format!(
                "{} {}",
                "error:".if_supports_color(Stderr, |t| t.red()),
                record.args()
            ),
            Level::Warn => format!(
                "{} {}",
                "warning:".if_supports_color(Stderr, |t| t.yellow()),
                record.args()
            ),
            Level::Debug | Level::Trace => format!(
                "{}",
                record.args().if_supports_color(Stdout, |t| t.dimmed())
            ),
            Level::Info => record.args().to_string(),
        };
        if self.verbose {
            format!(
                "{} {:5} {message}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level()
            )
        } else {
            message
        }
    }

    fn print(&self, record: &Record) {
        let line = self.console_line(record);
        let to_stderr = record.level() <= Level::Warn;
        let write = || {
            if to_stderr {
                eprintln!("{line}");
            } else {
                println!("{line}");
            }
        };
        let bar = self.bar.lock().ok().and_then(|slot| slot.clone());
        match bar {
            Some(bar) => bar.suspend(write),
            None => write(),
        }
    }

    fn append_to_file(&self, record: &Record) {
        let Some(file) = &self.file else {
            return;
        };
        let text = record.args().to_string();
        let plain = strip_ansi_escapes::strip(text.as_bytes());
        let line = format!(
            "{} {:5} {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            String::from_utf8_lossy(&plain)
        );
        if let Ok(mut file) = file.lock() {
            let _ = writeln!(file, "{line}");
        }
    }
}

impl Log for CliLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.console_level || self.file.is_some()
    }

    fn log(&self, record: &Record) {
        if record.level() <= self.console_level {
            self.print(record);
        }
        self.append_to_file(record);
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
            }
        }
    }
}
