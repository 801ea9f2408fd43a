use romport_core::{ExportError, ProfileError};
use thiserror::Error;

/// Errors that can occur during CLI command execution.
#[derive(Debug, Error)]
pub(crate) enum CliError {
    /// I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Fatal export error (configuration, archive structure, catalog input)
    #[error("{0}")]
    Export(#[from] ExportError),

    /// Settings could not be read or written
    #[error("Config error: {0}")]
    Config(String),

    /// Summary serialization failed
    #[error("Cannot write summary: {0}")]
    Summary(#[from] serde_json::Error),

    /// Logger setup failed
    #[error("Cannot set up logging: {0}")]
    Logging(String),
}

impl CliError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub(crate) fn logging(msg: impl ToString) -> Self {
        Self::Logging(msg.to_string())
    }
}

impl From<ProfileError> for CliError {
    fn from(err: ProfileError) -> Self {
        Self::Export(err.into())
    }
}
