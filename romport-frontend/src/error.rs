/// Errors that can occur while reading catalog input or writing
/// destination-specific documents.
#[derive(Debug, thiserror::Error)]
pub enum FrontendError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid catalog input: {0}")]
    InvalidCatalog(String),
}

impl FrontendError {
    pub fn xml(msg: impl ToString) -> Self {
        Self::Xml(msg.to_string())
    }

    pub fn invalid_catalog(msg: impl Into<String>) -> Self {
        Self::InvalidCatalog(msg.into())
    }
}

impl From<quick_xml::Error> for FrontendError {
    fn from(err: quick_xml::Error) -> Self {
        Self::xml(err)
    }
}
