//! Error types for the screening engine

use thiserror::Error;

/// Screening engine error
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// Watchlist or rule source unreadable or malformed
    #[error("Load failure: {0}")]
    LoadFailure(String),

    /// Named threshold does not exist
    #[error("Threshold not found: {0}")]
    UnknownThreshold(String),

    /// Rule document could not be written
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    /// Adverse-media provider failed
    #[error("Adverse media lookup failed: {0}")]
    AdverseMedia(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics export error
    #[error("Metrics error: {0}")]
    Metrics(String),
}

impl Error {
    /// True for errors a caller should report as "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::UnknownThreshold(_))
    }
}

impl From<prometheus::Error> for Error {
    fn from(err: prometheus::Error) -> Self {
        Error::Metrics(err.to_string())
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
