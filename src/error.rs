use thiserror::Error;

/// Every way a sync run can abort. Row and heading anomalies never show up
/// here; they are dropped by the extractor.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Network failure, timeout, non-success status or unreadable body
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// Markup could not be turned into a document tree
    #[error("parse failed: {0}")]
    Parse(String),

    /// Credential, connectivity or write failure against the store
    #[error("store error: {0}")]
    Store(String),

    /// Missing or malformed settings
    #[error("config error: {0}")]
    Config(String),
}

impl SyncError {
    pub fn fetch(url: &str, reason: impl std::fmt::Display) -> Self {
        SyncError::Fetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn store(reason: impl std::fmt::Display) -> Self {
        SyncError::Store(reason.to_string())
    }
}

impl From<rusqlite::Error> for SyncError {
    fn from(e: rusqlite::Error) -> Self {
        SyncError::Store(format!("sqlite: {}", e))
    }
}

impl From<config::ConfigError> for SyncError {
    fn from(e: config::ConfigError) -> Self {
        SyncError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
