//! Error types for cachearena

use thiserror::Error;

/// Unified error type for cache, settings and export operations
#[derive(Debug, Error)]
pub enum CacheError {
    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to serialize or parse JSON
    #[error("Parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// Failed to read or write CSV
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// Persistence collaborator failed
    #[error("Storage error: {0}")]
    Storage(String),
    /// Download hand-off failed
    #[error("Download error: {0}")]
    Download(String),
    /// Page could not be turned into a record
    #[error("Extraction error: {0}")]
    Extract(String),
    /// The mutation queue has shut down
    #[error("Cache service is no longer running")]
    ServiceClosed,
}

/// Result alias for cachearena operations
pub type Result<T> = std::result::Result<T, CacheError>;
