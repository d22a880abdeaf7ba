//! Error types for cache operations
//!
//! The cache is a pass-through for failures of the underlying fetch
//! operations; errors are clonable so a single failure can be delivered
//! verbatim to every caller joined to the same in-flight request.

use thiserror::Error;

/// Main error type for cache operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The underlying fetch operation failed
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// An argument or value could not be serialized
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

impl From<String> for CacheError {
    fn from(s: String) -> Self {
        CacheError::Fetch(s)
    }
}

impl From<&str> for CacheError {
    fn from(s: &str) -> Self {
        CacheError::Fetch(s.to_string())
    }
}
