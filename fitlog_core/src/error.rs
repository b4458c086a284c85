//! Error types for the fitlog_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for fitlog_core operations
///
/// The nutrition and gamification engines never return this; it covers the
/// persistence, configuration and validation layers around them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejected profile, workout or meal input
    #[error("Validation error: {0}")]
    Validation(String),

    /// An entry with this id is already journaled
    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    /// No entry with this id exists
    #[error("Not found: {0}")]
    NotFound(String),

    /// Key-value store error
    #[error("Store error: {0}")]
    Store(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
