//! Error types for Health Stats

use thiserror::Error;

/// Errors that can occur while ingesting records or computing statistics
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Failed to parse record document: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid period: {0} (expected day, week or month)")]
    InvalidPeriod(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Invalid input for field '{field}': {reason}")]
    InvalidFieldInput { field: String, reason: String },

    #[error("Record store error: {0}")]
    StoreError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
