//! Custom error types for paperbase.
//!
//! This module defines all error types used throughout the application.
//! Per-file parse failures during ingestion are handled (logged and skipped)
//! inside the ingestion stage and never surface as these variants; everything
//! here is either fatal for the running operation or a network-stage failure.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for paperbase operations.
///
/// Uses `thiserror` for ergonomic error handling and automatic `Display` implementation.
#[derive(Debug, Error)]
pub enum PaperbaseError {
    /// Input directory missing or output path unwritable; aborts the run
    #[error("Filesystem error at {path:?}: {source}")]
    Filesystem {
        /// Path the operation failed on
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// File I/O error without a more specific path context
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization/deserialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Feed or response parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Rate limited by external API
    #[error("Rate limited, retry after {0}s")]
    RateLimited(u64),

    /// External API returned an error
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status or API-specific error code
        code: i32,
        /// Error message from API
        message: String,
    },

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias using `PaperbaseError`
pub type Result<T> = std::result::Result<T, PaperbaseError>;
