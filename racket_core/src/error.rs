//! Error types for the racket_core library.
//!
//! Detection outcomes (short windows, low confidence, debounced swings) are
//! not errors; see [`crate::classifier::Rejection`]. This enum covers the
//! fallible edges: configuration, history storage and recorded-sample input.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for racket_core operations
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

    /// Session history storage error
    #[error("History error: {0}")]
    History(String),

    /// Recorded sample file could not be used
    #[error("Recording error: {0}")]
    Recording(String),

    /// Session lifecycle misuse (e.g. stopping a session that never started)
    #[error("Session error: {0}")]
    Session(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
