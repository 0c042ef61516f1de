//! Error types for Tequila
//!
//! This module defines the error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Tequila operations
///
/// Missing curriculum content (a field or week that has not been generated
/// yet) is not an error; aggregators model it as empty data instead.
#[derive(Error, Debug)]
pub enum TequilaError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Non-2xx response from the backend
    ///
    /// Displays as the server-provided message so callers can surface it
    /// verbatim.
    #[error("{message}")]
    Api {
        /// HTTP status code of the response
        status: u16,
        /// Message taken from `detail`/`message`, or the status text
        message: String,
    },

    /// Network failure before a response was received
    #[error("Transport error: {0}")]
    Transport(String),

    /// WebSocket connection or framing errors
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Week number outside the curriculum range
    #[error("Invalid week number: {week} (expected 1-{max})")]
    InvalidWeek {
        /// Requested week
        week: u32,
        /// Highest valid week
        max: u32,
    },

    /// Day number outside 1-4
    #[error("Invalid day number: {0} (expected 1-4)")]
    InvalidDay(u32),

    /// Unknown day field key
    #[error("Invalid field name: {0}")]
    InvalidField(String),

    /// The owning component was torn down while the operation was in flight
    #[error("Operation cancelled")]
    Cancelled,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl TequilaError {
    /// HTTP status carried by the error, if it came from a backend response
    pub fn status(&self) -> Option<u16> {
        match self {
            TequilaError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for Tequila operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

/// Returns true when `err` wraps [`TequilaError::Cancelled`]
pub fn is_cancelled(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<TequilaError>(),
        Some(TequilaError::Cancelled)
    )
}
