//! Domain error types
//!
//! This module defines the error hierarchy for the loader.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main loader error type
///
/// This is the primary error type used throughout the application.
/// Validation errors are fatal for an upload run; REDCap rejections are
/// normally absorbed by the upload coordinator and only surface here when
/// they happen outside of a record import.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Input document validation errors (blank names, missing study_id)
    #[error("Validation error: {0}")]
    Validation(String),

    /// REDCap-related errors
    #[error("REDCap error: {0}")]
    Redcap(#[from] RedcapError),

    /// Sent-event state errors
    #[error("State management error: {0}")]
    State(String),

    /// XML parsing errors
    #[error("XML error: {0}")]
    Xml(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// REDCap-specific errors
///
/// Errors that occur when talking to the REDCap API.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum RedcapError {
    /// Failed to connect to the REDCap server
    #[error("Failed to connect to REDCap: {0}")]
    ConnectionFailed(String),

    /// Token rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The API refused the request; `body` is the raw response payload
    #[error("Request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Invalid response from server
    #[error("Invalid response from REDCap: {0}")]
    InvalidResponse(String),

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),
}

impl RedcapError {
    /// Returns the response body when the server rejected the request
    pub fn rejection_body(&self) -> Option<&str> {
        match self {
            RedcapError::Rejected { body, .. } => Some(body),
            _ => None,
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for LoaderError {
    fn from(err: std::io::Error) -> Self {
        LoaderError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for LoaderError {
    fn from(err: serde_json::Error) -> Self {
        LoaderError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for LoaderError {
    fn from(err: toml::de::Error) -> Self {
        LoaderError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<quick_xml::Error> for LoaderError {
    fn from(err: quick_xml::Error) -> Self {
        LoaderError::Xml(err.to_string())
    }
}
