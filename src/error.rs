// src/error.rs

//! Unified error handling for the mirror.

use std::fmt;

use thiserror::Error;

/// Result type alias for mirror operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed before a status was received
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Transport error for {url}: status {status}")]
    Transport { url: String, status: u16 },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV index file could not be read or written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Response was valid JSON but lacked an expected field
    #[error("Malformed response for {context}: {message}")]
    MalformedResponse { context: String, message: String },

    /// Attachment download link without a usable version parameter
    #[error("Malformed attachment URL: {0}")]
    MalformedAttachmentUrl(String),

    /// Content identifier is not a numeric token
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a malformed-response error with context.
    pub fn malformed(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::MalformedResponse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the error came from the network layer.
    ///
    /// Attachment downloads skip these and carry on with the next asset.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Transport { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_are_classified() {
        let err = AppError::Transport {
            url: "https://example.com/x".to_string(),
            status: 503,
        };
        assert!(err.is_transport());
        assert!(!AppError::InvalidIdentifier("abc".to_string()).is_transport());
        assert!(!AppError::malformed("post 1", "missing title").is_transport());
    }

    #[test]
    fn malformed_message_includes_context() {
        let err = AppError::malformed("post 42", "missing history");
        assert_eq!(
            err.to_string(),
            "Malformed response for post 42: missing history"
        );
    }
}
