//! Centralized error types for attachrelay.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the attachrelay library.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The remote content service rejected the fetch, or returned an
    /// envelope that could not be parsed.
    #[error("Content fetch failed for attachment '{id}': {reason}")]
    Fetch { id: String, reason: String },

    /// A base64 payload was malformed.
    #[error("Malformed base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    /// An attachment descriptor failed validation at the boundary.
    #[error("Invalid attachment descriptor: {0}")]
    InvalidDescriptor(String),

    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias for `Result<T, DeliveryError>`.
pub type Result<T> = std::result::Result<T, DeliveryError>;

impl DeliveryError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a `Fetch` variant from an attachment id and a reason.
    pub fn fetch(id: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            id: id.into(),
            reason: reason.to_string(),
        }
    }
}
