//! Decode errors for wire payloads.

use thiserror::Error;

/// Error raised when a structured-data payload does not match the protocol.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("compound functor must be a string, got {0}")]
    Functor(String),
    #[error("compound args must be a list, got {0}")]
    Args(String),
}
