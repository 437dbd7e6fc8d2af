//! Client errors.

use std::sync::Arc;

use pengine_core::{DecodeError, HostTerm, TransportError};
use pengine_prolog::{EvalError, TextDecodeError};
use thiserror::Error;

/// Errors surfaced by sessions and result iterators.
///
/// `Clone` so that a sticky terminal error can be reported more than once.
#[derive(Debug, Clone, Error)]
pub enum PengineError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("Decode error: {0}")]
    Decode(Arc<DecodeError>),
    #[error("pengine: failed to read response: {0}")]
    Syntax(#[from] TextDecodeError),
    #[error("pengine: died")]
    Dead,
    #[error("pengine: {code}: {message}")]
    Remote { code: String, message: String },
    #[error("pengine: exception: {0}")]
    Exception(HostTerm),
    #[error("pengine: query failed")]
    Failed,
    #[error("pengine: cancelled")]
    Cancelled,
    #[error("pengine: {0}")]
    Config(String),
    #[error("pengine: {0}")]
    Eval(#[from] EvalError),
}

impl From<DecodeError> for PengineError {
    fn from(err: DecodeError) -> Self {
        Self::Decode(Arc::new(err))
    }
}
