//! Errors raised while reading and evaluating text-encoded terms.

use pengine_core::HostTerm;
use thiserror::Error;

/// The text could not be read as a term.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Syntax error at offset {offset}: {message}")]
pub struct SyntaxError {
    /// Character offset into the input.
    pub offset: usize,
    pub message: String,
}

impl SyntaxError {
    pub(crate) fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// A goal raised an error while being evaluated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("Instantiation error")]
    Instantiation,
    #[error("Type error: expected {expected}, got {culprit}")]
    Type {
        expected: &'static str,
        culprit: HostTerm,
    },
    #[error("Unknown procedure: {name}/{arity}")]
    UnknownProcedure { name: String, arity: usize },
}

impl EvalError {
    pub(crate) fn type_error(expected: &'static str, culprit: &HostTerm) -> Self {
        Self::Type {
            expected,
            culprit: culprit.clone(),
        }
    }
}

/// A text response body could not be turned into an event.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TextDecodeError {
    #[error("Failed to parse response: {0}")]
    Syntax(#[from] SyntaxError),
    #[error("Failed to evaluate response: {0}")]
    Eval(#[from] EvalError),
    #[error("Response goal failed")]
    Failed,
    #[error("Response carried no event")]
    Empty,
}
