//! Text-encoding support for Pengines clients.
//!
//! Provides:
//! - A term reader (lexer + operator-precedence parser)
//! - `Bindings` - Variable bindings with unification
//! - `Interpreter` - A tiny goal evaluator with native predicates
//! - `decode_event` - Turns one text response body into an `Event`

pub mod bindings;
pub mod error;
pub mod events;
pub mod interp;
mod lexer;
pub mod parser;

pub use bindings::Bindings;
pub use error::{EvalError, SyntaxError, TextDecodeError};
pub use events::{EventDecoder, decode_event};
pub use interp::{Checkpoint, Interpreter, Native};
pub use parser::parse_term;
