//! Result types and the wire encoding each one is read from.

use pengine_core::{Event, Format, HostTerm, Operators, Solution, event::decode_json};
use pengine_prolog::decode_event;

use crate::PengineError;

/// A result type an [`crate::Answers`] iterator can produce.
pub trait Decode: Sized + Send + Sync + 'static {
    /// Encoding requested from the server for this result type.
    const FORMAT: Format;

    /// Decode one response body.
    ///
    /// # Errors
    /// Returns error if the body is malformed.
    fn decode(body: &str, ops: &Operators) -> Result<Event<Self>, PengineError>;
}

/// Variable bindings, read from the JSON encoding.
impl Decode for Solution {
    const FORMAT: Format = Format::Json;

    fn decode(body: &str, _ops: &Operators) -> Result<Event<Self>, PengineError> {
        Ok(decode_json(body)?)
    }
}

/// Instantiated query terms, read from the Prolog text encoding.
impl Decode for HostTerm {
    const FORMAT: Format = Format::Prolog;

    fn decode(body: &str, ops: &Operators) -> Result<Event<Self>, PengineError> {
        Ok(decode_event(body, ops)?)
    }
}
