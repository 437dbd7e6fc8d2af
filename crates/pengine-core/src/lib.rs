//! Core building blocks for talking to a Pengines server.
//!
//! This crate provides:
//! - `Term` / `Solution` - Results as carried by the JSON encoding
//! - `HostTerm` - Logic terms as seen by the client-side runtime
//! - `Operators` and the term writer
//! - `Event` - The decoded server message algebra
//! - `Transport` - The boundary towards HTTP (or anything else)

pub mod error;
pub mod event;
pub mod host;
pub mod ops;
pub mod options;
pub mod term;
pub mod transport;
pub mod write;

pub use error::DecodeError;
pub use event::{ErrorPayload, Event, EventKind};
pub use host::{Compound as HostCompound, HostTerm, List as HostList};
pub use ops::{Op, OpType, Operators};
pub use options::{CreateOptions, Format};
pub use term::{Compound, Solution, Term};
pub use transport::{Transport, TransportError};
pub use write::{WriteOptions, write_term};
