//! Client for Pengines servers.
//!
//! This crate provides:
//! - `Client` - Opens sessions, alone or together with a first query
//! - `Session` - One remote execution context
//! - `Answers` - The result iterator over one query
//! - `HttpTransport` - reqwest-backed transport (feature `http`)
//! - `rpc` - Remote goals as local solutions
//!
//! # Example
//!
//! ```no_run
//! use pengine_client::{CancellationToken, Client, ClientConfig};
//!
//! # async fn run() -> Result<(), pengine_client::PengineError> {
//! let client = Client::new(ClientConfig::new("http://localhost:4242/pengine").with_chunk(10));
//! let cancel = CancellationToken::new();
//! let mut answers = client.ask("member(X, [a, b, c])", &cancel).await?;
//! while answers.next(&cancel).await {
//!     println!("{:?}", answers.current());
//! }
//! if let Some(err) = answers.final_error() {
//!     return Err(err);
//! }
//! # Ok(())
//! # }
//! ```

pub mod answers;
pub mod client;
pub mod config;
pub mod decode;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod rpc;
pub mod session;

#[cfg(test)]
mod testing;

pub use answers::{Answers, State};
pub use client::Client;
pub use config::ClientConfig;
pub use decode::Decode;
pub use error::PengineError;
#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use rpc::{RpcAnswers, rpc};
#[cfg(feature = "http")]
pub use rpc::pengine_rpc;
pub use session::Session;

pub use pengine_core::{
    CreateOptions, Event, EventKind, Format, HostTerm, Operators, Solution, Term, Transport,
    TransportError,
};
pub use pengine_prolog::Bindings;
pub use tokio_util::sync::CancellationToken;
