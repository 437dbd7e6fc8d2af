//! Boundary towards the network.
//!
//! A transport moves request bodies to the server and hands back raw
//! response bodies. It knows nothing about event semantics.

use async_trait::async_trait;
use thiserror::Error;

use crate::{CreateOptions, Format};

/// Transport error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("bad status: {0}")]
    Status(u16),
    #[error("Request error: {0}")]
    Request(String),
}

/// Trait for Pengines transports.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Ask the server to create a session.
    async fn create(&self, options: &CreateOptions) -> Result<String, TransportError>;

    /// Send a text command (`ask(...)`, `next`, `stop`, `destroy`) to a session.
    async fn send(&self, id: &str, format: Format, body: &str) -> Result<String, TransportError>;

    /// Check on a session without affecting it.
    async fn ping(&self, id: &str, format: Format) -> Result<String, TransportError>;

    /// Stop the running query of a session.
    async fn stop(&self, id: &str, format: Format) -> Result<String, TransportError> {
        self.send(id, format, "stop").await
    }
}
