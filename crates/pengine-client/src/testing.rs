//! Scripted in-memory transport for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pengine_core::{CreateOptions, Format, Transport, TransportError};

/// One request seen by [`Scripted`].
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Create(CreateOptions),
    Send {
        id: String,
        format: Format,
        body: String,
    },
    Ping {
        id: String,
    },
}

/// Replies with canned bodies in order. Once the script runs out, every
/// further request hangs forever.
#[derive(Default)]
pub struct Scripted {
    replies: Mutex<VecDeque<Result<String, TransportError>>>,
    requests: Mutex<Vec<Request>>,
}

impl Scripted {
    pub fn new(replies: Vec<Result<String, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::default(),
        })
    }

    pub fn bodies(bodies: &[&str]) -> Arc<Self> {
        Self::new(bodies.iter().map(|b| Ok((*b).to_string())).collect())
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    async fn reply(&self, request: Request) -> Result<String, TransportError> {
        self.requests.lock().unwrap().push(request);
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(reply) => reply,
            None => std::future::pending().await,
        }
    }
}

#[async_trait]
impl Transport for Scripted {
    async fn create(&self, options: &CreateOptions) -> Result<String, TransportError> {
        self.reply(Request::Create(options.clone())).await
    }

    async fn send(&self, id: &str, format: Format, body: &str) -> Result<String, TransportError> {
        self.reply(Request::Send {
            id: id.to_string(),
            format,
            body: body.to_string(),
        })
        .await
    }

    async fn ping(&self, id: &str, _format: Format) -> Result<String, TransportError> {
        self.reply(Request::Ping { id: id.to_string() }).await
    }
}
