//! Session factory.

use std::sync::Arc;

use pengine_core::{Event, Format, HostTerm, Operators, Solution, Transport};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{Answers, ClientConfig, Decode, PengineError, Session};

/// Opens sessions on one server.
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    transport: Arc<dyn Transport>,
    operators: Arc<Operators>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client talking HTTP to `config.url`.
    #[cfg(feature = "http")]
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        let transport = Arc::new(crate::HttpTransport::new(config.url.clone()));
        Self::with_transport(config, transport)
    }

    /// Create a client over any transport.
    #[must_use]
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
            operators: Arc::new(Operators::default()),
        }
    }

    /// Use `operators` to read and write text-encoded terms.
    #[must_use]
    pub fn with_operators(mut self, operators: Operators) -> Self {
        self.operators = Arc::new(operators);
        self
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn operators(&self) -> &Operators {
        &self.operators
    }

    /// Same client, different configuration. Shares the transport.
    pub(crate) fn reconfigured(&self, config: ClientConfig) -> Self {
        Self {
            config: Arc::new(config),
            transport: Arc::clone(&self.transport),
            operators: Arc::clone(&self.operators),
        }
    }

    /// Send a creation request, optionally carrying a first query, and
    /// return the new session with the raw creation reply. A blank query
    /// counts as no query. The session has
    /// not seen the reply yet; feed it to [`Answers::from_event`] or drop it.
    ///
    /// # Errors
    /// Returns [`PengineError::Config`] if no server URL is set, or the
    /// transport/decode error of the creation request.
    pub async fn open<T: Decode>(
        &self,
        query: Option<&str>,
        destroy: bool,
        cancel: &CancellationToken,
    ) -> Result<(Session, Event<T>), PengineError> {
        if self.config.url.is_empty() {
            return Err(PengineError::Config("server URL not set".to_string()));
        }
        let query = query.filter(|q| !q.trim().is_empty());
        let mut options = self.config.create_options(T::FORMAT, destroy);
        if let Some(query) = query {
            options.ask = Some(query.to_string());
            if T::FORMAT == Format::Prolog {
                options.template = Some(query.to_string());
            }
        }
        debug!(url = %self.config.url, format = T::FORMAT.as_str(), ?query, "pengine create");
        let reply = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(PengineError::Cancelled),
            reply = self.transport.create(&options) => reply?,
        };
        debug!(body = %reply, "pengine receive");

        let session = Session::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.config),
            Arc::clone(&self.operators),
            destroy,
        );
        let event = session.decode(&reply)?;
        Ok((session, event))
    }

    /// Create an idle session. With `destroy` off it survives its queries
    /// and can be asked repeatedly until closed.
    ///
    /// # Errors
    /// See [`Client::open`].
    pub async fn create(
        &self,
        destroy: bool,
        cancel: &CancellationToken,
    ) -> Result<Session, PengineError> {
        let (mut session, event) = self.open::<Solution>(None, destroy, cancel).await?;
        session.observe(&event);
        Ok(session)
    }

    /// Run `query` in a fresh session that the server destroys when the
    /// query completes. Answers come from the JSON encoding.
    ///
    /// # Errors
    /// See [`Client::open`].
    pub async fn ask(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Answers<Solution>, PengineError> {
        self.ask_as(query, cancel).await
    }

    /// Like [`Client::ask`], with answers read from the Prolog text
    /// encoding as instances of `query`.
    ///
    /// # Errors
    /// See [`Client::open`].
    pub async fn ask_prolog(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Answers<HostTerm>, PengineError> {
        self.ask_as(query, cancel).await
    }

    /// Run `query` in a fresh self-destroying session, reading answers as `T`.
    ///
    /// # Errors
    /// See [`Client::open`].
    pub async fn ask_as<T: Decode>(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Answers<T>, PengineError> {
        let (session, event) = self.open::<T>(Some(query), true, cancel).await?;
        Ok(Answers::from_event(session, event))
    }
}
