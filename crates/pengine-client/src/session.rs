//! One remote execution context.

use std::sync::Arc;

use pengine_core::{Event, EventKind, Format, HostTerm, Operators, Solution, Transport};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{Answers, ClientConfig, Decode, PengineError};

/// A session on the server, identified by a server-assigned id.
///
/// Liveness only ever goes from alive to dead. Once dead, every operation
/// that would talk to the server fails with [`PengineError::Dead`] without
/// a round-trip.
pub struct Session {
    id: String,
    slave_limit: i64,
    alive: bool,
    destroy: bool,
    transport: Arc<dyn Transport>,
    config: Arc<ClientConfig>,
    operators: Arc<Operators>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("slave_limit", &self.slave_limit)
            .field("alive", &self.alive)
            .field("destroy", &self.destroy)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        config: Arc<ClientConfig>,
        operators: Arc<Operators>,
        destroy: bool,
    ) -> Self {
        Self {
            id: String::new(),
            slave_limit: 0,
            alive: true,
            destroy,
            transport,
            config,
            operators,
        }
    }

    /// Server-assigned id; empty until the creation reply is handled.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Open-result limit reported by the server. Advisory only.
    #[must_use]
    pub const fn slave_limit(&self) -> i64 {
        self.slave_limit
    }

    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Whether the server destroys this session once its query completes.
    #[must_use]
    pub const fn destroys(&self) -> bool {
        self.destroy
    }

    /// Apply this event's own effect on identity. Returns whether the event
    /// ends the session; the caller applies that after any nested event.
    pub(crate) fn apply<T>(&mut self, event: &Event<T>) -> bool {
        match &event.kind {
            EventKind::Create { slave_limit } => {
                if !event.id.is_empty() {
                    self.id.clone_from(&event.id);
                }
                self.slave_limit = *slave_limit;
                false
            }
            kind => kind.is_terminal(),
        }
    }

    /// Apply a whole event chain.
    pub(crate) fn observe<T>(&mut self, event: &Event<T>) {
        let ends = self.apply(event);
        if let Some(child) = &event.answer {
            self.observe(child);
        }
        if ends {
            self.die();
        }
    }

    pub(crate) fn die(&mut self) {
        if self.alive {
            debug!(id = %self.id, "pengine died");
        }
        self.alive = false;
    }

    /// Send a text command, racing it against `cancel`.
    pub(crate) async fn send(
        &self,
        format: Format,
        body: &str,
        cancel: &CancellationToken,
    ) -> Result<String, PengineError> {
        if !self.alive {
            return Err(PengineError::Dead);
        }
        debug!(id = %self.id, format = format.as_str(), body, "pengine send");
        let reply = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(PengineError::Cancelled),
            reply = self.transport.send(&self.id, format, body) => reply?,
        };
        debug!(id = %self.id, body = %reply, "pengine receive");
        Ok(reply)
    }

    /// Ask the server to stop the running query.
    pub(crate) async fn stop(&self, format: Format) -> Result<String, PengineError> {
        if !self.alive {
            return Err(PengineError::Dead);
        }
        debug!(id = %self.id, "pengine stop");
        Ok(self.transport.stop(&self.id, format).await?)
    }

    pub(crate) fn decode<T: Decode>(&self, body: &str) -> Result<Event<T>, PengineError> {
        T::decode(body, &self.operators)
    }

    /// Ask a query, reading answers from the JSON encoding.
    ///
    /// # Errors
    /// Returns [`PengineError::Dead`] if the session is dead, or the
    /// transport/decode error of the ask request.
    pub async fn ask(
        self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Answers<Solution>, PengineError> {
        self.ask_as(query, cancel).await
    }

    /// Ask a query, reading answers from the Prolog text encoding. Each
    /// answer is `query` with its variables instantiated.
    ///
    /// # Errors
    /// Same as [`Session::ask`].
    pub async fn ask_prolog(
        self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Answers<HostTerm>, PengineError> {
        self.ask_as(query, cancel).await
    }

    /// Ask a query, reading answers as `T`.
    ///
    /// # Errors
    /// Same as [`Session::ask`].
    pub async fn ask_as<T: Decode>(
        self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Answers<T>, PengineError> {
        let mut options = self.config.create_options(T::FORMAT, self.destroy);
        if T::FORMAT == Format::Prolog {
            options.template = Some(query.to_string());
        }
        let body = format!("ask(({query}), {})", options.to_prolog());
        let reply = self.send(T::FORMAT, &body, cancel).await?;
        let event = self.decode(&reply)?;
        Ok(Answers::from_event(self, event))
    }

    /// Check that the session is still alive on the server.
    ///
    /// # Errors
    /// Returns [`PengineError::Dead`] if the session is, or turns out to be,
    /// dead.
    pub async fn ping(&mut self, cancel: &CancellationToken) -> Result<(), PengineError> {
        if !self.alive {
            return Err(PengineError::Dead);
        }
        let reply = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(PengineError::Cancelled),
            reply = self.transport.ping(&self.id, Format::Json) => reply?,
        };
        debug!(id = %self.id, body = %reply, "pengine ping");
        let event: Event<Solution> = self.decode(&reply)?;
        self.observe(&event);
        if self.alive {
            Ok(())
        } else {
            Err(PengineError::Dead)
        }
    }

    /// Destroy the session. A no-op if it is already dead.
    ///
    /// # Errors
    /// Returns the transport/decode error of the destroy request.
    pub async fn close(&mut self) -> Result<(), PengineError> {
        if !self.alive {
            return Ok(());
        }
        let reply = self
            .send(Format::Json, "destroy", &CancellationToken::new())
            .await?;
        let event: Event<Solution> = self.decode(&reply)?;
        self.observe(&event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Request, Scripted};

    fn session(transport: &Arc<Scripted>) -> Session {
        let mut s = Session::new(
            Arc::clone(transport) as Arc<dyn Transport>,
            Arc::new(ClientConfig::new("http://test").with_chunk(2)),
            Arc::new(Operators::default()),
            false,
        );
        s.id = "p1".into();
        s
    }

    #[tokio::test]
    async fn test_ask_body_carries_options() {
        let transport = Scripted::bodies(&[r#"{"event":"success","id":"p1","data":[],"more":false}"#]);
        let answers = session(&transport)
            .ask("member(X,[1,2])", &CancellationToken::new())
            .await
            .unwrap();
        assert!(answers.session().is_alive());
        assert_eq!(
            transport.requests(),
            vec![Request::Send {
                id: "p1".into(),
                format: Format::Json,
                body: "ask((member(X,[1,2])), [destroy(false),chunk(2)])".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_prolog_ask_sets_template() {
        let transport = Scripted::bodies(&["success(p1,[t(1)],[],0.0,false)"]);
        let mut answers = session(&transport)
            .ask_prolog("t(X)", &CancellationToken::new())
            .await
            .unwrap();
        let Request::Send { format, body, .. } = &transport.requests()[0] else {
            panic!("expected send");
        };
        assert_eq!(*format, Format::Prolog);
        assert_eq!(body, "ask((t(X)), [destroy(false),chunk(2),template(t(X))])");
        assert!(answers.next(&CancellationToken::new()).await);
        assert_eq!(
            answers.current(),
            Some(&HostTerm::compound("t", vec![HostTerm::from(1)]))
        );
    }

    #[tokio::test]
    async fn test_dead_session_does_not_touch_network() {
        let transport = Scripted::bodies(&[]);
        let mut s = session(&transport);
        s.die();
        let cancel = CancellationToken::new();
        assert!(matches!(s.ping(&cancel).await, Err(PengineError::Dead)));
        assert!(s.close().await.is_ok());
        assert!(matches!(
            s.ask("true", &cancel).await,
            Err(PengineError::Dead)
        ));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_ping_reports_death() {
        let transport = Scripted::bodies(&[
            r#"{"event":"ping","id":"p1"}"#,
            r#"{"event":"died","id":"p1"}"#,
        ]);
        let mut s = session(&transport);
        let cancel = CancellationToken::new();
        assert!(s.ping(&cancel).await.is_ok());
        assert!(matches!(s.ping(&cancel).await, Err(PengineError::Dead)));
        assert!(!s.is_alive());
        assert!(matches!(s.ping(&cancel).await, Err(PengineError::Dead)));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_close_sends_destroy_once() {
        let transport = Scripted::bodies(&[r#"{"event":"destroy","id":"p1"}"#]);
        let mut s = session(&transport);
        s.close().await.unwrap();
        s.close().await.unwrap();
        assert!(!s.is_alive());
        assert_eq!(
            transport.requests(),
            vec![Request::Send {
                id: "p1".into(),
                format: Format::Json,
                body: "destroy".into(),
            }]
        );
    }

    #[test]
    fn test_observe_applies_nested_events() {
        let transport = Scripted::bodies(&[]);
        let mut s = session(&transport);
        let event = Event::<Solution>::new("p9", EventKind::Create { slave_limit: 4 })
            .with_answer(Event::new("p9", EventKind::Destroy));
        s.observe(&event);
        assert_eq!(s.id(), "p9");
        assert_eq!(s.slave_limit(), 4);
        assert!(!s.is_alive());
    }
}
