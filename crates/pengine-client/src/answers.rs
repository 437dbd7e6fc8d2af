//! The result iterator.
//!
//! [`Answers`] owns its [`Session`], buffers results in server order and
//! fetches continuation chunks on demand. Errors are sticky: the first one
//! observed is kept and every later advance returns `false`.
//!
//! Calls on one iterator must not overlap; take `&mut` access one at a time.

use std::collections::VecDeque;
use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use pengine_core::{ErrorPayload, Event, EventKind, HostTerm};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::{Decode, PengineError, Session};

/// Where an iterator stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Buffered results are waiting and the session is alive.
    Ready,
    /// Nothing buffered, but the server has more.
    AwaitingContinuation,
    /// Buffered results are waiting but the session is gone.
    Draining,
    /// A terminal error was recorded.
    Failed,
    /// Nothing buffered and nothing more to fetch.
    Exhausted,
}

/// Lazily produced results of one query.
#[derive(Debug)]
pub struct Answers<T> {
    session: Session,
    buf: VecDeque<T>,
    current: Option<T>,
    more: bool,
    successes: usize,
    failures: usize,
    /// Server-reported seconds, summed in arrival order.
    cumulative: f64,
    err: Option<PengineError>,
    outputs: Vec<HostTerm>,
}

impl<T: Decode> Answers<T> {
    /// Start iterating with `event`, the reply that opened the query.
    #[must_use]
    pub fn from_event(session: Session, event: Event<T>) -> Self {
        let mut answers = Self {
            session,
            buf: VecDeque::new(),
            current: None,
            more: false,
            successes: 0,
            failures: 0,
            cumulative: 0.0,
            err: None,
            outputs: Vec::new(),
        };
        answers.handle(event);
        answers
    }

    /// Advance to the next result, fetching a continuation chunk if the
    /// buffer is empty and the server has more.
    ///
    /// Returns `false` once exhausted or failed; see [`Answers::final_error`].
    pub async fn next(&mut self, cancel: &CancellationToken) -> bool {
        loop {
            if self.err.is_some() {
                return false;
            }
            if cancel.is_cancelled() {
                self.fail(PengineError::Cancelled);
                return false;
            }
            if let Some(result) = self.buf.pop_front() {
                self.current = Some(result);
                return true;
            }
            if !self.more {
                return false;
            }
            match self.fetch(cancel).await {
                Ok(event) => self.handle(event),
                Err(err) => {
                    self.fail(err);
                    return false;
                }
            }
        }
    }

    async fn fetch(&self, cancel: &CancellationToken) -> Result<Event<T>, PengineError> {
        let reply = self.session.send(T::FORMAT, "next", cancel).await?;
        self.session.decode(&reply)
    }

    /// Stop the query. A no-op if the session is already dead. Results
    /// already buffered can still be read afterwards.
    ///
    /// # Errors
    /// Returns the transport/decode error of the stop request.
    pub async fn close(&mut self) -> Result<(), PengineError> {
        if !self.session.is_alive() {
            return Ok(());
        }
        let reply = self.session.stop(T::FORMAT).await?;
        let event = self.session.decode(&reply)?;
        self.handle(event);
        self.more = false;
        Ok(())
    }

    /// Turn the iterator into a stream of results. A terminal error, if
    /// any, is yielded last.
    #[must_use]
    pub fn into_stream(self, cancel: CancellationToken) -> BoxStream<'static, Result<T, PengineError>> {
        stream::unfold(Some((self, cancel)), |state| async move {
            let (mut answers, cancel) = state?;
            if answers.next(&cancel).await {
                let result = answers.current.take()?;
                return Some((Ok(result), Some((answers, cancel))));
            }
            answers.final_error().map(|err| (Err(err), None))
        })
        .boxed()
    }
}

impl<T> Answers<T> {
    /// Apply one event: its own effect first, then its nested event, then
    /// any death it implies.
    fn handle(&mut self, event: Event<T>) {
        trace!(id = %event.id, event = event.kind.name(), "handling event");
        let ends = self.session.apply(&event);
        let Event { kind, answer, .. } = event;
        match kind {
            EventKind::Success {
                results,
                time,
                more,
                ..
            } => {
                self.successes += results.len();
                self.buf.extend(results);
                self.more = more;
                self.cumulative += time;
            }
            EventKind::Failure { time } => {
                self.failures += 1;
                self.more = false;
                self.cumulative += time;
            }
            EventKind::Error(ErrorPayload::Status { code, message }) => {
                self.fail(PengineError::Remote { code, message });
            }
            EventKind::Error(ErrorPayload::Exception(ball)) => {
                self.fail(PengineError::Exception(ball));
            }
            EventKind::Died => self.fail(PengineError::Dead),
            EventKind::Output(term) | EventKind::Prompt(term) => {
                debug!(id = %self.session.id(), output = %term, "pengine output");
                self.outputs.push(term);
            }
            EventKind::Create { .. }
            | EventKind::Destroy
            | EventKind::Stop
            | EventKind::Ping
            | EventKind::Other(_) => {}
        }
        if let Some(child) = answer {
            self.handle(*child);
        }
        if ends {
            self.session.die();
        }
    }

    fn fail(&mut self, err: PengineError) {
        if self.err.is_none() {
            debug!(id = %self.session.id(), error = %err, "pengine query error");
            self.err = Some(err);
        }
    }

    /// The result the last successful [`Answers::next`] moved to.
    #[must_use]
    pub const fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// Take ownership of the current result.
    pub const fn take_current(&mut self) -> Option<T> {
        self.current.take()
    }

    /// The terminal error, if any.
    ///
    /// With no recorded error, a query that failed at least once and never
    /// succeeded reports [`PengineError::Failed`].
    #[must_use]
    pub fn final_error(&self) -> Option<PengineError> {
        if let Some(err) = &self.err {
            return Some(err.clone());
        }
        (self.failures > 0 && self.successes == 0).then_some(PengineError::Failed)
    }

    /// Total server-reported time spent on this query.
    #[must_use]
    pub fn cumulative(&self) -> Duration {
        Duration::try_from_secs_f64(self.cumulative).unwrap_or_default()
    }

    /// Number of results received so far, buffered ones included.
    #[must_use]
    pub const fn successes(&self) -> usize {
        self.successes
    }

    /// Number of failure replies received.
    #[must_use]
    pub const fn failures(&self) -> usize {
        self.failures
    }

    /// Where the iterator stands right now.
    #[must_use]
    pub fn state(&self) -> State {
        if self.err.is_some() {
            State::Failed
        } else if !self.buf.is_empty() {
            if self.session.is_alive() {
                State::Ready
            } else {
                State::Draining
            }
        } else if self.more {
            State::AwaitingContinuation
        } else {
            State::Exhausted
        }
    }

    /// Output and prompt terms sent by the server, in arrival order.
    #[must_use]
    pub fn outputs(&self) -> &[HostTerm] {
        &self.outputs
    }

    /// The session this query runs on.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Give up the iterator and keep the session, e.g. to ask again on a
    /// session created with `destroy` off.
    #[must_use]
    pub fn into_session(self) -> Session {
        self.session
    }
}
