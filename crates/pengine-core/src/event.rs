//! Decoded server messages.
//!
//! Both wire encodings decode into the same [`Event`] algebra. An event may
//! carry one nested child (a `create` carrying the first answer, a `destroy`
//! wrapping the final `success`, ...). Consumers apply an event's own effect,
//! then its child, and only then any death it implies.

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::value::RawValue;

use crate::{DecodeError, HostTerm, Term};

/// One decoded server message, generic over the result type `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<T> {
    /// Session id; may be empty.
    pub id: String,
    pub kind: EventKind<T>,
    /// Nested event, handled after this one.
    pub answer: Option<Box<Event<T>>>,
}

/// Event discriminant and payload.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind<T> {
    Create {
        slave_limit: i64,
    },
    Success {
        results: Vec<T>,
        projection: Vec<String>,
        /// Server time in seconds.
        time: f64,
        more: bool,
    },
    Failure {
        time: f64,
    },
    Error(ErrorPayload),
    Destroy,
    Stop,
    Died,
    Output(HostTerm),
    Prompt(HostTerm),
    Ping,
    /// Event name this client does not understand.
    Other(String),
}

/// Payload of an `error` event.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorPayload {
    /// JSON encoding: error code plus diagnostic text.
    Status { code: String, message: String },
    /// Prolog encoding: the exception term.
    Exception(HostTerm),
}

impl<T> Event<T> {
    /// Create an event with no child.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: EventKind<T>) -> Self {
        Self {
            id: id.into(),
            kind,
            answer: None,
        }
    }

    /// Attach `next` at the end of this event's chain.
    pub fn append(&mut self, next: Self) {
        match &mut self.answer {
            Some(child) => child.append(next),
            None => self.answer = Some(Box::new(next)),
        }
    }

    /// Builder form of [`Event::append`].
    #[must_use]
    pub fn with_answer(mut self, next: Self) -> Self {
        self.append(next);
        self
    }

    /// Chain `events` in order, each one the child of the previous.
    #[must_use]
    pub fn chain(events: Vec<Self>) -> Option<Self> {
        events.into_iter().rev().fold(None, |acc, mut event| {
            if let Some(next) = acc {
                event.append(next);
            }
            Some(event)
        })
    }

    /// Number of events in the chain, this one included.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.answer.as_ref().map_or(0, |child| child.depth())
    }
}

impl<T> EventKind<T> {
    /// Wire name of this event.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Create { .. } => "create",
            Self::Success { .. } => "success",
            Self::Failure { .. } => "failure",
            Self::Error(_) => "error",
            Self::Destroy => "destroy",
            Self::Stop => "stop",
            Self::Died => "died",
            Self::Output(_) => "output",
            Self::Prompt(_) => "prompt",
            Self::Ping => "ping",
            Self::Other(name) => name,
        }
    }

    /// Whether the session is gone after this event.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Destroy | Self::Stop | Self::Died)
    }
}

/// JSON envelope as sent by the server.
#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(default)]
    data: Option<Box<RawValue>>,
    event: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    more: bool,
    #[serde(default)]
    projection: Vec<String>,
    #[serde(default)]
    time: Option<f64>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    slave_limit: Option<i64>,
    #[serde(default)]
    answer: Option<Box<RawEvent>>,
}

/// Decode one JSON response body.
///
/// Results of `success` events are deserialized as `T`, usually
/// [`crate::Solution`].
///
/// # Errors
/// Returns error if the body or any nested payload is malformed.
pub fn decode_json<T: DeserializeOwned>(body: &str) -> Result<Event<T>, DecodeError> {
    let raw: RawEvent = serde_json::from_str(body)?;
    raw.into_event()
}

impl RawEvent {
    fn into_event<T: DeserializeOwned>(self) -> Result<Event<T>, DecodeError> {
        let data = self
            .data
            .as_deref()
            .map(RawValue::get)
            .filter(|raw| raw.trim() != "null");
        let time = self.time.unwrap_or_default();

        let mut nested = None;
        let kind = match self.event.as_str() {
            "create" => EventKind::Create {
                slave_limit: self.slave_limit.unwrap_or_default(),
            },
            "success" => EventKind::Success {
                results: match data {
                    Some(raw) => serde_json::from_str(raw)?,
                    None => Vec::new(),
                },
                projection: self.projection,
                time,
                more: self.more,
            },
            "failure" => EventKind::Failure { time },
            "error" => EventKind::Error(ErrorPayload::Status {
                code: self.code.unwrap_or_default(),
                message: data.map(diagnostic).transpose()?.unwrap_or_default(),
            }),
            "destroy" => {
                if let Some(raw) = data {
                    let child: Self = serde_json::from_str(raw)?;
                    nested = Some(child.into_event()?);
                }
                EventKind::Destroy
            }
            "stop" => EventKind::Stop,
            "die" | "died" => EventKind::Died,
            "output" => EventKind::Output(data.map(host_term).transpose()?.unwrap_or_else(HostTerm::nil)),
            "prompt" => EventKind::Prompt(data.map(host_term).transpose()?.unwrap_or_else(HostTerm::nil)),
            "ping" => EventKind::Ping,
            other => {
                tracing::warn!(event = other, "unknown pengine event");
                EventKind::Other(other.to_string())
            }
        };

        let mut event = Event {
            id: self.id.unwrap_or_default(),
            kind,
            answer: nested.map(Box::new),
        };
        if let Some(answer) = self.answer {
            event.append(answer.into_event()?);
        }
        Ok(event)
    }
}

/// Error diagnostics are normally a string; anything else is kept as raw JSON.
fn diagnostic(raw: &str) -> Result<String, DecodeError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

fn host_term(raw: &str) -> Result<HostTerm, DecodeError> {
    Term::decode(raw.as_bytes()).map(|t| t.to_host())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Solution;

    fn decode(body: &str) -> Event<Solution> {
        decode_json(body).unwrap()
    }

    #[test]
    fn test_create_with_nested_success() {
        let ev = decode(
            r#"{"event":"create","id":"e1","slave_limit":3,
                "answer":{"event":"success","id":"e1","data":[{"X":1},{"X":2}],
                          "projection":["X"],"time":0.25,"more":true}}"#,
        );
        assert_eq!(ev.id, "e1");
        assert_eq!(ev.kind, EventKind::Create { slave_limit: 3 });
        let child = ev.answer.unwrap();
        let EventKind::Success {
            results,
            projection,
            time,
            more,
        } = child.kind
        else {
            panic!("expected success");
        };
        assert_eq!(results.len(), 2);
        assert_eq!(results[1]["X"].to_host(), HostTerm::Integer(2));
        assert_eq!(projection, vec!["X".to_string()]);
        assert!((time - 0.25).abs() < f64::EPSILON);
        assert!(more);
    }

    #[test]
    fn test_destroy_wraps_event() {
        let ev = decode(
            r#"{"event":"destroy","id":"e1",
                "data":{"event":"failure","id":"e1","time":0.5}}"#,
        );
        assert_eq!(ev.kind, EventKind::Destroy);
        assert_eq!(ev.answer.unwrap().kind, EventKind::Failure { time: 0.5 });

        let bare = decode(r#"{"event":"destroy","id":"e1","data":null}"#);
        assert!(bare.answer.is_none());
    }

    #[test]
    fn test_destroy_data_comes_before_answer() {
        let ev = decode(
            r#"{"event":"destroy","id":"e1",
                "data":{"event":"failure","time":0.1},
                "answer":{"event":"output","data":"hi"}}"#,
        );
        assert_eq!(ev.depth(), 3);
        let first = ev.answer.unwrap();
        assert_eq!(first.kind.name(), "failure");
        assert_eq!(
            first.answer.unwrap().kind,
            EventKind::Output(HostTerm::atom("hi"))
        );
    }

    #[test]
    fn test_error_event() {
        let ev = decode(
            r#"{"event":"error","id":"e1","code":"existence_error","data":"Unknown procedure: foo/0"}"#,
        );
        assert_eq!(
            ev.kind,
            EventKind::Error(ErrorPayload::Status {
                code: "existence_error".into(),
                message: "Unknown procedure: foo/0".into(),
            })
        );

        let odd = decode(r#"{"event":"error","data":{"why":1}}"#);
        assert_eq!(
            odd.kind,
            EventKind::Error(ErrorPayload::Status {
                code: String::new(),
                message: r#"{"why":1}"#.into(),
            })
        );
    }

    #[test]
    fn test_died_aliases_and_unknown() {
        assert_eq!(decode(r#"{"event":"die"}"#).kind, EventKind::Died);
        assert_eq!(decode(r#"{"event":"died","id":"x"}"#).kind, EventKind::Died);
        assert_eq!(
            decode(r#"{"event":"wat"}"#).kind,
            EventKind::Other("wat".into())
        );
    }

    #[test]
    fn test_malformed_bodies() {
        assert!(decode_json::<Solution>("not json").is_err());
        assert!(decode_json::<Solution>(r#"{"event":"success","data":"nope"}"#).is_err());
        assert!(decode_json::<Solution>(r#"{"event":"destroy","data":[1]}"#).is_err());
    }

    #[test]
    fn test_chain_helper() {
        let chained = Event::<Solution>::chain(vec![
            Event::new("a", EventKind::Create { slave_limit: 0 }),
            Event::new("a", EventKind::Failure { time: 0.0 }),
            Event::new("a", EventKind::Destroy),
        ])
        .unwrap();
        assert_eq!(chained.depth(), 3);
        assert!(Event::<Solution>::chain(Vec::new()).is_none());
    }
}
