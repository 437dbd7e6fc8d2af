//! Query results as carried by the JSON encoding.
//!
//! The JSON encoding is lossy: atoms, strings and variables all arrive as
//! bare strings. The decoder applies one fixed rule and does not try to
//! guess intent: the string `"_"` becomes a [`Term::Variable`], every other
//! string becomes a [`Term::Atom`]. A genuine atom named `_` therefore reads
//! back as a variable, and a string value reads back as an atom. Use the
//! Prolog encoding when the distinction matters.

use std::collections::{BTreeMap, HashMap};

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::Error as _,
    ser::{SerializeMap, SerializeSeq},
};
use serde_json::{Number, Value};

use crate::{DecodeError, HostTerm};

/// A mapping of projected variable names to their values.
pub type Solution = HashMap<String, Term>;

/// One logic value from a JSON answer. Immutable once decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Atom(String),
    /// Number literal, kept as the exact text the server sent.
    Number(Number),
    Compound(Compound),
    /// Only produced for the `"_"` placeholder; see the module docs.
    Variable(String),
    Boolean(bool),
    List(Vec<Term>),
    Dictionary(BTreeMap<String, Term>),
    Null,
}

/// A compound term: `functor(args0, args1, ...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Compound {
    pub functor: String,
    pub args: Vec<Term>,
}

/// Key marking a JSON object as a compound rather than a dictionary.
const FUNCTOR_KEY: &str = "functor";
const ARGS_KEY: &str = "args";
const VARIABLE_PLACEHOLDER: &str = "_";

impl Term {
    /// Decode one term from raw JSON bytes.
    ///
    /// # Errors
    /// Returns error if the bytes are not JSON or a compound is malformed.
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_slice(raw)?;
        Self::from_value(value)
    }

    /// Decode one term from an already-parsed JSON value.
    ///
    /// # Errors
    /// Returns error if a compound's functor or args have the wrong shape.
    pub fn from_value(value: Value) -> Result<Self, DecodeError> {
        Ok(match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Boolean(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) if s == VARIABLE_PLACEHOLDER => Self::Variable(s),
            Value::String(s) => Self::Atom(s),
            Value::Array(items) => Self::List(
                items
                    .into_iter()
                    .map(Self::from_value)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(mut map) => {
                if let Some(functor) = map.remove(FUNCTOR_KEY) {
                    let Value::String(functor) = functor else {
                        return Err(DecodeError::Functor(functor.to_string()));
                    };
                    let args = match map.remove(ARGS_KEY) {
                        None | Some(Value::Null) => Vec::new(),
                        Some(Value::Array(args)) => args
                            .into_iter()
                            .map(Self::from_value)
                            .collect::<Result<_, _>>()?,
                        Some(other) => return Err(DecodeError::Args(other.to_string())),
                    };
                    Self::Compound(Compound { functor, args })
                } else {
                    Self::Dictionary(
                        map.into_iter()
                            .map(|(k, v)| Self::from_value(v).map(|t| (k, t)))
                            .collect::<Result<_, _>>()?,
                    )
                }
            }
        })
    }

    /// Convert to a host term. Best-effort, see the module docs.
    ///
    /// Numbers become integers unless the literal carries a fraction or
    /// exponent. Integers too large for 64 bits fall back to floats.
    /// Booleans and null become the atoms `true`, `false` and `null`;
    /// dictionaries become `json([Key=Value, ...])`.
    ///
    /// # Panics
    /// Panics on a number literal that is not valid decimal text. The
    /// decoder never produces one, so this indicates a format bug.
    #[must_use]
    pub fn to_host(&self) -> HostTerm {
        match self {
            Self::Atom(a) => HostTerm::atom(a.as_str()),
            Self::Number(n) => number_to_host(n),
            Self::Compound(c) => HostTerm::compound(
                c.functor.as_str(),
                c.args.iter().map(Self::to_host).collect(),
            ),
            Self::Variable(name) => HostTerm::var(name.as_str()),
            Self::Boolean(b) => HostTerm::atom(if *b { "true" } else { "false" }),
            Self::List(items) => HostTerm::list(items.iter().map(Self::to_host)),
            Self::Dictionary(map) => HostTerm::compound(
                "json",
                vec![HostTerm::list(map.iter().map(|(k, v)| {
                    HostTerm::compound("=", vec![HostTerm::atom(k.as_str()), v.to_host()])
                }))],
            ),
            Self::Null => HostTerm::atom("null"),
        }
    }
}

fn number_to_host(n: &Number) -> HostTerm {
    let text = n.to_string();
    let is_float = text.contains(['.', 'e', 'E']);
    if !is_float {
        if let Ok(i) = text.parse::<i64>() {
            return HostTerm::Integer(i);
        }
        tracing::warn!(number = %text, "integer does not fit in 64 bits; using a float");
    }
    match text.parse::<f64>() {
        Ok(f) => HostTerm::Float(f),
        Err(e) => panic!("pengine: malformed number literal {text:?}: {e}"),
    }
}

impl<'de> Deserialize<'de> for Term {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(D::Error::custom)
    }
}

impl Serialize for Term {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Atom(s) | Self::Variable(s) => serializer.serialize_str(s),
            Self::Number(n) => n.serialize(serializer),
            Self::Compound(c) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(FUNCTOR_KEY, &c.functor)?;
                map.serialize_entry(ARGS_KEY, &c.args)?;
                map.end()
            }
            Self::Boolean(b) => serializer.serialize_bool(*b),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Dictionary(map) => map.serialize(serializer),
            Self::Null => serializer.serialize_unit(),
        }
    }
}
