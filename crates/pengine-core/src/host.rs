//! Logic terms as handled by the client-side runtime.
//!
//! Lists are stored flat: the elements in one vector plus the tail, so a
//! long list is never a deep chain of cells. The empty list is the atom `[]`.

use std::fmt;

use crate::write::{WriteOptions, write_term};

/// The empty list atom.
pub const NIL: &str = "[]";

/// A logic term.
#[derive(Debug, Clone, PartialEq)]
pub enum HostTerm {
    /// An atom, e.g. `foo` or `'hello world'`.
    Atom(String),
    /// A 64-bit integer.
    Integer(i64),
    /// A floating point number.
    Float(f64),
    /// A double-quoted string.
    Str(String),
    /// A named variable. Identity is by name.
    Variable(String),
    /// A compound term `functor(args...)`.
    Compound(Compound),
    /// A non-empty list `[a, b | Tail]`.
    List(List),
}

/// A compound term.
#[derive(Debug, Clone, PartialEq)]
pub struct Compound {
    pub functor: String,
    pub args: Vec<HostTerm>,
}

/// Elements and tail of a non-empty list.
///
/// There is always at least one element and the tail is never itself a
/// [`HostTerm::List`]; [`HostTerm::list_with_tail`] keeps it that way. The
/// tail is `[]` for a proper list.
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    items: Vec<HostTerm>,
    tail: Box<HostTerm>,
}

impl List {
    #[must_use]
    pub fn items(&self) -> &[HostTerm] {
        &self.items
    }

    #[must_use]
    pub fn tail(&self) -> &HostTerm {
        &self.tail
    }

    /// Whether the list ends in `[]`.
    #[must_use]
    pub fn is_proper(&self) -> bool {
        self.tail.is_nil()
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<HostTerm>, HostTerm) {
        (self.items, *self.tail)
    }
}

impl HostTerm {
    /// Create an atom.
    #[must_use]
    pub fn atom(name: impl Into<String>) -> Self {
        Self::Atom(name.into())
    }

    /// Create a variable.
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    /// Create a compound term. With no arguments this is just the atom.
    #[must_use]
    pub fn compound(functor: impl Into<String>, args: Vec<Self>) -> Self {
        if args.is_empty() {
            return Self::Atom(functor.into());
        }
        Self::Compound(Compound {
            functor: functor.into(),
            args,
        })
    }

    /// The empty list.
    #[must_use]
    pub fn nil() -> Self {
        Self::Atom(NIL.to_string())
    }

    /// Build a proper list.
    #[must_use]
    pub fn list(items: impl IntoIterator<Item = Self>) -> Self {
        Self::list_with_tail(items, Self::nil())
    }

    /// Build a list ending in `tail`, e.g. `[a, b | T]`.
    ///
    /// A list tail is spliced in, so `[a | [b | T]]` and `[a, b | T]` build
    /// the same value. With no items this is just `tail`.
    #[must_use]
    pub fn list_with_tail(items: impl IntoIterator<Item = Self>, tail: Self) -> Self {
        let mut items: Vec<Self> = items.into_iter().collect();
        let tail = match tail {
            Self::List(rest) => {
                let (rest, tail) = rest.into_parts();
                items.extend(rest);
                tail
            }
            other => other,
        };
        if items.is_empty() {
            return tail;
        }
        Self::List(List {
            items,
            tail: Box::new(tail),
        })
    }

    /// Name and arity, for atoms and compounds. Lists and other terms have
    /// none.
    #[must_use]
    pub fn functor(&self) -> Option<(&str, usize)> {
        match self {
            Self::Atom(name) => Some((name, 0)),
            Self::Compound(c) => Some((&c.functor, c.args.len())),
            _ => None,
        }
    }

    /// Arguments of a compound; empty for everything else.
    #[must_use]
    pub fn args(&self) -> &[Self] {
        match self {
            Self::Compound(c) => &c.args,
            _ => &[],
        }
    }

    /// Text of an atom.
    #[must_use]
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Self::Atom(name) => Some(name),
            _ => None,
        }
    }

    /// Whether this is the empty list.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Atom(name) if name == NIL)
    }

    /// Whether this is a variable.
    #[must_use]
    pub const fn is_var(&self) -> bool {
        matches!(self, Self::Variable(_))
    }

    /// Elements and tail of a list; `[]` gives no elements and itself.
    #[must_use]
    pub fn as_list(&self) -> Option<(&[Self], &Self)> {
        match self {
            Self::List(list) => Some((&list.items, &list.tail)),
            nil if nil.is_nil() => Some((&[], nil)),
            _ => None,
        }
    }

    /// Elements of a proper list, or `None` for partial and improper lists.
    #[must_use]
    pub fn list_items(&self) -> Option<&[Self]> {
        match self.as_list()? {
            (items, tail) if tail.is_nil() => Some(items),
            _ => None,
        }
    }

    /// Numeric value of an integer or float.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for HostTerm {
    /// Writes the term in quoted, canonical form (lists sugared, no operators).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_term(f, self, &WriteOptions::quoted())
    }
}

impl From<&str> for HostTerm {
    fn from(name: &str) -> Self {
        Self::atom(name)
    }
}

impl From<i64> for HostTerm {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<f64> for HostTerm {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}
