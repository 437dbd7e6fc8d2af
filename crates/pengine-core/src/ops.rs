//! Operator table used to read and write text-encoded terms.
//!
//! The table is a plain value: whoever parses or writes terms owns one and
//! passes it along. `Operators::default()` is the usual ISO set plus the few
//! SWI-Prolog additions that show up in Pengines traffic.

use std::collections::HashMap;

/// Operator type (fixity plus associativity).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpType {
    Xfx,
    Xfy,
    Yfx,
    Fy,
    Fx,
}

impl OpType {
    /// Whether this is an infix type.
    #[must_use]
    pub const fn is_infix(self) -> bool {
        matches!(self, Self::Xfx | Self::Xfy | Self::Yfx)
    }
}

/// One operator definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Op {
    pub priority: u16,
    pub kind: OpType,
}

impl Op {
    /// Maximum priority of the left argument of an infix operator.
    #[must_use]
    pub const fn left_max(self) -> u16 {
        match self.kind {
            OpType::Yfx => self.priority,
            _ => self.priority.saturating_sub(1),
        }
    }

    /// Maximum priority of the right (or only) argument.
    #[must_use]
    pub const fn right_max(self) -> u16 {
        match self.kind {
            OpType::Xfy | OpType::Fy => self.priority,
            _ => self.priority.saturating_sub(1),
        }
    }
}

/// Prefix and infix operator definitions, keyed by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operators {
    prefix: HashMap<String, Op>,
    infix: HashMap<String, Op>,
}

impl Operators {
    /// A table with no operators at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            prefix: HashMap::new(),
            infix: HashMap::new(),
        }
    }

    /// Define (or with priority 0, remove) an operator.
    pub fn add(&mut self, priority: u16, kind: OpType, name: impl Into<String>) {
        let table = if kind.is_infix() {
            &mut self.infix
        } else {
            &mut self.prefix
        };
        let name = name.into();
        if priority == 0 {
            table.remove(&name);
        } else {
            table.insert(name, Op { priority, kind });
        }
    }

    /// Look up an infix operator.
    #[must_use]
    pub fn infix(&self, name: &str) -> Option<Op> {
        self.infix.get(name).copied()
    }

    /// Look up a prefix operator.
    #[must_use]
    pub fn prefix(&self, name: &str) -> Option<Op> {
        self.prefix.get(name).copied()
    }

    /// Whether `name` is an operator of any kind.
    #[must_use]
    pub fn is_op(&self, name: &str) -> bool {
        self.infix.contains_key(name) || self.prefix.contains_key(name)
    }
}

impl Default for Operators {
    fn default() -> Self {
        use OpType::{Fx, Fy, Xfx, Xfy, Yfx};

        let mut ops = Self::empty();
        let table: &[(u16, OpType, &[&str])] = &[
            (1200, Xfx, &[":-", "-->"]),
            (1200, Fx, &[":-", "?-"]),
            (1150, Fx, &["dynamic", "discontiguous", "initialization", "multifile", "table"]),
            (1100, Xfy, &[";"]),
            (1050, Xfy, &["->", "*->"]),
            (1000, Xfy, &[","]),
            (990, Xfx, &[":="]),
            (900, Fy, &["\\+"]),
            (
                700,
                Xfx,
                &[
                    "=", "\\=", "==", "\\==", "@<", "@>", "@=<", "@>=", "=..", "is", "=:=",
                    "=\\=", "<", ">", "=<", ">=", ">:<", ":<", "as",
                ],
            ),
            (600, Xfy, &[":"]),
            (500, Yfx, &["+", "-", "/\\", "\\/", "xor"]),
            (400, Yfx, &["*", "/", "//", "rdiv", "<<", ">>", "mod", "rem", "div", "divmod"]),
            (200, Xfx, &["**"]),
            (200, Xfy, &["^"]),
            (200, Fy, &["-", "+", "\\"]),
        ];
        for (priority, kind, names) in table {
            for name in *names {
                ops.add(*priority, *kind, *name);
            }
        }
        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let ops = Operators::default();
        assert_eq!(
            ops.infix(","),
            Some(Op {
                priority: 1000,
                kind: OpType::Xfy
            })
        );
        assert_eq!(ops.prefix("-").map(|op| op.priority), Some(200));
        assert_eq!(ops.infix("-").map(|op| op.priority), Some(500));
        assert!(ops.prefix("foo").is_none());
    }

    #[test]
    fn test_argument_priorities() {
        let xfy = Op {
            priority: 1000,
            kind: OpType::Xfy,
        };
        assert_eq!((xfy.left_max(), xfy.right_max()), (999, 1000));
        let yfx = Op {
            priority: 500,
            kind: OpType::Yfx,
        };
        assert_eq!((yfx.left_max(), yfx.right_max()), (500, 499));
    }

    #[test]
    fn test_remove_operator() {
        let mut ops = Operators::default();
        ops.add(0, OpType::Xfx, "is");
        assert!(ops.infix("is").is_none());
        assert!(!Operators::empty().is_op("+"));
    }
}
