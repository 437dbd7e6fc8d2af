//! Writing host terms back out as Prolog text.

use std::fmt::{self, Write};

use crate::host::{HostTerm, List};
use crate::ops::Operators;

/// How to write a term.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions<'a> {
    /// Quote atoms and strings so the output reads back as the same term.
    pub quoted: bool,
    /// Write operator terms in operator form. `None` writes canonical form.
    pub ops: Option<&'a Operators>,
}

impl<'a> WriteOptions<'a> {
    /// Quoted, canonical output.
    #[must_use]
    pub const fn quoted() -> Self {
        Self {
            quoted: true,
            ops: None,
        }
    }

    /// Use `ops` for operator notation.
    #[must_use]
    pub const fn with_ops(mut self, ops: &'a Operators) -> Self {
        self.ops = Some(ops);
        self
    }
}

/// Write `term` to `out`.
///
/// # Errors
/// Returns error if the underlying writer fails.
pub fn write_term<W: Write + ?Sized>(
    out: &mut W,
    term: &HostTerm,
    opts: &WriteOptions<'_>,
) -> fmt::Result {
    Writer { out, opts }.term(term, 1200)
}

/// Render an atom, quoting it when required.
#[must_use]
pub fn quote_atom(name: &str) -> String {
    let mut s = String::new();
    // Writing to a String cannot fail.
    let _ = write_atom(&mut s, name, true);
    s
}

struct Writer<'w, 'o, W: Write + ?Sized> {
    out: &'w mut W,
    opts: &'w WriteOptions<'o>,
}

impl<W: Write + ?Sized> Writer<'_, '_, W> {
    fn term(&mut self, term: &HostTerm, max: u16) -> fmt::Result {
        match term {
            HostTerm::Atom(name) => self.atom(name, max),
            HostTerm::Integer(n) => write!(self.out, "{n}"),
            HostTerm::Float(f) => write_float(self.out, *f),
            HostTerm::Str(s) => {
                if self.opts.quoted {
                    write_quoted(self.out, s, '"')
                } else {
                    self.out.write_str(s)
                }
            }
            HostTerm::Variable(name) => self.out.write_str(name),
            HostTerm::List(list) => self.list(list),
            HostTerm::Compound(c) => {
                if c.functor == "{}" && c.args.len() == 1 {
                    self.out.write_char('{')?;
                    self.term(&c.args[0], 1200)?;
                    return self.out.write_char('}');
                }
                if let Some(ops) = self.opts.ops {
                    if c.args.len() == 2 {
                        if let Some(op) = ops.infix(&c.functor) {
                            return self.infix(&c.functor, op, &c.args[0], &c.args[1], max);
                        }
                    }
                    if c.args.len() == 1 {
                        if let Some(op) = ops.prefix(&c.functor) {
                            return self.prefix(&c.functor, op, &c.args[0], max);
                        }
                    }
                }
                write_atom(self.out, &c.functor, self.opts.quoted)?;
                self.out.write_char('(')?;
                for (i, arg) in c.args.iter().enumerate() {
                    if i > 0 {
                        self.out.write_char(',')?;
                    }
                    self.term(arg, 999)?;
                }
                self.out.write_char(')')
            }
        }
    }

    fn atom(&mut self, name: &str, max: u16) -> fmt::Result {
        let is_op = self.opts.ops.is_some_and(|ops| ops.is_op(name));
        if is_op && max < 1200 {
            self.out.write_char('(')?;
            write_atom(self.out, name, self.opts.quoted)?;
            self.out.write_char(')')
        } else {
            write_atom(self.out, name, self.opts.quoted)
        }
    }

    fn infix(
        &mut self,
        name: &str,
        op: crate::ops::Op,
        left: &HostTerm,
        right: &HostTerm,
        max: u16,
    ) -> fmt::Result {
        let paren = op.priority > max;
        if paren {
            self.out.write_char('(')?;
        }
        self.term(left, op.left_max())?;
        if name == "," {
            self.out.write_char(',')?;
        } else {
            self.out.write_char(' ')?;
            write_atom(self.out, name, self.opts.quoted)?;
            self.out.write_char(' ')?;
        }
        self.term(right, op.right_max())?;
        if paren {
            self.out.write_char(')')?;
        }
        Ok(())
    }

    fn prefix(&mut self, name: &str, op: crate::ops::Op, arg: &HostTerm, max: u16) -> fmt::Result {
        let paren = op.priority > max;
        if paren {
            self.out.write_char('(')?;
        }
        write_atom(self.out, name, self.opts.quoted)?;
        // `- 1` and `-(1)` differ from `-1`; keep a space before anything that could fuse.
        let needs_space = matches!(arg, HostTerm::Integer(_) | HostTerm::Float(_))
            || is_symbolic(name)
            || name.chars().all(|c| c.is_alphanumeric() || c == '_');
        if needs_space {
            self.out.write_char(' ')?;
        }
        self.term(arg, op.right_max())?;
        if paren {
            self.out.write_char(')')?;
        }
        Ok(())
    }

    fn list(&mut self, list: &List) -> fmt::Result {
        self.out.write_char('[')?;
        for (i, item) in list.items().iter().enumerate() {
            if i > 0 {
                self.out.write_char(',')?;
            }
            self.term(item, 999)?;
        }
        if !list.is_proper() {
            self.out.write_char('|')?;
            self.term(list.tail(), 999)?;
        }
        self.out.write_char(']')
    }
}

fn write_float<W: Write + ?Sized>(out: &mut W, f: f64) -> fmt::Result {
    if f.is_nan() {
        return out.write_str("1.5NaN");
    }
    if f.is_infinite() {
        return out.write_str(if f > 0.0 { "1.0Inf" } else { "-1.0Inf" });
    }
    let s = format!("{f:?}");
    // Prolog wants a fraction before the exponent: 1.0e-5, never 1e-5.
    match s.find('e') {
        Some(e) if !s[..e].contains('.') => write!(out, "{}.0{}", &s[..e], &s[e..]),
        _ => out.write_str(&s),
    }
}

fn write_atom<W: Write + ?Sized>(out: &mut W, name: &str, quoted: bool) -> fmt::Result {
    if !quoted || !needs_quotes(name) {
        return out.write_str(name);
    }
    write_quoted(out, name, '\'')
}

fn write_quoted<W: Write + ?Sized>(out: &mut W, text: &str, quote: char) -> fmt::Result {
    out.write_char(quote)?;
    for c in text.chars() {
        match c {
            '\\' => out.write_str("\\\\")?,
            '\n' => out.write_str("\\n")?,
            '\t' => out.write_str("\\t")?,
            '\r' => out.write_str("\\r")?,
            c if c == quote => {
                out.write_char('\\')?;
                out.write_char(c)?;
            }
            c => out.write_char(c)?,
        }
    }
    out.write_char(quote)
}

/// Characters that make up symbolic atoms such as `=..` or `:-`.
#[must_use]
pub fn is_symbol_char(c: char) -> bool {
    "+-*/\\^<>=~:.?@#&$".contains(c)
}

fn is_symbolic(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_symbol_char)
}

fn needs_quotes(name: &str) -> bool {
    if matches!(name, "[]" | "!" | ";" | "{}") {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        None => true,
        Some(c) if c.is_lowercase() => !chars.all(|c| c.is_alphanumeric() || c == '_'),
        Some(_) => !is_symbolic(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quoted(term: &HostTerm) -> String {
        term.to_string()
    }

    fn with_ops(term: &HostTerm) -> String {
        let ops = Operators::default();
        let mut s = String::new();
        write_term(&mut s, term, &WriteOptions::quoted().with_ops(&ops)).unwrap();
        s
    }

    #[test]
    fn test_atom_quoting() {
        assert_eq!(quote_atom("foo_Bar1"), "foo_Bar1");
        assert_eq!(quote_atom("Foo"), "'Foo'");
        assert_eq!(quote_atom("hello world"), "'hello world'");
        assert_eq!(quote_atom("it's"), "'it\\'s'");
        assert_eq!(quote_atom("[]"), "[]");
        assert_eq!(quote_atom("=.."), "=..");
        assert_eq!(quote_atom(""), "''");
        assert_eq!(quote_atom("あ"), "'あ'");
        assert_eq!(quote_atom("a\\b"), "'a\\\\b'");
        assert_eq!(quote_atom("two\nlines"), "'two\\nlines'");
    }

    #[test]
    fn test_strings_are_escaped_not_interpolated() {
        let text = HostTerm::Str("{\"pct\": 50}\n".into());
        assert_eq!(quoted(&text), "\"{\\\"pct\\\": 50}\\n\"");
    }

    #[test]
    fn test_canonical_compound_and_list() {
        let t = HostTerm::compound(
            "b",
            vec![HostTerm::list(vec![HostTerm::from(1), HostTerm::from(2.5)])],
        );
        assert_eq!(quoted(&t), "b([1,2.5])");
        let partial = HostTerm::list_with_tail(vec![HostTerm::from("a")], HostTerm::var("T"));
        assert_eq!(quoted(&partial), "[a|T]");
    }

    #[test]
    fn test_operator_form() {
        let goal = HostTerm::compound(
            ",",
            vec![
                HostTerm::compound(
                    "between",
                    vec![HostTerm::from(1), HostTerm::from(3), HostTerm::var("X")],
                ),
                HostTerm::compound("=", vec![HostTerm::var("Y"), HostTerm::from(-1)]),
            ],
        );
        assert_eq!(with_ops(&goal), "between(1,3,X),Y = -1");
        assert_eq!(quoted(&goal), "','(between(1,3,X),=(Y,-1))");
    }

    #[test]
    fn test_operator_priority_parens() {
        let sum = HostTerm::compound("+", vec![HostTerm::from(1), HostTerm::from(2)]);
        let product = HostTerm::compound("*", vec![sum, HostTerm::from(3)]);
        assert_eq!(with_ops(&product), "(1 + 2) * 3");
        let neg = HostTerm::compound("-", vec![HostTerm::from(1)]);
        assert_eq!(with_ops(&neg), "- 1");
    }

    #[test]
    fn test_floats() {
        assert_eq!(quoted(&HostTerm::Float(2.1)), "2.1");
        assert_eq!(quoted(&HostTerm::Float(1e-5)), "1.0e-5");
        assert_eq!(quoted(&HostTerm::Float(f64::INFINITY)), "1.0Inf");
    }
}
