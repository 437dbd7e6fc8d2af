//! Operator-precedence term reader.

use pengine_core::{HostTerm, Operators};

use crate::SyntaxError;
use crate::lexer::{Token, TokenKind, tokenize};

/// Read one term from `text`, optionally followed by a terminating `.`.
///
/// Anonymous variables (`_`) are renamed apart so that no two of them unify
/// by accident.
///
/// # Errors
/// Returns error if the text is not exactly one well-formed term.
pub fn parse_term(text: &str, ops: &Operators) -> Result<HostTerm, SyntaxError> {
    let tokens = tokenize(text)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        ops,
        anon: 0,
        end_offset: text.chars().count(),
    };
    let term = parser.parse(1200)?;
    if matches!(parser.peek(), Some(TokenKind::End)) {
        parser.pos += 1;
    }
    match parser.tokens.get(parser.pos) {
        None => Ok(term),
        Some(tok) => Err(SyntaxError::new(tok.offset, "operator expected")),
    }
}

struct Parser<'o> {
    tokens: Vec<Token>,
    pos: usize,
    ops: &'o Operators,
    anon: usize,
    end_offset: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn peek_token(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.pos + n)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.end_offset, |t| t.offset)
    }

    fn next(&mut self) -> Result<Token, SyntaxError> {
        let tok = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| SyntaxError::new(self.end_offset, "unexpected end of input"))?;
        self.pos += 1;
        Ok(tok)
    }

    fn expect(&mut self, punct: char) -> Result<(), SyntaxError> {
        match self.peek() {
            Some(TokenKind::Punct(c)) if *c == punct => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(SyntaxError::new(self.offset(), format!("expected `{punct}`"))),
        }
    }

    fn parse(&mut self, max: u16) -> Result<HostTerm, SyntaxError> {
        let (left, priority) = self.primary(max)?;
        self.infix(left, priority, max)
    }

    fn infix(
        &mut self,
        mut left: HostTerm,
        mut left_priority: u16,
        max: u16,
    ) -> Result<HostTerm, SyntaxError> {
        loop {
            let name = match self.peek() {
                Some(TokenKind::Name(name)) => name.clone(),
                Some(TokenKind::Punct(',')) => ",".to_string(),
                _ => break,
            };
            let Some(op) = self.ops.infix(&name) else {
                break;
            };
            if op.priority > max || left_priority > op.left_max() {
                break;
            }
            self.pos += 1;
            let right = self.parse(op.right_max())?;
            left = HostTerm::compound(name, vec![left, right]);
            left_priority = op.priority;
        }
        Ok(left)
    }

    fn primary(&mut self, max: u16) -> Result<(HostTerm, u16), SyntaxError> {
        let tok = self.next()?;
        let term = match tok.kind {
            TokenKind::Int(n) => HostTerm::Integer(n),
            TokenKind::Float(f) => HostTerm::Float(f),
            TokenKind::Str(s) => HostTerm::Str(s),
            TokenKind::Var(name) if name == "_" => {
                self.anon += 1;
                HostTerm::var(format!("__{}", self.anon))
            }
            TokenKind::Var(name) => HostTerm::Variable(name),
            TokenKind::Punct('(') | TokenKind::OpenCt => {
                let inner = self.parse(1200)?;
                self.expect(')')?;
                inner
            }
            TokenKind::Punct('[') => {
                if matches!(self.peek(), Some(TokenKind::Punct(']'))) {
                    self.pos += 1;
                    return self.name("[]".to_string(), max);
                }
                self.list()?
            }
            TokenKind::Punct('{') => {
                if matches!(self.peek(), Some(TokenKind::Punct('}'))) {
                    self.pos += 1;
                    return self.name("{}".to_string(), max);
                }
                let inner = self.parse(1200)?;
                self.expect('}')?;
                HostTerm::compound("{}", vec![inner])
            }
            TokenKind::Name(name) => return self.name(name, max),
            TokenKind::Punct(c) => {
                return Err(SyntaxError::new(tok.offset, format!("unexpected `{c}`")));
            }
            TokenKind::End => return Err(SyntaxError::new(tok.offset, "unexpected end of clause")),
        };
        Ok((term, 0))
    }

    /// A name in primary position: compound, negative number, prefix operator or atom.
    fn name(&mut self, name: String, max: u16) -> Result<(HostTerm, u16), SyntaxError> {
        if matches!(self.peek(), Some(TokenKind::OpenCt)) {
            self.pos += 1;
            let args = self.arguments()?;
            return Ok((HostTerm::compound(name, args), 0));
        }

        if name == "-" {
            let attached = self.peek_token(0).is_some_and(|t| !t.layout_before);
            match self.peek() {
                Some(TokenKind::Int(n)) if attached => {
                    let n = -*n;
                    self.pos += 1;
                    return Ok((HostTerm::Integer(n), 0));
                }
                Some(TokenKind::Float(f)) if attached => {
                    let f = -*f;
                    self.pos += 1;
                    return Ok((HostTerm::Float(f), 0));
                }
                _ => {}
            }
        }

        if let Some(op) = self.ops.prefix(&name) {
            if !self.at_term_start() {
                return Ok((HostTerm::Atom(name), 0));
            }
            let priority = op.priority.min(max);
            let arg = self.parse(op.right_max().min(max))?;
            return Ok((HostTerm::compound(name, vec![arg]), priority));
        }

        Ok((HostTerm::Atom(name), 0))
    }

    /// Whether the next token can begin an operand of a prefix operator.
    fn at_term_start(&self) -> bool {
        match self.peek() {
            None | Some(TokenKind::End | TokenKind::Punct(')' | ']' | '}' | ',' | '|')) => false,
            Some(TokenKind::Name(next)) => {
                let functional = matches!(
                    self.peek_token(1).map(|t| &t.kind),
                    Some(TokenKind::OpenCt)
                );
                functional || self.ops.infix(next).is_none() || self.ops.prefix(next).is_some()
            }
            Some(_) => true,
        }
    }

    fn arguments(&mut self) -> Result<Vec<HostTerm>, SyntaxError> {
        let mut args = vec![self.parse(999)?];
        while matches!(self.peek(), Some(TokenKind::Punct(','))) {
            self.pos += 1;
            args.push(self.parse(999)?);
        }
        self.expect(')')?;
        Ok(args)
    }

    fn list(&mut self) -> Result<HostTerm, SyntaxError> {
        let mut items = vec![self.parse(999)?];
        let mut tail = HostTerm::nil();
        loop {
            match self.peek() {
                Some(TokenKind::Punct(',')) => {
                    self.pos += 1;
                    items.push(self.parse(999)?);
                }
                Some(TokenKind::Punct('|')) => {
                    self.pos += 1;
                    tail = self.parse(999)?;
                    break;
                }
                _ => break,
            }
        }
        self.expect(']')?;
        Ok(HostTerm::list_with_tail(items, tail))
    }
}
