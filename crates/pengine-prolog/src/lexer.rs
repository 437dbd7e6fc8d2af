//! Tokenizer for standard term syntax.

use pengine_core::write::is_symbol_char;

use crate::SyntaxError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    /// Atom name, unquoted, quoted or symbolic.
    Name(String),
    Var(String),
    Int(i64),
    Float(f64),
    Str(String),
    /// One of `( ) [ ] { } , |`.
    Punct(char),
    /// `(` directly after the previous token, as in `foo(`.
    OpenCt,
    /// The terminating `.`.
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub offset: usize,
    pub layout_before: bool,
}

pub(crate) fn tokenize(text: &str) -> Result<Vec<Token>, SyntaxError> {
    Lexer {
        chars: text.chars().collect(),
        pos: 0,
    }
    .run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek().filter(|c| pred(*c)) {
            out.push(c);
            self.pos += 1;
        }
        out
    }

    fn rest_starts_with(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn run(mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();
        loop {
            let layout_before = self.skip_layout()?;
            let offset = self.pos;
            let Some(c) = self.peek() else {
                break;
            };
            let kind = self.token(c, layout_before || offset == 0)?;
            tokens.push(Token {
                kind,
                offset,
                layout_before,
            });
        }
        Ok(tokens)
    }

    /// Skip whitespace and comments; returns whether anything was skipped.
    fn skip_layout(&mut self) -> Result<bool, SyntaxError> {
        let start = self.pos;
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => self.pos += 1,
                Some('%') => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    let open = self.pos;
                    self.pos += 2;
                    loop {
                        match self.bump() {
                            None => {
                                return Err(SyntaxError::new(open, "unterminated block comment"));
                            }
                            Some('*') if self.peek() == Some('/') => {
                                self.pos += 1;
                                break;
                            }
                            Some(_) => {}
                        }
                    }
                }
                _ => return Ok(self.pos > start),
            }
        }
    }

    fn token(&mut self, c: char, detached: bool) -> Result<TokenKind, SyntaxError> {
        let start = self.pos;
        match c {
            '(' => {
                self.pos += 1;
                Ok(if detached {
                    TokenKind::Punct('(')
                } else {
                    TokenKind::OpenCt
                })
            }
            ')' | '[' | ']' | '{' | '}' | ',' | '|' => {
                self.pos += 1;
                Ok(TokenKind::Punct(c))
            }
            '!' | ';' => {
                self.pos += 1;
                Ok(TokenKind::Name(c.to_string()))
            }
            '\'' => {
                self.pos += 1;
                self.quoted('\'', start).map(TokenKind::Name)
            }
            '"' => {
                self.pos += 1;
                self.quoted('"', start).map(TokenKind::Str)
            }
            '0'..='9' => self.number(),
            '_' => Ok(TokenKind::Var(self.word())),
            c if c.is_uppercase() => Ok(TokenKind::Var(self.word())),
            c if c.is_alphabetic() => Ok(TokenKind::Name(self.word())),
            '.' if self
                .peek_at(1)
                .is_none_or(|next| next.is_whitespace() || next == '%') =>
            {
                self.pos += 1;
                Ok(TokenKind::End)
            }
            c if is_symbol_char(c) => Ok(TokenKind::Name(self.take_while(is_symbol_char))),
            other => Err(SyntaxError::new(
                start,
                format!("unexpected character {other:?}"),
            )),
        }
    }

    fn word(&mut self) -> String {
        self.take_while(|c| c.is_alphanumeric() || c == '_')
    }

    fn quoted(&mut self, quote: char, start: usize) -> Result<String, SyntaxError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(SyntaxError::new(start, "unterminated quoted text")),
                Some(c) if c == quote => {
                    if self.peek() == Some(quote) {
                        self.pos += 1;
                        out.push(quote);
                    } else {
                        return Ok(out);
                    }
                }
                Some('\\') => {
                    if let Some(c) = self.escape(start)? {
                        out.push(c);
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    /// Read the escape after a backslash. `None` for a line continuation.
    fn escape(&mut self, start: usize) -> Result<Option<char>, SyntaxError> {
        let bad = || SyntaxError::new(start, "invalid escape sequence");
        let c = match self.bump().ok_or_else(bad)? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'a' => '\u{7}',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            'e' => '\u{1b}',
            's' => ' ',
            '\n' => return Ok(None),
            'x' => {
                let digits = self.take_while(|c| c.is_ascii_hexdigit());
                self.close_numeric_escape();
                return char_from(&digits, 16).map(Some).ok_or_else(bad);
            }
            d @ '0'..='7' => {
                let digits = format!("{d}{}", self.take_while(|c| c.is_digit(8)));
                self.close_numeric_escape();
                return char_from(&digits, 8).map(Some).ok_or_else(bad);
            }
            c @ ('\\' | '\'' | '"' | '`') => c,
            _ => return Err(bad()),
        };
        Ok(Some(c))
    }

    fn close_numeric_escape(&mut self) {
        if self.peek() == Some('\\') {
            self.pos += 1;
        }
    }

    fn number(&mut self) -> Result<TokenKind, SyntaxError> {
        let start = self.pos;
        if self.peek() == Some('0') && self.peek_at(1) == Some('\'') {
            self.pos += 2;
            let c = match self.bump() {
                Some('\\') => self
                    .escape(start)?
                    .ok_or_else(|| SyntaxError::new(start, "invalid character code"))?,
                Some('\'') if self.peek() == Some('\'') => {
                    self.pos += 1;
                    '\''
                }
                Some(c) => c,
                None => return Err(SyntaxError::new(start, "unterminated character code")),
            };
            return Ok(TokenKind::Int(i64::from(u32::from(c))));
        }

        if self.peek() == Some('0') {
            let radix = match self.peek_at(1) {
                Some('x') => 16,
                Some('o') => 8,
                Some('b') => 2,
                _ => 0,
            };
            if radix != 0 && self.peek_at(2).is_some_and(|c| c.is_digit(radix)) {
                self.pos += 2;
                let digits = self.take_while(|c| c.is_digit(radix));
                return i64::from_str_radix(&digits, radix)
                    .map(TokenKind::Int)
                    .map_err(|_| SyntaxError::new(start, "integer out of range"));
            }
        }

        let mut text = self.take_while(|c| c.is_ascii_digit());
        let mut is_float = false;
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
            text.push('.');
            text.push_str(&self.take_while(|c| c.is_ascii_digit()));
            is_float = true;
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_at(1), Some('+' | '-'));
            let first_digit = if signed { 2 } else { 1 };
            if self.peek_at(first_digit).is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
                text.push('e');
                if signed {
                    text.extend(self.bump());
                }
                text.push_str(&self.take_while(|c| c.is_ascii_digit()));
                is_float = true;
            }
        }

        if is_float {
            if self.rest_starts_with("Inf") {
                self.pos += 3;
                return Ok(TokenKind::Float(f64::INFINITY));
            }
            if self.rest_starts_with("NaN") {
                self.pos += 3;
                return Ok(TokenKind::Float(f64::NAN));
            }
            return text
                .parse()
                .map(TokenKind::Float)
                .map_err(|_| SyntaxError::new(start, "malformed float"));
        }
        if let Ok(n) = text.parse() {
            return Ok(TokenKind::Int(n));
        }
        tracing::warn!(literal = %text, "integer does not fit in 64 bits; using a float");
        text.parse()
            .map(TokenKind::Float)
            .map_err(|_| SyntaxError::new(start, "malformed integer"))
    }
}

fn char_from(digits: &str, radix: u32) -> Option<char> {
    u32::from_str_radix(digits, radix)
        .ok()
        .and_then(char::from_u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_functional_notation_vs_spaced_paren() {
        assert_eq!(
            kinds("foo(X)"),
            vec![
                TokenKind::Name("foo".into()),
                TokenKind::OpenCt,
                TokenKind::Var("X".into()),
                TokenKind::Punct(')'),
            ]
        );
        assert_eq!(kinds("- (1)")[1], TokenKind::Punct('('));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("42"), vec![TokenKind::Int(42)]);
        assert_eq!(kinds("0.001"), vec![TokenKind::Float(0.001)]);
        assert_eq!(kinds("1.0e10"), vec![TokenKind::Float(1.0e10)]);
        assert_eq!(kinds("0'a"), vec![TokenKind::Int(97)]);
        assert_eq!(kinds("0xff"), vec![TokenKind::Int(255)]);
        assert_eq!(kinds("1.0Inf"), vec![TokenKind::Float(f64::INFINITY)]);
        assert_eq!(
            kinds("123456789012345678901234567890"),
            vec![TokenKind::Float(1.234_567_890_123_456_8e29)]
        );
    }

    #[test]
    fn test_quoted_and_escapes() {
        assert_eq!(kinds(r"'it''s'"), vec![TokenKind::Name("it's".into())]);
        assert_eq!(kinds(r"'a\nb'"), vec![TokenKind::Name("a\nb".into())]);
        assert_eq!(kinds(r"'\x41\'"), vec![TokenKind::Name("A".into())]);
        assert_eq!(kinds(r#""str""#), vec![TokenKind::Str("str".into())]);
        assert_eq!(kinds("'メンバー'"), vec![TokenKind::Name("メンバー".into())]);
        assert!(tokenize("'open").is_err());
    }

    #[test]
    fn test_end_and_symbols() {
        assert_eq!(
            kinds("a :- b. % done\n"),
            vec![
                TokenKind::Name("a".into()),
                TokenKind::Name(":-".into()),
                TokenKind::Name("b".into()),
                TokenKind::End,
            ]
        );
        assert_eq!(kinds("'.'"), vec![TokenKind::Name(".".into())]);
        assert_eq!(kinds("/* c */ !"), vec![TokenKind::Name("!".into())]);
    }
}
