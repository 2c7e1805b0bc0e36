//! Hand-written Groovy lexer.
//!
//! Produces a flat token stream with byte offsets (for buffer splicing) and
//! 1-based line/column positions, columns counted in UTF-16 code units so
//! the position model's ±1 editor conversion is exact. Newline runs become
//! explicit [`TokenKind::Newline`] tokens because Groovy statements are
//! newline-terminated; the parser decides where they are significant.
//!
//! The lexer never fails: malformed input becomes [`TokenKind::Error`]
//! tokens and scanning continues at the next line. A token budget bounds
//! work on adversarial input.

mod keywords;
mod token;

pub use keywords::{KEYWORDS, is_keyword};
pub use token::{Token, TokenKind};

use groovy_position::LineColumn;
use std::sync::Arc;

/// Hard cap on emitted tokens; far above any real source file.
const MAX_TOKENS: usize = 1_000_000;

/// Multi-character operators, longest first for maximal munch.
const OPERATORS: &[&str] = &[
    ">>>=", ">>>", "<=>", "**=", "==~", "..<", "<<=", ">>=", "==", "!=", "<=", ">=", "&&", "||",
    "**", "++", "--", "+=", "-=", "*=", "/=", "%=", "=~", "..", "?:", "?.", "*.", "->", "::",
    "<<", ">>", "|=", "&=", "^=", "?=", "+", "-", "*", "/", "%", "<", ">", "=", "!", "~", "&",
    "|", "^", "?", "@",
];

pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: u32,
    column: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0, line: 1, column: 1 }
    }

    /// Tokenizes the whole input. The stream always ends with a single Eof
    /// token.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            if tokens.len() >= MAX_TOKENS {
                tokens.push(self.make_error(self.pos, self.here(), "token budget exceeded"));
                break;
            }
            self.skip_blank();
            if self.at_end() {
                break;
            }
            let token = self.next_token();
            tokens.push(token);
        }
        let here = self.here();
        tokens.push(Token {
            kind: TokenKind::Eof,
            text: Arc::from(""),
            start_offset: self.pos,
            end_offset: self.pos,
            start: here,
            end: here,
        });
        tokens
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn here(&self) -> LineColumn {
        LineColumn::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, bytes_ahead: usize) -> Option<char> {
        self.source.get(self.pos + bytes_ahead..)?.chars().next()
    }

    fn starts_with(&self, s: &str) -> bool {
        self.source[self.pos..].starts_with(s)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += ch.len_utf16() as u32;
        }
        Some(ch)
    }

    /// Skips spaces, tabs, carriage returns, comments, and backslash line
    /// continuations. Leaves newlines for the token loop.
    fn skip_blank(&mut self) {
        if self.pos == 0 && self.starts_with("#!") {
            while let Some(ch) = self.peek() {
                if ch == '\n' {
                    break;
                }
                self.bump();
            }
        }
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.bump();
                }
                Some('\\') if self.peek_at(1) == Some('\n') => {
                    self.bump();
                    self.bump();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.bump();
                    self.bump();
                    loop {
                        if self.at_end() {
                            break;
                        }
                        if self.starts_with("*/") {
                            self.bump();
                            self.bump();
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Token {
        let start_offset = self.pos;
        let start = self.here();

        let ch = match self.peek() {
            Some(c) => c,
            None => return self.make_error(start_offset, start, "unexpected end of input"),
        };

        if ch == '\n' {
            // Collapse a newline run (with interleaved blank space) into one
            // separator token.
            while self.peek() == Some('\n') {
                self.bump();
                self.skip_blank();
            }
            return self.finish(TokenKind::Newline, start_offset, start);
        }

        if ch == '\'' || ch == '"' {
            return self.scan_string(start_offset, start, ch);
        }

        if ch.is_ascii_digit() {
            return self.scan_number(start_offset, start);
        }

        if unicode_ident::is_xid_start(ch) || ch == '_' || ch == '$' {
            return self.scan_word(start_offset, start);
        }

        let kind = match ch {
            '(' => Some(TokenKind::LeftParen),
            ')' => Some(TokenKind::RightParen),
            '[' => Some(TokenKind::LeftBracket),
            ']' => Some(TokenKind::RightBracket),
            '{' => Some(TokenKind::LeftBrace),
            '}' => Some(TokenKind::RightBrace),
            ';' => Some(TokenKind::Semicolon),
            ',' => Some(TokenKind::Comma),
            _ => None,
        };
        if let Some(kind) = kind {
            self.bump();
            return self.finish(kind, start_offset, start);
        }

        if ch == '.' && !matches!(self.peek_at(1), Some('.')) {
            self.bump();
            return self.finish(TokenKind::Dot, start_offset, start);
        }
        if ch == ':' && self.peek_at(1) != Some(':') {
            self.bump();
            return self.finish(TokenKind::Colon, start_offset, start);
        }

        for op in OPERATORS {
            if self.starts_with(op) {
                for _ in 0..op.chars().count() {
                    self.bump();
                }
                let kind = match *op {
                    "?." => TokenKind::SafeDot,
                    "*." => TokenKind::SpreadDot,
                    "->" => TokenKind::Arrow,
                    "::" => TokenKind::ColonColon,
                    spelling => TokenKind::Operator(Arc::from(spelling)),
                };
                return self.finish(kind, start_offset, start);
            }
        }
        self.bump();
        self.make_error(start_offset, start, "unrecognized character")
    }

    fn scan_word(&mut self, start_offset: usize, start: LineColumn) -> Token {
        while let Some(ch) = self.peek() {
            if unicode_ident::is_xid_continue(ch) || ch == '_' || ch == '$' {
                self.bump();
            } else {
                break;
            }
        }
        let text = &self.source[start_offset..self.pos];
        let kind =
            if keywords::is_keyword(text) { TokenKind::Keyword } else { TokenKind::Identifier };
        self.finish(kind, start_offset, start)
    }

    fn scan_number(&mut self, start_offset: usize, start: LineColumn) -> Token {
        let mut decimal = false;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '_') {
            self.bump();
        }
        if self.peek() == Some('.') && matches!(self.peek_at(1), Some(c) if c.is_ascii_digit()) {
            decimal = true;
            self.bump();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '_') {
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E'))
            && matches!(self.peek_at(1), Some(c) if c.is_ascii_digit() || c == '+' || c == '-')
        {
            decimal = true;
            self.bump();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.bump();
            }
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.bump();
            }
        }
        if let Some(suffix) = self.peek() {
            if "GgLlIiDdFf".contains(suffix) {
                decimal = decimal || matches!(suffix, 'D' | 'd' | 'F' | 'f');
                self.bump();
            }
        }
        self.finish(TokenKind::Number { decimal }, start_offset, start)
    }

    fn scan_string(&mut self, start_offset: usize, start: LineColumn, quote: char) -> Token {
        let triple = {
            let q = &self.source[self.pos..];
            q.len() >= 3 && q.chars().take(3).all(|c| c == quote)
        };
        let quote_len = if triple { 3 } else { 1 };
        for _ in 0..quote_len {
            self.bump();
        }
        let value_start = self.pos;

        loop {
            if self.at_end() {
                return self.make_error(start_offset, start, "unterminated string literal");
            }
            if triple {
                if self.peek() == Some(quote)
                    && self.peek_at(quote.len_utf8()) == Some(quote)
                    && self.peek_at(quote.len_utf8() * 2) == Some(quote)
                {
                    break;
                }
                self.bump();
                continue;
            }
            match self.peek() {
                Some('\\') => {
                    self.bump();
                    self.bump();
                }
                Some('\n') => {
                    return self.make_error(start_offset, start, "unterminated string literal");
                }
                Some(c) if c == quote => break,
                _ => {
                    self.bump();
                }
            }
        }

        let value = &self.source[value_start..self.pos];
        for _ in 0..quote_len {
            self.bump();
        }
        let interpolated = quote == '"' && has_unescaped_dollar(value);
        self.finish(
            TokenKind::Str { value: Arc::from(value), interpolated, triple },
            start_offset,
            start,
        )
    }

    fn finish(&self, kind: TokenKind, start_offset: usize, start: LineColumn) -> Token {
        Token {
            kind,
            text: Arc::from(&self.source[start_offset..self.pos]),
            start_offset,
            end_offset: self.pos,
            start,
            end: self.here(),
        }
    }

    fn make_error(&self, start_offset: usize, start: LineColumn, message: &str) -> Token {
        Token {
            kind: TokenKind::Error(Arc::from(message)),
            text: Arc::from(&self.source[start_offset..self.pos.min(self.source.len())]),
            start_offset,
            end_offset: self.pos,
            start,
            end: self.here(),
        }
    }
}

fn has_unescaped_dollar(value: &str) -> bool {
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '$' => return true,
            _ => {}
        }
    }
    false
}

/// Convenience wrapper.
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<String> {
        tokenize(source)
            .into_iter()
            .map(|t| match t.kind {
                TokenKind::Identifier => format!("id:{}", t.text),
                TokenKind::Keyword => format!("kw:{}", t.text),
                TokenKind::Number { .. } => format!("num:{}", t.text),
                TokenKind::Str { interpolated, .. } => {
                    format!("str{}:{}", if interpolated { "$" } else { "" }, t.text)
                }
                TokenKind::Operator(op) => format!("op:{op}"),
                TokenKind::Newline => "nl".to_string(),
                TokenKind::Eof => "eof".to_string(),
                other => format!("{other:?}"),
            })
            .collect()
    }

    #[test]
    fn declaration_tokens() {
        assert_eq!(
            kinds("def greeting = \"hi\""),
            vec!["kw:def", "id:greeting", "op:=", "str:\"hi\"", "eof"]
        );
    }

    #[test]
    fn gstring_is_flagged_interpolated() {
        let tokens = tokenize("\"hi, $name\"");
        match &tokens[0].kind {
            TokenKind::Str { interpolated, value, .. } => {
                assert!(*interpolated);
                assert_eq!(&**value, "hi, $name");
            }
            other => panic!("expected string token, got {other:?}"),
        }
    }

    #[test]
    fn escaped_dollar_is_not_interpolated() {
        let tokens = tokenize(r#""cost: \$5""#);
        assert!(matches!(&tokens[0].kind, TokenKind::Str { interpolated: false, .. }));
    }

    #[test]
    fn operators_use_maximal_munch() {
        assert_eq!(kinds("a <=> b"), vec!["id:a", "op:<=>", "id:b", "eof"]);
        assert_eq!(kinds("0..<10"), vec!["num:0", "op:..<", "num:10", "eof"]);
        assert_eq!(kinds("x ?: y"), vec!["id:x", "op:?:", "id:y", "eof"]);
    }

    #[test]
    fn dot_variants() {
        let tokens = tokenize("a?.b*.c.d");
        let kinds: Vec<_> = tokens.iter().map(|t| &t.kind).collect();
        assert!(matches!(kinds[1], TokenKind::SafeDot));
        assert!(matches!(kinds[3], TokenKind::SpreadDot));
        assert!(matches!(kinds[5], TokenKind::Dot));
    }

    #[test]
    fn newline_runs_collapse() {
        assert_eq!(kinds("a\n\n\nb"), vec!["id:a", "nl", "id:b", "eof"]);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(kinds("a // trailing\nb /* inline */ c"), vec!["id:a", "nl", "id:b", "id:c", "eof"]);
    }

    #[test]
    fn unterminated_string_recovers() {
        let tokens = tokenize("def s = \"oops\nnext");
        assert!(tokens.iter().any(|t| matches!(t.kind, TokenKind::Error(_))));
        assert!(tokens.iter().any(|t| matches!(t.kind, TokenKind::Identifier) && &*t.text == "next"));
    }

    #[test]
    fn utf16_columns() {
        // '𝕏' occupies two UTF-16 units; the following identifier starts at
        // column 1 + 2 + 1 (1-based).
        let tokens = tokenize("𝕏 ok");
        let ok = tokens.iter().find(|t| &*t.text == "ok").map(|t| t.start);
        assert_eq!(ok, Some(groovy_position::LineColumn::new(1, 4)));
    }

    #[test]
    fn triple_quoted_spans_lines() {
        let tokens = tokenize("x = '''a\nb'''\ny");
        assert!(matches!(&tokens[2].kind, TokenKind::Str { triple: true, .. }));
        let y = tokens.iter().find(|t| &*t.text == "y");
        assert_eq!(y.map(|t| t.start.line), Some(3));
    }
}
