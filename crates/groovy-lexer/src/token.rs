//! Token types for the Groovy lexer.

use groovy_position::LineColumn;
use std::sync::Arc;

/// Token kinds. Operators outside the punctuation set carry their spelling;
/// everything the parser branches on structurally gets its own variant.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifier (not a keyword).
    Identifier,
    /// Reserved word from the fixed Groovy keyword list.
    Keyword,
    /// Integer or decimal literal, suffixes included.
    Number {
        decimal: bool,
    },
    /// String literal. `value` is the raw inner text (escapes undecoded);
    /// `interpolated` is set for double-quoted strings containing an
    /// unescaped `$`.
    Str {
        value: Arc<str>,
        interpolated: bool,
        triple: bool,
    },

    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Semicolon,
    Comma,
    Dot,
    /// `?.`
    SafeDot,
    /// `*.`
    SpreadDot,
    /// `::`
    ColonColon,
    Colon,
    /// `->`
    Arrow,
    /// Any other operator, by spelling (maximal munch).
    Operator(Arc<str>),

    /// One or more consecutive line terminators.
    Newline,
    Eof,
    /// Invalid input; the message says what went wrong.
    Error(Arc<str>),
}

/// A token with its source text and both coordinate systems: byte offsets
/// for splicing, 1-based line/UTF-16-column for the AST.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: Arc<str>,
    pub start_offset: usize,
    pub end_offset: usize,
    pub start: LineColumn,
    pub end: LineColumn,
}

impl Token {
    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    pub fn is_newline(&self) -> bool {
        matches!(self.kind, TokenKind::Newline)
    }

    /// True for identifiers and keywords alike; member names may shadow
    /// keywords (`list.each`, but also `x.class`).
    pub fn is_word(&self) -> bool {
        matches!(self.kind, TokenKind::Identifier | TokenKind::Keyword)
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        matches!(self.kind, TokenKind::Keyword) && &*self.text == word
    }

    pub fn is_operator(&self, spelling: &str) -> bool {
        matches!(&self.kind, TokenKind::Operator(op) if &**op == spelling)
    }
}
