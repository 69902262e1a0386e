//! Token types produced by the tokenizer.

use serde::Serialize;
use std::fmt;

/// A 1-based source position.
///
/// Columns count Unicode scalar values, so a tab or a multi-byte character
/// each advance the column by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const START: Position = Position { line: 1, column: 1 };

    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Every shape the tokenizer can produce.
///
/// The set is closed on purpose: the validator matches it exhaustively, so a
/// new kind cannot be added without deciding how references inside it behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// A bare identifier or keyword.
    Identifier,
    /// An identifier directly after `.` or `->`.
    Member,
    OpenBrace,
    CloseBrace,
    StringLiteral,
    CharLiteral,
    Number,
    /// A whole `#...` line, continuation lines included.
    Preprocessor,
    LineComment,
    /// `/* ... */`, or to end of input when unterminated.
    BlockComment,
    /// `//!` followed by a known directive keyword.
    DirectiveComment,
    /// A backslash right before end of line, outside a preprocessor line.
    LineContinuation,
    Other,
}

impl TokenKind {
    /// Comments never count as code for member-access or line-start tracking.
    pub fn is_comment(self) -> bool {
        matches!(
            self,
            Self::LineComment | Self::BlockComment | Self::DirectiveComment
        )
    }
}

/// A single lexeme with its position. Borrowed from the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub lexeme: &'a str,
    pub line: usize,
    pub column: usize,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, lexeme: &'a str, pos: Position) -> Self {
        Self {
            kind,
            lexeme,
            line: pos.line,
            column: pos.column,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {:?} ({}:{})", self.kind, self.lexeme, self.line, self.column)
    }
}
