//! Single-pass tokenizer for C-family source text.
//!
//! Only the distinctions the validator needs are made: identifiers, braces,
//! literal bodies, comments and directive comments. Everything else collapses
//! into [`TokenKind::Other`]. Literal and comment state is tracked so that
//! braces or directive-looking text inside them never become structural.
//! C++ raw strings (`R"d(...)d"` and their encoding-prefixed forms) are one
//! literal token, line breaks included.
//!
//! Two constructs are recognized but not fully supported:
//! - a backslash right before end of line emits a [`TokenKind::LineContinuation`]
//!   token; lexing then fails safe by keeping the current literal or comment open
//!   across the line break.
//! - `/* ... */` becomes one [`TokenKind::BlockComment`], so nothing inside it is
//!   a reference or a directive.

use std::collections::VecDeque;

use super::token::{Position, Token, TokenKind};
use crate::directive::DirectiveKind;

/// Literal encoding prefixes that may sit directly in front of a quote.
const LITERAL_PREFIXES: &[&str] = &["L", "u", "U", "u8"];

/// Prefixes of C++ raw string literals, `R"delim( ... )delim"`.
const RAW_PREFIXES: &[&str] = &["R", "LR", "uR", "UR", "u8R"];

/// Longest raw string delimiter the C++ grammar allows.
const MAX_RAW_DELIMITER: usize = 16;

/// Lazily produces [`Token`]s from one file's text.
///
/// Not restartable: create a fresh tokenizer per file.
pub struct Tokenizer<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
    column: usize,
    /// Tokens discovered while lexing a longer token, emitted right after it.
    pending: VecDeque<Token<'a>>,
    /// Line on which the last code token ended; `#` only starts a
    /// preprocessor line when no code precedes it on the same line.
    code_line: usize,
    /// The last code token was `.` or `->`.
    after_member_op: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            column: 1,
            pending: VecDeque::new(),
            code_line: 0,
            after_member_op: false,
        }
    }

    /// Current position. After the iterator is exhausted this is the
    /// end-of-input position.
    pub fn current_position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.source[self.offset..].chars().next()
    }

    fn peek_ahead(&self, n: usize) -> Option<char> {
        self.source[self.offset..].chars().nth(n)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn slice_from(&self, start: usize) -> &'a str {
        &self.source[start..self.offset]
    }

    /// A backslash followed by `\n` or `\r\n`.
    fn at_continuation(&self) -> bool {
        self.peek() == Some('\\')
            && match self.peek_ahead(1) {
                Some('\n') => true,
                Some('\r') => self.peek_ahead(2) == Some('\n'),
                _ => false,
            }
    }

    /// Consumes a backslash-newline and returns the token marking it.
    fn consume_continuation(&mut self) -> Token<'a> {
        let pos = self.current_position();
        let start = self.offset;
        self.advance();
        let token = Token::new(TokenKind::LineContinuation, self.slice_from(start), pos);
        if self.peek() == Some('\r') {
            self.advance();
        }
        self.advance();
        token
    }

    fn lex_token(&mut self, ch: char) -> Token<'a> {
        let start = self.offset;
        let pos = self.current_position();

        match ch {
            '#' if self.code_line != pos.line => self.preprocessor_line(start, pos),
            '/' if self.peek_ahead(1) == Some('/') => self.line_comment(start, pos),
            '/' if self.peek_ahead(1) == Some('*') => self.block_comment(start, pos),
            '"' => self.quoted(start, pos, TokenKind::StringLiteral),
            '\'' => self.quoted(start, pos, TokenKind::CharLiteral),
            '{' => self.punct(start, pos, 1, TokenKind::OpenBrace),
            '}' => self.punct(start, pos, 1, TokenKind::CloseBrace),
            c if c.is_ascii_digit() => self.number(start, pos),
            '.' if self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.number(start, pos)
            }
            c if is_ident_start(c) => self.identifier(start, pos),
            '-' if self.peek_ahead(1) == Some('>') => self.punct(start, pos, 2, TokenKind::Other),
            ':' if self.peek_ahead(1) == Some(':') => self.punct(start, pos, 2, TokenKind::Other),
            '.' if self.peek_ahead(1) == Some('.') && self.peek_ahead(2) == Some('.') => {
                self.punct(start, pos, 3, TokenKind::Other)
            }
            _ => self.punct(start, pos, 1, TokenKind::Other),
        }
    }

    fn punct(&mut self, start: usize, pos: Position, len: usize, kind: TokenKind) -> Token<'a> {
        for _ in 0..len {
            self.advance();
        }
        Token::new(kind, self.slice_from(start), pos)
    }

    /// `#...` through end of line. Continuations are part of the
    /// preprocessor line, as in the C preprocessor itself.
    fn preprocessor_line(&mut self, start: usize, pos: Position) -> Token<'a> {
        loop {
            if self.at_continuation() {
                self.consume_continuation();
                continue;
            }
            match self.peek() {
                None | Some('\n') => break,
                Some(_) => {
                    self.advance();
                }
            }
        }
        Token::new(TokenKind::Preprocessor, self.slice_from(start), pos)
    }

    fn line_comment(&mut self, start: usize, pos: Position) -> Token<'a> {
        self.advance();
        self.advance();
        loop {
            if self.at_continuation() {
                let marker = self.consume_continuation();
                self.pending.push_back(marker);
                continue;
            }
            match self.peek() {
                None | Some('\n') => break,
                Some(_) => {
                    self.advance();
                }
            }
        }

        let lexeme = self.slice_from(start);
        let kind = match lexeme.strip_prefix("//!").and_then(DirectiveKind::detect) {
            Some(_) => TokenKind::DirectiveComment,
            None => TokenKind::LineComment,
        };
        Token::new(kind, lexeme, pos)
    }

    fn block_comment(&mut self, start: usize, pos: Position) -> Token<'a> {
        self.advance();
        self.advance();
        loop {
            match self.peek() {
                None => break,
                Some('*') if self.peek_ahead(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    break;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
        Token::new(TokenKind::BlockComment, self.slice_from(start), pos)
    }

    /// String or char literal starting at the current quote. `start` may lie
    /// before the quote when an encoding prefix was already consumed.
    fn quoted(&mut self, start: usize, pos: Position, kind: TokenKind) -> Token<'a> {
        let Some(quote) = self.advance() else {
            return Token::new(kind, self.slice_from(start), pos);
        };

        loop {
            if self.at_continuation() {
                let marker = self.consume_continuation();
                self.pending.push_back(marker);
                continue;
            }
            match self.peek() {
                // Unterminated: the literal ends with its line.
                None | Some('\n') => break,
                Some('\\') => {
                    self.advance();
                    if self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
        Token::new(kind, self.slice_from(start), pos)
    }

    /// Raw string literal; the quote after the prefix is next. The body
    /// spans lines and has no escapes or continuations. Unterminated raw
    /// strings run to end of input.
    fn raw_string(&mut self, start: usize, pos: Position) -> Token<'a> {
        let source = self.source;
        let rest = &source[self.offset + 1..];
        let delimiter = match rest.find('(') {
            Some(end) if end <= MAX_RAW_DELIMITER => &rest[..end],
            _ => return self.quoted(start, pos, TokenKind::StringLiteral),
        };
        if delimiter
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '\\' | ')' | '"'))
        {
            return self.quoted(start, pos, TokenKind::StringLiteral);
        }

        let body_start = self.offset + 1 + delimiter.len() + 1;
        let closing = format!("){delimiter}\"");
        let end = source[body_start..]
            .find(&closing)
            .map_or(source.len(), |i| body_start + i + closing.len());
        while self.offset < end {
            self.advance();
        }
        Token::new(TokenKind::StringLiteral, self.slice_from(start), pos)
    }

    /// A preprocessing number: `0x1f`, `1.5e-3`, `10'000`, `42ull`.
    fn number(&mut self, start: usize, pos: Position) -> Token<'a> {
        self.advance();
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '.' => {
                    self.advance();
                    if matches!(c, 'e' | 'E' | 'p' | 'P') && matches!(self.peek(), Some('+' | '-')) {
                        self.advance();
                    }
                }
                Some('\'') if self.peek_ahead(1).is_some_and(|c| c.is_ascii_alphanumeric()) => {
                    self.advance();
                }
                _ => break,
            }
        }
        Token::new(TokenKind::Number, self.slice_from(start), pos)
    }

    fn identifier(&mut self, start: usize, pos: Position) -> Token<'a> {
        while self.peek().is_some_and(is_ident_continue) {
            self.advance();
        }

        let lexeme = self.slice_from(start);
        match self.peek() {
            Some('"') if RAW_PREFIXES.contains(&lexeme) => {
                return self.raw_string(start, pos);
            }
            Some('"') if LITERAL_PREFIXES.contains(&lexeme) => {
                return self.quoted(start, pos, TokenKind::StringLiteral);
            }
            Some('\'') if LITERAL_PREFIXES.contains(&lexeme) => {
                return self.quoted(start, pos, TokenKind::CharLiteral);
            }
            _ => {}
        }

        let kind = if self.after_member_op {
            TokenKind::Member
        } else {
            TokenKind::Identifier
        };
        Token::new(kind, lexeme, pos)
    }

    fn record(&mut self, token: &Token<'a>) {
        match token.kind {
            TokenKind::LineComment
            | TokenKind::BlockComment
            | TokenKind::DirectiveComment
            | TokenKind::LineContinuation => {}
            kind => {
                self.code_line = self.line;
                self.after_member_op =
                    kind == TokenKind::Other && matches!(token.lexeme, "." | "->");
            }
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(token) = self.pending.pop_front() {
            return Some(token);
        }

        loop {
            if self.at_continuation() {
                return Some(self.consume_continuation());
            }

            let ch = self.peek()?;
            if ch.is_whitespace() {
                self.advance();
                continue;
            }

            let token = self.lex_token(ch);
            self.record(&token);
            return Some(token);
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Tokenizes a whole source text eagerly.
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    Tokenizer::new(source).collect()
}
