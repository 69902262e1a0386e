//! Usage validation: one forward pass over the token stream.
//!
//! Braces open and close scopes, directive comments ban identifiers in the
//! current scope, and every later reference to a visible ban is reported.
//! Nothing here stops the pass early; every finding becomes a [`Diagnostic`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diagnostic::{Diagnostic, Reporter};
use crate::directive::parse_directive;
use crate::lexer::{Position, Token, TokenKind, Tokenizer};
use crate::scope::ScopeTracker;

/// How identifiers after `.` or `->` are treated.
///
/// Textually `obj.x` contains `x`, and without type information there is no
/// way to tell a field from the banned variable. The default keeps the
/// conservative textual behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberAccess {
    /// Member names are checked like any other reference.
    #[default]
    Check,
    /// Member names are never reported.
    Ignore,
}

impl fmt::Display for MemberAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Check => write!(f, "check"),
            Self::Ignore => write!(f, "ignore"),
        }
    }
}

impl FromStr for MemberAccess {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "check" => Ok(Self::Check),
            "ignore" => Ok(Self::Ignore),
            other => Err(format!(
                "unknown member access policy '{other}' (expected 'check' or 'ignore')"
            )),
        }
    }
}

/// Knobs for a validation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    pub member_access: MemberAccess,
}

/// State of one validation run. Feed tokens in source order, then
/// [`finish`](Self::finish).
#[derive(Debug)]
pub struct Validator {
    tracker: ScopeTracker,
    reporter: Reporter,
    options: ValidateOptions,
}

impl Validator {
    pub fn new(options: ValidateOptions) -> Self {
        Self {
            tracker: ScopeTracker::new(),
            reporter: Reporter::new(),
            options,
        }
    }

    pub fn feed(&mut self, token: &Token<'_>) {
        let pos = token.position();
        match token.kind {
            TokenKind::OpenBrace => {
                self.tracker.push(pos);
            }
            TokenKind::CloseBrace => {
                if let Err(err) = self.tracker.pop(pos) {
                    self.reporter.report(Diagnostic::structural(&err));
                }
            }
            TokenKind::DirectiveComment => self.apply_directive(token),
            TokenKind::Identifier => self.check_reference(token),
            TokenKind::Member => match self.options.member_access {
                MemberAccess::Check => self.check_reference(token),
                MemberAccess::Ignore => {}
            },
            TokenKind::LineContinuation => {
                self.reporter.report(Diagnostic::line_continuation(pos));
            }
            TokenKind::StringLiteral
            | TokenKind::CharLiteral
            | TokenKind::Number
            | TokenKind::Preprocessor
            | TokenKind::LineComment
            | TokenKind::BlockComment
            | TokenKind::Other => {}
        }
    }

    fn apply_directive(&mut self, token: &Token<'_>) {
        match parse_directive(token) {
            Ok(mut directive) => {
                let scope = self.tracker.current();
                directive.owning_scope = Some(scope);
                let fresh = self.tracker.ban(&directive.target, directive.position());
                debug!(
                    kind = %directive.kind,
                    target = %directive.target,
                    scope = %scope,
                    fresh,
                    "directive applied"
                );
            }
            Err(err) => {
                self.reporter
                    .report(Diagnostic::malformed_directive(&err, token.position()));
            }
        }
    }

    fn check_reference(&mut self, token: &Token<'_>) {
        if let Some(banned_at) = self.tracker.banned_at(token.lexeme) {
            self.reporter.report(Diagnostic::usage_after_unused(
                token.lexeme,
                token.position(),
                banned_at,
            ));
        }
    }

    /// Current brace depth.
    pub fn depth(&self) -> usize {
        self.tracker.depth()
    }

    /// Diagnostics collected so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.reporter.diagnostics()
    }

    /// Closes the run. Unclosed scopes are reported last, at `eof`.
    pub fn finish(mut self, eof: Position) -> Vec<Diagnostic> {
        if let Some(err) = self.tracker.finish(eof) {
            self.reporter.report(Diagnostic::structural(&err));
        }
        self.reporter.into_diagnostics()
    }
}

/// Validates an already tokenized stream.
pub fn validate_tokens<'a, I>(tokens: I, eof: Position, options: ValidateOptions) -> Vec<Diagnostic>
where
    I: IntoIterator<Item = Token<'a>>,
{
    let mut validator = Validator::new(options);
    for token in tokens {
        validator.feed(&token);
    }
    validator.finish(eof)
}

/// Tokenizes and validates one source text.
pub fn validate_source(source: &str, options: ValidateOptions) -> Vec<Diagnostic> {
    let mut tokenizer = Tokenizer::new(source);
    let mut validator = Validator::new(options);
    for token in tokenizer.by_ref() {
        validator.feed(&token);
    }
    validator.finish(tokenizer.current_position())
}
