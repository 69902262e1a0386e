//! Directive grammar for `//!` comments.
//!
//! Only `unused` exists today. A directive kind is a keyword plus a grammar
//! branch in [`parse_directive`]; the scope tracker and validator only ever see
//! the resulting [`Directive`], so adding kinds does not touch them.
//!
//! ```text
//! //!unused <identifier>
//! ```
//!
//! The keyword must be followed by spaces or tabs, exactly one identifier
//! (`[A-Za-z_][A-Za-z0-9_]*`) and nothing but optional trailing whitespace.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::lexer::{Position, Token};
use crate::scope::ScopeId;

/// Marker that opens every directive comment.
pub const DIRECTIVE_PREFIX: &str = "//!";

/// Known directive keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectiveKind {
    /// `//!unused x`: `x` must not be referenced again in the enclosing scope.
    Unused,
}

impl DirectiveKind {
    pub const ALL: &'static [DirectiveKind] = &[DirectiveKind::Unused];

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Unused => "unused",
        }
    }

    /// Finds the directive whose keyword opens `body` (the text after `//!`).
    ///
    /// This is a prefix match so that `//!unusedx` is still treated as an
    /// attempted directive and reported as malformed.
    pub fn detect(body: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| body.starts_with(kind.keyword()))
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A successfully parsed directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub target: String,
    pub line: usize,
    pub column: usize,
    /// Scope the ban was folded into; set by the validator.
    pub owning_scope: Option<ScopeId>,
}

impl Directive {
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

/// Why a directive comment was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveError {
    #[error("not a directive comment")]
    NotADirective,

    #[error("expected whitespace after '//!{keyword}'")]
    MissingWhitespace { keyword: &'static str },

    #[error("expected an identifier after '//!{keyword}'")]
    MissingIdentifier { keyword: &'static str },

    #[error("'{found}' is not a valid identifier")]
    InvalidIdentifier { found: String },

    #[error("unexpected '{found}' after '{target}', exactly one identifier is allowed")]
    TrailingContent { target: String, found: String },
}

/// Whitespace-separated single identifier argument.
fn single_identifier_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    // SAFETY: This regex pattern is hardcoded and covered by the tests below.
    REGEX.get_or_init(|| {
        Regex::new(r"^[ \t]+([A-Za-z_][A-Za-z0-9_]*)[ \t\r]*$")
            .expect("Hardcoded regex pattern is valid")
    })
}

/// Parses a directive comment token.
///
/// Never registers anything itself: on error the caller reports the comment
/// as malformed and drops it.
pub fn parse_directive(token: &Token<'_>) -> Result<Directive, DirectiveError> {
    let body = token
        .lexeme
        .strip_prefix(DIRECTIVE_PREFIX)
        .ok_or(DirectiveError::NotADirective)?;
    let kind = DirectiveKind::detect(body).ok_or(DirectiveError::NotADirective)?;
    let args = &body[kind.keyword().len()..];

    let target = match kind {
        DirectiveKind::Unused => single_identifier(kind.keyword(), args)?,
    };

    Ok(Directive {
        kind,
        target,
        line: token.line,
        column: token.column,
        owning_scope: None,
    })
}

fn single_identifier(keyword: &'static str, args: &str) -> Result<String, DirectiveError> {
    if let Some(caps) = single_identifier_regex().captures(args) {
        return Ok(caps[1].to_string());
    }

    // Slow path: work out what is wrong for the diagnostic.
    let is_blank = |c: char| matches!(c, ' ' | '\t' | '\r');
    let trimmed = args.trim_end_matches(is_blank);
    if trimmed.is_empty() {
        return Err(DirectiveError::MissingIdentifier { keyword });
    }

    let rest = trimmed.trim_start_matches(is_blank);
    if rest.len() == trimmed.len() {
        return Err(DirectiveError::MissingWhitespace { keyword });
    }

    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    let (word, tail) = rest.split_at(end);

    if word.is_empty() || word.starts_with(|c: char| c.is_ascii_digit()) {
        let found = rest.split(is_blank).next().unwrap_or(rest);
        return Err(DirectiveError::InvalidIdentifier {
            found: found.to_string(),
        });
    }

    Err(DirectiveError::TrailingContent {
        target: word.to_string(),
        found: tail.trim_start_matches(is_blank).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::TokenKind;

    fn directive(text: &str) -> Token<'_> {
        Token::new(TokenKind::DirectiveComment, text, Position::new(3, 5))
    }

    #[test]
    fn test_well_formed() {
        let d = parse_directive(&directive("//!unused counter")).unwrap();
        assert_eq!(d.kind, DirectiveKind::Unused);
        assert_eq!(d.target, "counter");
        assert_eq!(d.position(), Position::new(3, 5));
        assert_eq!(d.owning_scope, None);
    }

    #[test]
    fn test_tabs_and_trailing_whitespace() {
        let d = parse_directive(&directive("//!unused\t_tmp1  \t\r")).unwrap();
        assert_eq!(d.target, "_tmp1");
    }

    #[test]
    fn test_missing_identifier() {
        assert_eq!(
            parse_directive(&directive("//!unused")),
            Err(DirectiveError::MissingIdentifier { keyword: "unused" })
        );
        assert_eq!(
            parse_directive(&directive("//!unused   ")),
            Err(DirectiveError::MissingIdentifier { keyword: "unused" })
        );
    }

    #[test]
    fn test_missing_whitespace() {
        assert_eq!(
            parse_directive(&directive("//!unusedx")),
            Err(DirectiveError::MissingWhitespace { keyword: "unused" })
        );
    }

    #[test]
    fn test_invalid_identifier() {
        assert_eq!(
            parse_directive(&directive("//!unused 9lives")),
            Err(DirectiveError::InvalidIdentifier {
                found: "9lives".to_string()
            })
        );
        assert_eq!(
            parse_directive(&directive("//!unused *p")),
            Err(DirectiveError::InvalidIdentifier {
                found: "*p".to_string()
            })
        );
    }

    #[test]
    fn test_non_ascii_identifier_rejected() {
        assert!(matches!(
            parse_directive(&directive("//!unused café")),
            Err(DirectiveError::TrailingContent { .. })
        ));
        assert!(matches!(
            parse_directive(&directive("//!unused é")),
            Err(DirectiveError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_trailing_content() {
        assert_eq!(
            parse_directive(&directive("//!unused a, b")),
            Err(DirectiveError::TrailingContent {
                target: "a".to_string(),
                found: ", b".to_string()
            })
        );
        assert!(matches!(
            parse_directive(&directive("//!unused a b")),
            Err(DirectiveError::TrailingContent { .. })
        ));
    }

    #[test]
    fn test_not_a_directive() {
        let plain = Token::new(TokenKind::LineComment, "// unused x", Position::START);
        assert_eq!(parse_directive(&plain), Err(DirectiveError::NotADirective));
    }

    #[test]
    fn test_error_messages() {
        let err = DirectiveError::MissingIdentifier { keyword: "unused" };
        assert_eq!(err.to_string(), "expected an identifier after '//!unused'");
    }

    #[test]
    fn test_detect() {
        assert_eq!(DirectiveKind::detect("unused x"), Some(DirectiveKind::Unused));
        assert_eq!(DirectiveKind::detect("used x"), None);
    }
}
