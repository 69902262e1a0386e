//! Findings produced by validation, and the accumulator that collects them.

use std::fmt;

use serde::Serialize;

use crate::directive::DirectiveError;
use crate::lexer::Position;
use crate::scope::StructuralError;

/// Category of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// A banned identifier was referenced.
    UsageAfterUnused,
    /// A directive comment failed its grammar and was discarded.
    MalformedDirective,
    /// Unmatched brace nesting.
    StructuralError,
    /// A recognized construct the validator does not handle.
    UnsupportedConstruct,
}

impl DiagnosticKind {
    /// Stable identifier used in JSON output and LSP codes.
    pub fn code(self) -> &'static str {
        match self {
            Self::UsageAfterUnused => "usage-after-unused",
            Self::MalformedDirective => "malformed-directive",
            Self::StructuralError => "structural-error",
            Self::UnsupportedConstruct => "unsupported-construct",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::UnsupportedConstruct => Severity::Warning,
            Self::UsageAfterUnused | Self::MalformedDirective | Self::StructuralError => {
                Severity::Error
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "Warning"),
            Self::Error => write!(f, "Error"),
        }
    }
}

/// A single finding. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub line: usize,
    pub column: usize,
    /// For [`DiagnosticKind::UsageAfterUnused`]: the directive that issued the ban.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<Position>,
}

impl Diagnostic {
    fn new(kind: DiagnosticKind, message: String, at: Position) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            message,
            line: at.line,
            column: at.column,
            related: None,
        }
    }

    pub fn usage_after_unused(name: &str, at: Position, banned_at: Position) -> Self {
        Self {
            related: Some(banned_at),
            ..Self::new(
                DiagnosticKind::UsageAfterUnused,
                format!("Variable '{name}' can not be used."),
                at,
            )
        }
    }

    pub fn malformed_directive(err: &DirectiveError, at: Position) -> Self {
        Self::new(
            DiagnosticKind::MalformedDirective,
            format!("Malformed directive: {err}."),
            at,
        )
    }

    pub fn structural(err: &StructuralError) -> Self {
        Self::new(
            DiagnosticKind::StructuralError,
            format!("Structural error: {err}."),
            err.position(),
        )
    }

    pub fn line_continuation(at: Position) -> Self {
        Self::new(
            DiagnosticKind::UnsupportedConstruct,
            "Unsupported construct: line continuation ('\\' before end of line) is not joined."
                .to_string(),
            at,
        )
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}",
            self.line, self.column, self.severity, self.message
        )
    }
}

/// Append-only collector; preserves detection order.
#[derive(Debug, Default)]
pub struct Reporter {
    diagnostics: Vec<Diagnostic>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
