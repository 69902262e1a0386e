//! Brace-scope tracking for bans.
//!
//! Tracks which identifiers are banned in each open scope. A root scope for
//! file level sits at the bottom of the stack and is never popped.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use crate::lexer::Position;

/// Identifier of a scope within one validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub const ROOT: ScopeId = ScopeId(0);
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One open scope.
#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub parent: Option<ScopeId>,
    /// Position of the opening brace; [`Position::START`] for the root.
    pub opened_at: Position,
    /// Banned names and where each ban was issued.
    banned: HashMap<String, Position>,
}

impl Scope {
    fn new(id: ScopeId, parent: Option<ScopeId>, opened_at: Position) -> Self {
        Self {
            id,
            parent,
            opened_at,
            banned: HashMap::new(),
        }
    }

    pub fn banned_count(&self) -> usize {
        self.banned.len()
    }
}

/// Brace nesting problems.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("unmatched '}}' has no open scope to close")]
    UnmatchedClose { at: Position },

    #[error("{}", unclosed_message(.count, .opened_at))]
    UnclosedScopes {
        /// Number of scopes still open.
        count: usize,
        /// Outermost unclosed opening brace.
        opened_at: Position,
        /// End of input.
        at: Position,
    },
}

fn unclosed_message(count: &usize, opened_at: &Position) -> String {
    if *count == 1 {
        format!("scope opened at {opened_at} is never closed")
    } else {
        format!("{count} scopes are never closed, the outermost was opened at {opened_at}")
    }
}

impl StructuralError {
    /// Where the problem is reported.
    pub fn position(&self) -> Position {
        match self {
            Self::UnmatchedClose { at } | Self::UnclosedScopes { at, .. } => *at,
        }
    }
}

/// Stack of open scopes, owned by a single validation run.
#[derive(Debug)]
pub struct ScopeTracker {
    frames: Vec<Scope>,
    next_id: u32,
}

impl Default for ScopeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTracker {
    /// Create a tracker holding only the file-level root scope.
    pub fn new() -> Self {
        Self {
            frames: vec![Scope::new(ScopeId::ROOT, None, Position::START)],
            next_id: 1,
        }
    }

    /// Open a scope nested in the current one.
    pub fn push(&mut self, open: Position) -> ScopeId {
        let id = ScopeId(self.next_id);
        self.next_id += 1;
        let parent = Some(self.current());
        self.frames.push(Scope::new(id, parent, open));
        trace!(scope = %id, at = %open, depth = self.depth(), "scope opened");
        id
    }

    /// Close the innermost scope, discarding its bans.
    pub fn pop(&mut self, close: Position) -> Result<Scope, StructuralError> {
        if self.frames.len() <= 1 {
            return Err(StructuralError::UnmatchedClose { at: close });
        }
        let scope = self
            .frames
            .pop()
            .ok_or(StructuralError::UnmatchedClose { at: close })?;
        trace!(scope = %scope.id, at = %close, bans = scope.banned_count(), "scope closed");
        Ok(scope)
    }

    /// Ban `name` in the current scope. Returns `false` if it was already
    /// banned there, in which case the first ban position is kept.
    pub fn ban(&mut self, name: &str, at: Position) -> bool {
        let Some(top) = self.frames.last_mut() else {
            return false;
        };
        if top.banned.contains_key(name) {
            return false;
        }
        top.banned.insert(name.to_string(), at);
        trace!(scope = %top.id, name, at = %at, "identifier banned");
        true
    }

    /// Check if `name` is banned in any open scope.
    pub fn is_banned(&self, name: &str) -> bool {
        self.banned_at(name).is_some()
    }

    /// Position of the innermost visible ban on `name`.
    pub fn banned_at(&self, name: &str) -> Option<Position> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.banned.get(name).copied())
    }

    /// Number of open brace scopes; the root does not count.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn current(&self) -> ScopeId {
        self.frames.last().map_or(ScopeId::ROOT, |s| s.id)
    }

    /// Brace scopes still open, outermost first.
    pub fn unclosed(&self) -> &[Scope] {
        &self.frames[1..]
    }

    /// Structural error for whatever is still open at end of input.
    pub fn finish(&self, eof: Position) -> Option<StructuralError> {
        let outermost = self.unclosed().first()?;
        Some(StructuralError::UnclosedScopes {
            count: self.depth(),
            opened_at: outermost.opened_at,
            at: eof,
        })
    }
}
