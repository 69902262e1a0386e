//! lastuse-core: scope-aware validation of `//!unused` directives in C-family code.
//!
//! A directive comment `//!unused x` asserts that `x` is not referenced again
//! in the enclosing brace scope. This library finds the references that break
//! that promise, without a compiler front end.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lastuse_core::prelude::*;
//!
//! let diagnostics = validate_source(source, ValidateOptions::default());
//! for d in &diagnostics {
//!     println!("main.c:{}", d);
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`lexer`]: Single-pass tokenizer aware of literals and comments
//! - [`directive`]: `//!` directive grammar
//! - [`scope`]: Brace scope stack holding banned identifiers
//! - [`validate`]: The forward pass tying tokens, directives and scopes together
//! - [`diagnostic`]: Findings and the ordered reporter
//! - [`scan`]: Parallel source file discovery
//! - [`builder`]: Fluent API for checking files and directories
//! - [`report`]: Plain and JSON output
//! - [`config`]: lastuse.toml loading
//! - [`error`]: Typed error handling

pub mod builder;
pub mod config;
pub mod diagnostic;
pub mod directive;
pub mod error;
pub mod lexer;
pub mod logging;
pub mod prelude;
pub mod report;
pub mod scan;
pub mod scope;
pub mod validate;

// Error types
pub use error::{IoResultExt, LastuseError, LastuseResult};

// Builder API
pub use builder::{check_file, check_source, AnalysisResult, FileFailure, FileReport, Lastuse};

// Configuration
pub use config::{
    load_config, load_config_file, parse_config, AnalysisConfig, LastuseConfig, OutputConfig,
    OutputFormat, CONFIG_FILE,
};

// Core engine
pub use diagnostic::{Diagnostic, DiagnosticKind, Reporter, Severity};
pub use directive::{parse_directive, Directive, DirectiveError, DirectiveKind};
pub use lexer::{tokenize, Position, Token, TokenKind, Tokenizer};
pub use scope::{Scope, ScopeId, ScopeTracker, StructuralError};
pub use validate::{validate_source, validate_tokens, MemberAccess, ValidateOptions, Validator};

// Logging
pub use logging::{init_structured_logging, log_error, log_info, log_warn};

// Reporting
pub use report::{
    format_diagnostic, format_notes, print_json, print_plain, render_json, render_plain, summary,
    JsonReport,
};

// File scanning
pub use scan::{collect_inputs, gather_source_files, has_source_extension, DEFAULT_EXTENSIONS};

#[cfg(test)]
mod tests;
