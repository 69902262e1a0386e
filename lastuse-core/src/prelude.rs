//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use lastuse_core::prelude::*;
//! ```

// Core validation
pub use crate::diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use crate::validate::{validate_source, MemberAccess, ValidateOptions};

// Error types
pub use crate::error::{LastuseError, LastuseResult};

// Builder API
pub use crate::builder::{check_file, check_source, AnalysisResult, FileReport, Lastuse};

// Configuration
pub use crate::config::{load_config, LastuseConfig};
