//! Builder pattern API for running the validator over files and directories.
//!
//! ```rust,ignore
//! use lastuse_core::prelude::*;
//!
//! let result = Lastuse::new(["src", "include/api.h"])
//!     .member_access(MemberAccess::Ignore)
//!     .exclude_dirs(["third_party"])
//!     .analyze()?;
//!
//! for (path, diagnostic) in result.diagnostics() {
//!     println!("{}:{}", path.display(), diagnostic);
//! }
//! ```
//!
//! Each file gets its own tokenizer, scope tracker and validator, so files are
//! checked in parallel with Rayon. Results keep input order, and each file's
//! diagnostics keep source order.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::LastuseConfig;
use crate::diagnostic::{Diagnostic, Severity};
use crate::error::{IoResultExt, LastuseError, LastuseResult};
use crate::scan::{collect_inputs, DEFAULT_EXTENSIONS};
use crate::validate::{validate_source, MemberAccess, ValidateOptions};

/// Diagnostics for one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
    /// Source text, kept only when there is something to point at.
    #[serde(skip)]
    pub source: Option<String>,
}

impl FileReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Text of a 1-based line, if the source was kept.
    pub fn source_line(&self, line: usize) -> Option<&str> {
        let source = self.source.as_deref()?;
        source.lines().nth(line.checked_sub(1)?)
    }
}

/// A file that could not be checked.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Validates one in-memory source text.
pub fn check_source(path: impl Into<PathBuf>, source: &str, options: ValidateOptions) -> FileReport {
    let diagnostics = validate_source(source, options);
    let source = (!diagnostics.is_empty()).then(|| source.to_string());
    FileReport {
        path: path.into(),
        diagnostics,
        source,
    }
}

/// Reads and validates one file.
pub fn check_file(path: &Path, options: ValidateOptions) -> LastuseResult<FileReport> {
    let bytes = fs::read(path).with_path(path)?;
    let source = String::from_utf8(bytes).map_err(|_| LastuseError::encoding(path))?;
    let report = check_source(path, &source, options);
    debug!(
        file = %path.display(),
        diagnostics = report.diagnostics.len(),
        "file checked"
    );
    Ok(report)
}

/// Builder for configuring a validation run.
#[derive(Debug, Clone)]
pub struct Lastuse {
    /// Files and directories to check
    inputs: Vec<PathBuf>,

    /// Validator options
    options: ValidateOptions,

    /// Extensions picked up when walking directories
    extensions: Vec<String>,

    /// Custom excluded directories
    excluded_dirs: Vec<String>,
}

impl Lastuse {
    /// Create a new run over the given files and directories.
    pub fn new(inputs: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            options: ValidateOptions::default(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            excluded_dirs: Vec::new(),
        }
    }

    /// Apply every value set in a configuration file.
    pub fn with_config(mut self, config: &LastuseConfig) -> Self {
        if let Some(policy) = config.member_access() {
            self.options.member_access = policy;
        }
        if let Some(exts) = config.extensions() {
            self.extensions = exts.to_vec();
        }
        self.excluded_dirs.extend(config.exclude().iter().cloned());
        self
    }

    /// Set the policy for identifiers after `.` or `->`.
    pub fn member_access(mut self, policy: MemberAccess) -> Self {
        self.options.member_access = policy;
        self
    }

    /// Replace the extensions scanned in directories.
    pub fn extensions(mut self, exts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extensions = exts.into_iter().map(Into::into).collect();
        self
    }

    /// Add directories to exclude from scanning.
    pub fn exclude_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.excluded_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    pub fn options(&self) -> ValidateOptions {
        self.options
    }

    /// Run the analysis and return results.
    ///
    /// Unreadable or non-UTF-8 files are recorded in
    /// [`AnalysisResult::failures`] and do not stop the other files.
    pub fn analyze(&self) -> Result<AnalysisResult> {
        if self.inputs.is_empty() {
            return Err(LastuseError::invalid_argument("no input paths given").into());
        }

        // 1. Expand inputs
        let files = collect_inputs(&self.inputs, &self.extensions, &self.excluded_dirs)
            .context("Failed to collect input files")?;
        info!(files = files.len(), member_access = %self.options.member_access, "checking files");

        // 2. Validate in parallel (collect keeps input order)
        let outcomes: Vec<LastuseResult<FileReport>> = files
            .par_iter()
            .map(|path| check_file(path, self.options))
            .collect();

        // 3. Merge
        let mut result = AnalysisResult::default();
        for outcome in outcomes {
            match outcome {
                Ok(report) => {
                    result.files_checked += 1;
                    if !report.is_clean() {
                        result.files.push(report);
                    }
                }
                Err(e) if e.is_recoverable() => {
                    warn!(error = %e, "file skipped");
                    result.failures.push(FileFailure {
                        path: e.path().cloned().unwrap_or_default(),
                        message: e.to_string(),
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!(
            files_checked = result.files_checked,
            diagnostics = result.diagnostic_count(),
            failures = result.failures.len(),
            "analysis complete"
        );
        Ok(result)
    }
}

/// Result of a validation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisResult {
    /// Number of files that were read and validated
    pub files_checked: usize,

    /// Files with at least one diagnostic, in input order
    pub files: Vec<FileReport>,

    /// Files that could not be checked
    pub failures: Vec<FileFailure>,
}

impl AnalysisResult {
    /// All diagnostics with their file, files in input order and each
    /// file's diagnostics in source order.
    pub fn diagnostics(&self) -> impl Iterator<Item = (&Path, &Diagnostic)> {
        self.files
            .iter()
            .flat_map(|f| f.diagnostics.iter().map(move |d| (f.path.as_path(), d)))
    }

    pub fn diagnostic_count(&self) -> usize {
        self.files.iter().map(|f| f.diagnostics.len()).sum()
    }

    /// (errors, warnings)
    pub fn count_by_severity(&self) -> (usize, usize) {
        self.diagnostics()
            .fold((0, 0), |(errors, warnings), (_, d)| match d.severity {
                Severity::Error => (errors + 1, warnings),
                Severity::Warning => (errors, warnings + 1),
            })
    }

    /// No diagnostics at all.
    pub fn is_clean(&self) -> bool {
        self.files.is_empty()
    }
}
