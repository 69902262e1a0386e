//! Output formatting - plaintext and JSON.
//!
//! Plain output is one line per finding:
//!
//! ```text
//! main.c:12:18: Error: Variable 'i' can not be used.
//! main.c:12:18: note:     printf("%d", i);
//! main.c:12:18: note:                  ^
//! main.c:12:18: note: marked unused at 10:22
//! ```

use std::fmt::Write as _;
use std::path::Path;

use serde::Serialize;

use crate::builder::{AnalysisResult, FileFailure, FileReport};
use crate::diagnostic::Diagnostic;

/// Shape of the JSON document: the run's counts plus every finding.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub files_checked: usize,
    pub errors: usize,
    pub warnings: usize,
    pub files: &'a [FileReport],
    pub failures: &'a [FileFailure],
}

impl<'a> From<&'a AnalysisResult> for JsonReport<'a> {
    fn from(result: &'a AnalysisResult) -> Self {
        let (errors, warnings) = result.count_by_severity();
        Self {
            files_checked: result.files_checked,
            errors,
            warnings,
            files: &result.files,
            failures: &result.failures,
        }
    }
}

/// `<file>:<line>:<column>: <Severity>: <message>`
pub fn format_diagnostic(path: &Path, diagnostic: &Diagnostic) -> String {
    format!("{}:{}", path.display(), diagnostic)
}

/// Source line, caret and related-position notes for one finding.
pub fn format_notes(report: &FileReport, diagnostic: &Diagnostic) -> Vec<String> {
    let prefix = format!(
        "{}:{}:{}: note: ",
        report.path.display(),
        diagnostic.line,
        diagnostic.column
    );
    let mut notes = Vec::with_capacity(3);

    if let Some(line) = report.source_line(diagnostic.line) {
        // Tabs count as one column, so show them as one space.
        let shown = line.trim_end_matches('\r').replace('\t', " ");
        let caret = format!("{}^", " ".repeat(diagnostic.column.saturating_sub(1)));
        notes.push(format!("{prefix}{shown}"));
        notes.push(format!("{prefix}{caret}"));
    }
    if let Some(related) = diagnostic.related {
        notes.push(format!("{prefix}marked unused at {related}"));
    }
    notes
}

/// Renders every finding, optionally with notes.
pub fn render_plain(result: &AnalysisResult, notes: bool) -> String {
    let mut out = String::new();
    for report in &result.files {
        for diagnostic in &report.diagnostics {
            let _ = writeln!(out, "{}", format_diagnostic(&report.path, diagnostic));
            if notes {
                for note in format_notes(report, diagnostic) {
                    let _ = writeln!(out, "{note}");
                }
            }
        }
    }
    out
}

/// One-line summary for stderr.
pub fn summary(result: &AnalysisResult) -> String {
    let (errors, warnings) = result.count_by_severity();
    let mut line = format!(
        "{} error(s), {} warning(s) in {} file(s)",
        errors, warnings, result.files_checked
    );
    if !result.failures.is_empty() {
        let _ = write!(line, ", {} file(s) could not be read", result.failures.len());
    }
    line
}

/// Prints findings in plain text format.
pub fn print_plain(result: &AnalysisResult, notes: bool) {
    print!("{}", render_plain(result, notes));
    eprintln!("{}", summary(result));
}

/// Pretty JSON for a whole run.
pub fn render_json(result: &AnalysisResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport::from(result))
}

/// Prints the whole result in JSON format.
///
/// Falls back to a minimal object if serialization fails.
pub fn print_json(result: &AnalysisResult) {
    match render_json(result) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("[WARN] JSON serialization failed: {}", e);
            println!(
                "{{\"files_checked\": {}, \"diagnostic_count\": {}}}",
                result.files_checked,
                result.diagnostic_count()
            );
        }
    }
}
