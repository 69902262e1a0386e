//! lastuse CLI - checks `//!unused` directives in C-family sources.
//!
//! Features:
//! - Files and directories in one invocation
//! - Rayon-powered parallel validation
//! - lastuse.toml configuration, overridden by flags
//! - Plain output with source notes, or JSON

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use lastuse_core::{
    init_structured_logging, load_config, load_config_file, log_error, log_info, log_warn,
    print_json, print_plain, AnalysisResult, Lastuse, LastuseConfig, MemberAccess, OutputFormat,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Scope-aware checker for //!unused directives in C-family code")]
pub struct Cli {
    /// Files or directories to check
    #[arg(default_value = ".")]
    paths: Vec<String>,

    /// Output results in JSON format
    #[arg(long)]
    json: bool,

    /// Do not print source line and caret notes
    #[arg(long)]
    no_notes: bool,

    /// How identifiers after `.` or `->` are treated (check or ignore)
    #[arg(long, value_name = "POLICY")]
    member_access: Option<MemberAccess>,

    /// File extensions scanned in directories (replaces the defaults)
    #[arg(long = "ext", value_name = "EXT", num_args = 1..)]
    extensions: Vec<String>,

    /// Directory names to skip while scanning
    #[arg(long, value_name = "DIR", num_args = 1..)]
    exclude: Vec<String>,

    /// Configuration file (defaults to ./lastuse.toml when present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of worker threads
    #[arg(long, value_name = "N")]
    jobs: Option<usize>,
}

/// Exit status for a finished run: 2 when files could not be read,
/// 1 when there are findings, 0 otherwise.
fn exit_code(result: &AnalysisResult) -> i32 {
    if !result.failures.is_empty() {
        2
    } else if result.is_clean() {
        0
    } else {
        1
    }
}

fn resolve_config(cli: &Cli) -> Result<LastuseConfig> {
    if let Some(path) = &cli.config {
        return load_config_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()));
    }
    Ok(load_config(Path::new("."))?.unwrap_or_default())
}

fn build(cli: &Cli, config: &LastuseConfig) -> Lastuse {
    let mut lastuse = Lastuse::new(&cli.paths).with_config(config);
    if let Some(policy) = cli.member_access {
        lastuse = lastuse.member_access(policy);
    }
    if !cli.extensions.is_empty() {
        lastuse = lastuse.extensions(cli.extensions.iter().cloned());
    }
    lastuse.exclude_dirs(cli.exclude.iter().cloned())
}

fn run(cli: &Cli) -> Result<i32> {
    if let Some(jobs) = cli.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    let config = resolve_config(cli)?;
    let result = build(cli, &config).analyze()?;

    for failure in &result.failures {
        log_warn(&format!("{}: {}", failure.path.display(), failure.message));
    }

    let json = cli.json || config.format() == Some(OutputFormat::Json);
    if json {
        print_json(&result);
    } else {
        let notes = !cli.no_notes && config.notes().unwrap_or(true);
        print_plain(&result, notes);
    }

    log_info(&format!(
        "checked {} file(s), {} finding(s)",
        result.files_checked,
        result.diagnostic_count()
    ));
    Ok(exit_code(&result))
}

fn main() {
    // Global panic guard
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] lastuse internal error: {}", info);
        eprintln!("[PANIC] The process will exit with code 2.");
    }));

    // Initialize structured logging (JSON to stderr, respects RUST_LOG)
    init_structured_logging();

    let cli = Cli::parse();

    let code = match std::panic::catch_unwind(|| run(&cli)) {
        Ok(Ok(code)) => code,
        Ok(Err(e)) => {
            log_error(&format!("{:#}", e));
            eprintln!("error: {:#}", e);
            2
        }
        Err(_) => 2,
    };
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use lastuse_core::{check_source, ValidateOptions};
    use std::fs;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_temp_dir(name: &str) -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let temp_dir = std::env::temp_dir()
            .join("lastuse_cli_test")
            .join(format!("{}_{}_{}", name, std::process::id(), id));
        if temp_dir.exists() {
            fs::remove_dir_all(&temp_dir).ok();
        }
        fs::create_dir_all(&temp_dir).unwrap();
        temp_dir
    }

    fn result_for(source: &str) -> AnalysisResult {
        let report = check_source("main.c", source, ValidateOptions::default());
        AnalysisResult {
            files_checked: 1,
            files: if report.is_clean() { vec![] } else { vec![report] },
            failures: Vec::new(),
        }
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["lastuse"]).unwrap();
        assert_eq!(cli.paths, vec!["."]);
        assert!(!cli.json);
        assert!(cli.member_access.is_none());
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "lastuse",
            "src",
            "include/api.h",
            "--member-access",
            "ignore",
            "--ext",
            "c",
            "h",
            "--exclude",
            "vendor",
            "--no-notes",
            "--jobs",
            "2",
        ])
        .unwrap();
        assert_eq!(cli.paths, vec!["src", "include/api.h"]);
        assert_eq!(cli.member_access, Some(MemberAccess::Ignore));
        assert_eq!(cli.extensions, vec!["c", "h"]);
        assert_eq!(cli.exclude, vec!["vendor"]);
        assert!(cli.no_notes);
        assert_eq!(cli.jobs, Some(2));
    }

    #[test]
    fn test_parse_rejects_unknown_policy() {
        assert!(Cli::try_parse_from(["lastuse", "--member-access", "sometimes"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&result_for("int main() { return 0; }")), 0);
        assert_eq!(exit_code(&result_for("{ //!unused a\n a; }")), 1);

        let mut failed = result_for("int x;");
        failed.failures.push(lastuse_core::FileFailure {
            path: PathBuf::from("bad.c"),
            message: "not UTF-8".to_string(),
        });
        assert_eq!(exit_code(&failed), 2);
    }

    #[test]
    fn test_flags_override_config() {
        let config = lastuse_core::parse_config("[analysis]\nmember_access = \"ignore\"\n").unwrap();
        let cli = Cli::try_parse_from(["lastuse", "--member-access", "check"]).unwrap();
        assert_eq!(build(&cli, &config).options().member_access, MemberAccess::Check);

        let cli = Cli::try_parse_from(["lastuse"]).unwrap();
        assert_eq!(build(&cli, &config).options().member_access, MemberAccess::Ignore);
    }

    #[test]
    fn test_explicit_config_file() {
        let dir = create_temp_dir("config");
        let path = dir.join("custom.toml");
        fs::write(&path, "[output]\nformat = \"json\"\nnotes = false\n").unwrap();

        let cli = Cli::try_parse_from(["lastuse", "--config", path.to_str().unwrap()]).unwrap();
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.format(), Some(OutputFormat::Json));
        assert_eq!(config.notes(), Some(false));
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let dir = create_temp_dir("missing");
        let path = dir.join("absent.toml");
        let cli = Cli::try_parse_from(["lastuse", "--config", path.to_str().unwrap()]).unwrap();
        assert!(resolve_config(&cli).is_err());
    }
}
