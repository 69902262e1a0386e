//! End-to-end test suite for lastuse-core.

use crate::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn write_file(file: &Path, content: impl AsRef<[u8]>) {
    fs::create_dir_all(file.parent().unwrap()).unwrap();
    fs::write(file, content).unwrap();
}

fn setup_temp_project() -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir()
        .join("lastuse_tests")
        .join(format!("{}_{}", timestamp, id));

    if dir.exists() {
        fs::remove_dir_all(&dir).ok();
    }
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn check(source: &str) -> Vec<Diagnostic> {
    validate_source(source, ValidateOptions::default())
}

fn of_kind(diags: &[Diagnostic], kind: DiagnosticKind) -> Vec<(usize, usize)> {
    diags
        .iter()
        .filter(|d| d.kind == kind)
        .map(|d| (d.line, d.column))
        .collect()
}

// Scenario A: basic ban
#[test]
fn test_basic_ban() {
    let source = "\
{ int i; for (i=0;i<10;i++) {} //!unused i
  printf(\"%d\", i); }
printf(\"%d\", i);
";
    let diags = check(source);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind, DiagnosticKind::UsageAfterUnused);
    assert_eq!(diags[0].position(), Position::new(2, 16));
    assert_eq!(diags[0].message, "Variable 'i' can not be used.");
}

// Scenario B: malformed directive
#[test]
fn test_malformed_directive_then_scanning_continues() {
    let source = "//!unused\n{ int x; //!unused x\n x; }";
    let diags = check(source);
    assert_eq!(of_kind(&diags, DiagnosticKind::MalformedDirective), vec![(1, 1)]);
    assert_eq!(of_kind(&diags, DiagnosticKind::UsageAfterUnused), vec![(3, 2)]);
    assert_eq!(diags.len(), 2);
}

// Scenario C: nested inheritance
#[test]
fn test_ban_visible_in_nested_scope() {
    let source = "{ //!unused v\n  if (1) {\n    v++;\n  }\n}";
    let diags = check(source);
    assert_eq!(of_kind(&diags, DiagnosticKind::UsageAfterUnused), vec![(3, 5)]);
    assert_eq!(diags.len(), 1);
}

// Scenario D: unmatched open brace
#[test]
fn test_unmatched_open_keeps_prior_findings() {
    let source = "void f() {\n  int a; //!unused a\n  a = 2;\n";
    let diags = check(source);
    assert_eq!(diags.len(), 2);
    assert_eq!(diags[0].kind, DiagnosticKind::UsageAfterUnused);
    assert_eq!(diags[1].kind, DiagnosticKind::StructuralError);
    assert_eq!(diags[1].position(), Position::new(4, 1));
    assert!(diags[1].message.contains("opened at 1:10"));
}

// Scenario E: literal safety
#[test]
fn test_directive_text_in_string_is_inert() {
    let source = "{ int i; puts(\"//!unused i\"); i++; }";
    assert!(check(source).is_empty());
}

#[test]
fn test_directive_text_in_char_and_block_comment_is_inert() {
    let source = "{ int i; /* //!unused i */ char c = '{'; i++; }";
    assert!(check(source).is_empty());
}

#[test]
fn test_brace_inside_raw_string_keeps_scope_open() {
    let source = "{ //!unused x\n  auto s = R\"(\n}\n)\";\n  x;\n}\n";
    let diags = check(source);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].kind, DiagnosticKind::UsageAfterUnused);
    assert_eq!(diags[0].position(), Position::new(5, 3));
}

#[test]
fn test_quote_inside_raw_string_is_inert() {
    let source = "{ //!unused b\n  auto s = R\"(a \" b)\";\n}\n";
    assert!(check(source).is_empty());
}

// Visibility: before the ban, inside, nested, after close and sibling scopes
#[test]
fn test_ban_visibility_boundaries() {
    let source = "\
x;
{
  x;
  { //!unused x
    x;
    { x; }
  }
  x;
  { x; }
}
x;
";
    let diags = check(source);
    assert_eq!(
        of_kind(&diags, DiagnosticKind::UsageAfterUnused),
        vec![(5, 5), (6, 7)]
    );
    assert_eq!(diags.len(), 2);
}

#[test]
fn test_every_reference_is_reported() {
    let source = "{ //!unused n\n n; n; f(n, n); }";
    assert_eq!(check(source).len(), 4);
}

#[test]
fn test_determinism() {
    let source = "{ //!unused a\n a; } } { //!unused\n b; {";
    assert_eq!(check(source), check(source));
}

#[test]
fn test_repeated_directive_is_idempotent() {
    let once = check("{ int x; //!unused x\n x; }");
    let twice = check("{ int x; //!unused x\n//!unused x\n x; }");
    assert_eq!(once.len(), 1);
    assert_eq!(twice.len(), 1);
    assert_eq!(once[0].related, twice[0].related);
    assert_eq!(once[0].kind, twice[0].kind);
}

#[test]
fn test_nested_bans_for_same_name_stack() {
    let source = "\
{ //!unused x
  { //!unused x
    x;
  }
  x;
}";
    let diags = check(source);
    assert_eq!(diags.len(), 2);
    assert_eq!(diags[0].related, Some(Position::new(2, 5)));
    assert_eq!(diags[1].related, Some(Position::new(1, 3)));
}

#[test]
fn test_ban_can_be_reissued_after_scope_closes() {
    let source = "{ //!unused t\n}\n{ t; //!unused t\n t; }";
    assert_eq!(
        of_kind(&check(source), DiagnosticKind::UsageAfterUnused),
        vec![(4, 2)]
    );
}

#[test]
fn test_unmatched_close_does_not_stop_scan() {
    let source = "}\n}\n//!unused z\nz;";
    let diags = check(source);
    assert_eq!(
        of_kind(&diags, DiagnosticKind::StructuralError),
        vec![(1, 1), (2, 1)]
    );
    assert_eq!(of_kind(&diags, DiagnosticKind::UsageAfterUnused), vec![(4, 1)]);
}

#[test]
fn test_only_one_structural_error_at_eof() {
    let diags = check("{ { {\n");
    assert_eq!(diags.len(), 1);
    assert!(diags[0].message.contains("3 scopes are never closed"));
}

#[test]
fn test_preprocessor_lines_are_not_references() {
    let source = "{ //!unused n\n#define TWICE(n) ((n) * 2)\n}";
    assert!(check(source).is_empty());
}

#[test]
fn test_macro_braces_do_not_open_scopes() {
    let source = "#define BEGIN {\n#define END }\nint main() { return 0; }";
    assert!(check(source).is_empty());
}

#[test]
fn test_numbers_are_not_references() {
    let source = "{ //!unused x1f\n int v = 0x1f; }";
    assert!(check(source).is_empty());
}

#[test]
fn test_member_access_is_configurable() {
    let source = "struct P { int y; };\n{ int y = 0; //!unused y\n p.y = 1; q->y = 2; }";
    let checked = check(source);
    assert_eq!(
        of_kind(&checked, DiagnosticKind::UsageAfterUnused),
        vec![(3, 4), (3, 14)]
    );

    let ignored = validate_source(
        source,
        ValidateOptions {
            member_access: MemberAccess::Ignore,
        },
    );
    assert!(ignored.is_empty());
}

#[test]
fn test_directive_with_continuation_is_malformed() {
    let source = "{ //!unused a \\\n b\n a; }";
    let diags = check(source);
    assert_eq!(diags[0].kind, DiagnosticKind::MalformedDirective);
    assert_eq!(diags[1].kind, DiagnosticKind::UnsupportedConstruct);
    assert!(of_kind(&diags, DiagnosticKind::UsageAfterUnused).is_empty());
}

#[test]
fn test_crlf_source() {
    let source = "{\r\n  int i; //!unused i\r\n  i;\r\n}\r\n";
    assert_eq!(
        of_kind(&check(source), DiagnosticKind::UsageAfterUnused),
        vec![(3, 3)]
    );
}

#[test]
fn test_empty_source() {
    assert!(check("").is_empty());
}

// --- Builder / file level ---

#[test]
fn test_check_file_reads_and_validates() {
    let root = setup_temp_project();
    let file = root.join("main.c");
    write_file(&file, "{ //!unused k\n k; }");
    let report = check_file(&file, ValidateOptions::default()).unwrap();
    assert_eq!(report.path, file);
    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.source_line(2), Some(" k; }"));
}

#[test]
fn test_check_file_missing() {
    let root = setup_temp_project();
    let err = check_file(&root.join("nope.c"), ValidateOptions::default()).unwrap_err();
    assert!(matches!(err, LastuseError::Io { .. }));
}

#[test]
fn test_clean_report_drops_source() {
    let report = check_source("ok.c", "int main() { return 0; }", ValidateOptions::default());
    assert!(report.is_clean());
    assert!(report.source.is_none());
}

#[test]
fn test_analyze_directory() {
    let root = setup_temp_project();
    write_file(&root.join("a.c"), "{ //!unused a\n a; }");
    write_file(&root.join("b.c"), "int main() { return 0; }");
    write_file(&root.join("inc/c.h"), "{ //!unused c\n c; c; }");
    write_file(&root.join("README.md"), "{ //!unused r\n r; }");
    write_file(&root.join("build/gen.c"), "{ //!unused g\n g; }");

    let result = Lastuse::new([&root]).analyze().unwrap();
    assert_eq!(result.files_checked, 3);
    assert_eq!(result.diagnostic_count(), 3);
    assert!(!result.is_clean());

    let files: Vec<_> = result.files.iter().map(|f| f.path.clone()).collect();
    assert_eq!(files, vec![root.join("a.c"), root.join("inc/c.h")]);

    let columns: Vec<_> = result.diagnostics().map(|(_, d)| d.column).collect();
    assert_eq!(columns, vec![2, 2, 5]);
}

#[test]
fn test_analyze_records_unreadable_file() {
    let root = setup_temp_project();
    write_file(&root.join("good.c"), "{ //!unused q\n q; }");
    write_file(&root.join("bad.c"), [0xffu8, 0xfe, b'{']);

    let result = Lastuse::new([&root]).analyze().unwrap();
    assert_eq!(result.files_checked, 1);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].path, root.join("bad.c"));
    assert_eq!(result.diagnostic_count(), 1);
}

#[test]
fn test_analyze_is_deterministic_across_runs() {
    let root = setup_temp_project();
    for i in 0..8 {
        write_file(
            &root.join(format!("f{i}.c")),
            format!("{{ //!unused v{i}\n v{i}; }}"),
        );
    }
    let first = Lastuse::new([&root]).analyze().unwrap();
    let second = Lastuse::new([&root]).analyze().unwrap();
    let a: Vec<_> = first.diagnostics().map(|(p, d)| (p.to_path_buf(), d.clone())).collect();
    let b: Vec<_> = second.diagnostics().map(|(p, d)| (p.to_path_buf(), d.clone())).collect();
    assert_eq!(a, b);
    assert_eq!(a.len(), 8);
}

#[test]
fn test_analyze_without_inputs_fails() {
    let empty: Vec<PathBuf> = Vec::new();
    assert!(Lastuse::new(empty).analyze().is_err());
}

#[test]
fn test_builder_applies_config() {
    let root = setup_temp_project();
    write_file(
        &root.join(CONFIG_FILE),
        "[analysis]\nmember_access = \"ignore\"\nextensions = [\"src\"]\nexclude = [\"skip\"]\n",
    );
    write_file(&root.join("x.src"), "{ //!unused y\n o.y; y; }");
    write_file(&root.join("skip/z.src"), "{ //!unused y\n y; }");
    write_file(&root.join("ignored.c"), "{ //!unused y\n y; }");

    let cfg = load_config(&root).unwrap().unwrap();
    let builder = Lastuse::new([&root]).with_config(&cfg);
    assert_eq!(builder.options().member_access, MemberAccess::Ignore);

    let result = builder.analyze().unwrap();
    assert_eq!(result.files_checked, 1);
    assert_eq!(result.diagnostic_count(), 1);
    assert_eq!(result.files[0].diagnostics[0].position(), Position::new(2, 7));
}

#[test]
fn test_invalid_config_is_error() {
    let root = setup_temp_project();
    write_file(&root.join(CONFIG_FILE), "[analysis\n");
    assert!(load_config(&root).is_err());
}

#[test]
fn test_logging_does_not_panic() {
    log_info("test info");
    log_warn("test warn");
    log_error("test error");
}
