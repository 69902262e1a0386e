//! lastuse LSP Server - live `//!unused` checking for C-family editors.
//!
//! Provides IDE integration with:
//! - Diagnostics on open, change and save (full text sync)
//! - Related information pointing at the directive that banned a name
//! - Policy from lastuse.toml at the workspace root, or initializationOptions
//!
//! Never panics on bad input; every problem ends up as a log message.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result as LspResult;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};

use lastuse_core::{
    check_source, has_source_extension, load_config, MemberAccess,
    Severity as LastuseSeverity, ValidateOptions, DEFAULT_EXTENSIONS,
};

/// Client-supplied `initializationOptions`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerSettings {
    member_access: Option<MemberAccess>,
    extensions: Option<Vec<String>>,
}

/// Settings resolved at initialize time.
#[derive(Debug, Clone)]
struct Settings {
    options: ValidateOptions,
    extensions: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            options: ValidateOptions::default(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// lastuse Language Server state.
struct LastuseLsp {
    client: Client,
    /// Open documents, full text.
    documents: Arc<RwLock<HashMap<Url, String>>>,
    settings: Arc<RwLock<Settings>>,
}

impl LastuseLsp {
    fn new(client: Client) -> Self {
        Self {
            client,
            documents: Arc::new(RwLock::new(HashMap::new())),
            settings: Arc::new(RwLock::new(Settings::default())),
        }
    }

    async fn is_tracked(&self, uri: &Url) -> bool {
        let settings = self.settings.read().await;
        has_source_extension(Path::new(uri.path()), &settings.extensions)
    }

    /// Validate the stored text of `uri` and publish diagnostics.
    async fn run_analysis(&self, uri: Url) {
        let text = match self.documents.read().await.get(&uri) {
            Some(text) => text.clone(),
            None => return,
        };
        let options = self.settings.read().await.options;

        let diagnostics = compute_diagnostics(&uri, &text, options);
        self.client
            .publish_diagnostics(uri, diagnostics, None)
            .await;
    }

    async fn log_info(&self, message: &str) {
        self.client.log_message(MessageType::INFO, message).await;
    }

    async fn log_error(&self, message: &str) {
        self.client.log_message(MessageType::ERROR, message).await;
    }
}

/// Converts a 1-based character column on `line_text` into a 0-based
/// UTF-16 offset.
fn utf16_offset(line_text: &str, column: usize) -> u32 {
    line_text
        .chars()
        .take(column.saturating_sub(1))
        .map(char::len_utf16)
        .sum::<usize>() as u32
}

fn line_of(text: &str, line: usize) -> &str {
    text.lines()
        .nth(line.saturating_sub(1))
        .unwrap_or("")
        .trim_end_matches('\r')
}

/// Range covering the identifier (or single character) starting at a
/// 1-based position.
fn lsp_range(text: &str, line: usize, column: usize) -> Range {
    let line_text = line_of(text, line);
    let start = utf16_offset(line_text, column);
    let width: u32 = line_text
        .chars()
        .skip(column.saturating_sub(1))
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .map(|c| c.len_utf16() as u32)
        .sum();
    let lsp_line = line.saturating_sub(1) as u32;
    Range {
        start: Position {
            line: lsp_line,
            character: start,
        },
        end: Position {
            line: lsp_line,
            character: start + width.max(1),
        },
    }
}

fn lsp_severity(severity: LastuseSeverity) -> DiagnosticSeverity {
    match severity {
        LastuseSeverity::Error => DiagnosticSeverity::ERROR,
        LastuseSeverity::Warning => DiagnosticSeverity::WARNING,
    }
}

/// Validate one document and convert the findings to LSP diagnostics.
fn compute_diagnostics(uri: &Url, text: &str, options: ValidateOptions) -> Vec<Diagnostic> {
    let report = check_source(uri.path(), text, options);

    report
        .diagnostics
        .iter()
        .map(|d| {
            // Only usage findings carry a related position: the directive.
            let related_information = d.related.map(|at| {
                vec![DiagnosticRelatedInformation {
                    location: Location {
                        uri: uri.clone(),
                        range: lsp_range(text, at.line, at.column),
                    },
                    message: "marked unused here".to_string(),
                }]
            });

            Diagnostic {
                range: lsp_range(text, d.line, d.column),
                severity: Some(lsp_severity(d.severity)),
                code: Some(NumberOrString::String(d.kind.code().to_string())),
                code_description: None,
                source: Some("lastuse".to_string()),
                message: d.message.clone(),
                related_information,
                tags: None,
                data: None,
            }
        })
        .collect()
}

/// Combines lastuse.toml under `root` with client options; client options win.
fn resolve_settings(root: Option<&Path>, init: Option<serde_json::Value>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Some(root) = root {
        if let Some(config) = load_config(root)? {
            if let Some(policy) = config.member_access() {
                settings.options.member_access = policy;
            }
            if let Some(exts) = config.extensions() {
                settings.extensions = exts.to_vec();
            }
        }
    }

    if let Some(value) = init {
        let client: ServerSettings = serde_json::from_value(value)?;
        if let Some(policy) = client.member_access {
            settings.options.member_access = policy;
        }
        if let Some(exts) = client.extensions {
            settings.extensions = exts;
        }
    }

    Ok(settings)
}

#[tower_lsp::async_trait]
impl LanguageServer for LastuseLsp {
    async fn initialize(&self, params: InitializeParams) -> LspResult<InitializeResult> {
        let root: Option<PathBuf> = params.root_uri.and_then(|uri| uri.to_file_path().ok());

        match resolve_settings(root.as_deref(), params.initialization_options) {
            Ok(settings) => *self.settings.write().await = settings,
            Err(e) => {
                self.log_error(&format!("Invalid configuration, using defaults: {:#}", e))
                    .await
            }
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::FULL),
                        save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                            include_text: Some(true),
                        })),
                        ..Default::default()
                    },
                )),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: "lastuse-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let policy = self.settings.read().await.options.member_access;
        self.log_info(&format!(
            "lastuse LSP server initialized (member access: {})",
            policy
        ))
        .await;
    }

    async fn shutdown(&self) -> LspResult<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        if !self.is_tracked(&uri).await {
            return;
        }
        self.documents
            .write()
            .await
            .insert(uri.clone(), params.text_document.text);
        self.run_analysis(uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        if !self.is_tracked(&uri).await {
            return;
        }
        // Full sync: the last change holds the whole document.
        if let Some(change) = params.content_changes.into_iter().last() {
            self.documents.write().await.insert(uri.clone(), change.text);
        }
        self.run_analysis(uri).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let uri = params.text_document.uri;
        if !self.is_tracked(&uri).await {
            return;
        }
        if let Some(text) = params.text {
            self.documents.write().await.insert(uri.clone(), text);
        }
        self.run_analysis(uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.write().await.remove(&uri);
        // Clear diagnostics for closed file
        self.client.publish_diagnostics(uri, vec![], None).await;
    }
}

#[tokio::main]
async fn main() {
    // Set up panic hook for graceful error handling
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] lastuse-lsp internal error: {}", info);
    }));

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(LastuseLsp::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
