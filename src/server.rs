//! MCP Server implementation using rmcp
//!
//! The server owns the working set. Tools mutate it (`add_files`,
//! `add_directory`, `remove_files`), inspect it (`list_files`) and run batch
//! operations over a snapshot of it.

use crate::batch::{self, BatchReport, OperationKind};
use crate::error::Error;
use crate::pdf::PdfReader;
use crate::source::{IngestSource, SuffixPolicy, WorkingSet, WorkingSetEvent};
use anyhow::Result;
use rmcp::{
    handler::server::tool::ToolRouter, handler::server::wrapper::Parameters, model::*,
    schemars::JsonSchema, service::RequestContext, tool, tool_handler, tool_router, RoleServer,
    ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Configuration for the PDF batch server
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Directories PDFs may be added from. Empty means no restriction.
    pub resource_dirs: Vec<String>,
    /// Suffix check applied to candidate paths
    pub suffix_policy: SuffixPolicy,
}

/// PDF batch MCP server
#[derive(Clone)]
pub struct PdfBatchServer {
    working_set: Arc<RwLock<WorkingSet>>,
    tool_router: ToolRouter<Self>,
    config: Arc<ServerConfig>,
}

// ============================================================================
// Request/Response types for working set tools
// ============================================================================

fn default_source() -> IngestSource {
    IngestSource::Dialog
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddFilesParams {
    /// Absolute file paths, or file:// URLs when source is "drop"
    pub paths: Vec<String>,
    /// How the paths were picked: "dialog" (file picker, default) or "drop" (drag-and-drop)
    #[serde(default = "default_source")]
    pub source: IngestSource,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct AddFilesResult {
    /// Paths newly added to the working set, in order
    pub added: Vec<String>,
    /// Candidates rejected by the sandbox
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub denied: Vec<String>,
    /// Size of the working set afterwards
    pub total_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddDirectoryParams {
    /// Directory to scan for PDF files
    pub directory: String,
    /// Scan subdirectories recursively (default: false)
    #[serde(default)]
    pub recursive: bool,
    /// Filename pattern to filter (e.g., "invoice*.pdf"). Supports glob patterns.
    #[serde(default)]
    pub pattern: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RemoveFilesParams {
    /// Paths to remove
    #[serde(default)]
    pub paths: Vec<String>,
    /// Zero-based positions to remove, as listed by list_files
    #[serde(default)]
    pub indices: Vec<usize>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct RemoveFilesResult {
    pub removed: Vec<String>,
    pub total_count: u32,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PdfFileInfo {
    /// Position in the working set
    pub index: u32,
    /// Full path to the PDF file
    pub path: String,
    /// Filename only
    pub name: String,
    /// File size in bytes (0 if the file is gone)
    pub size: u64,
    /// Last modified time (ISO 8601 format)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ListFilesResult {
    pub files: Vec<PdfFileInfo>,
    pub total_count: u32,
}

// ============================================================================
// Request/Response types for batch tools
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct MergeFilesParams {
    /// Name of the merged PDF, written beside the first file of the working set
    pub output_name: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct BatchToolResult {
    /// One-line aggregate
    pub summary: String,
    /// Per-file outcomes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<BatchReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchToolResult {
    fn from_outcome(outcome: crate::error::Result<BatchReport>, operation: OperationKind) -> Self {
        match outcome {
            Ok(report) => Self {
                summary: report.summary(),
                report: Some(report),
                error: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, %operation, "batch rejected");
                Self {
                    summary: format!("{}: not started", operation),
                    report: None,
                    error: Some(e.client_message()),
                }
            }
        }
    }
}

fn to_json<T: Serialize>(result: T) -> String {
    let response = serde_json::json!({ "results": [result] });
    serde_json::to_string_pretty(&response).unwrap_or_default()
}

/// `file://` URI under which a working set entry is listed as a resource
pub fn resource_uri(path: &Path) -> String {
    url::Url::from_file_path(path)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("file://{}", path.display()))
}

fn display_paths(paths: &[PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl PdfBatchServer {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// Create a new server with full configuration
    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            working_set: Arc::new(RwLock::new(WorkingSet::new(config.suffix_policy))),
            tool_router: Self::tool_router(),
            config: Arc::new(config),
        }
    }

    /// Add files to the working set
    #[tool(
        description = "Add PDF files to the working set. Only files ending in .pdf are accepted; paths already in the set are skipped.

Use source \"dialog\" for paths picked from a file chooser and \"drop\" for drag-and-drop payloads (file:// URLs or paths)."
    )]
    async fn add_files(&self, Parameters(params): Parameters<AddFilesParams>) -> String {
        to_json(self.process_add_files(&params).await)
    }

    /// Add all PDFs of a directory to the working set
    #[tool(
        description = "Scan a directory for PDF files and add them to the working set in path order. Supports recursive search and glob pattern filtering."
    )]
    async fn add_directory(&self, Parameters(params): Parameters<AddDirectoryParams>) -> String {
        let result = self
            .process_add_directory(&params)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "add_directory failed");
                AddFilesResult {
                    added: vec![],
                    denied: vec![],
                    total_count: 0,
                    error: Some(e.client_message()),
                }
            });
        to_json(result)
    }

    /// Remove files from the working set
    #[tool(
        description = "Remove files from the working set, by path and/or by zero-based position as shown by list_files. Each entry is removed once even if listed twice."
    )]
    async fn remove_files(&self, Parameters(params): Parameters<RemoveFilesParams>) -> String {
        to_json(self.process_remove_files(&params).await)
    }

    /// List the working set
    #[tool(description = "List the PDF files currently in the working set, in order, with size and modification time.")]
    async fn list_files(&self) -> String {
        to_json(self.process_list_files().await)
    }

    /// Extract embedded images
    #[tool(
        description = "Extract the embedded images of every PDF in the working set into {stem}-output/images/image{page}_{n}.{ext} beside each file. One failing file does not stop the others."
    )]
    async fn extract_images(&self) -> String {
        to_json(self.process_batch(OperationKind::ExtractImages).await)
    }

    /// Convert to DOCX
    #[tool(
        description = "Convert every PDF in the working set to DOCX ({stem}-output/{stem}.docx), one paragraph per page."
    )]
    async fn convert_to_docx(&self) -> String {
        to_json(self.process_batch(OperationKind::ConvertToDocx).await)
    }

    /// Convert to text
    #[tool(
        description = "Extract the text of every PDF in the working set into {stem}-output/{stem}.txt, each page preceded by a \"Seite {n}\" header. Existing text output is replaced."
    )]
    async fn convert_to_txt(&self) -> String {
        to_json(self.process_batch(OperationKind::ConvertToTxt).await)
    }

    /// Split into single pages
    #[tool(
        description = "Split every PDF in the working set into single-page PDFs ({stem}-output/einzelne-seiten/Seite-{n}.pdf)."
    )]
    async fn split_files(&self) -> String {
        to_json(self.process_batch(OperationKind::SplitFiles).await)
    }

    /// Merge the working set into one PDF
    #[tool(
        description = "Merge all PDFs of the working set, in working-set order, into {output_name}.pdf in the directory of the first file. Fails as a whole if any input cannot be read."
    )]
    async fn merge_files(&self, Parameters(params): Parameters<MergeFilesParams>) -> String {
        to_json(self.process_merge(&params).await)
    }
}

impl PdfBatchServer {
    /// Subscribe to working set change notifications
    pub async fn subscribe(&self) -> broadcast::Receiver<WorkingSetEvent> {
        self.working_set.read().await.subscribe()
    }

    /// Snapshot of the working set paths
    pub async fn paths(&self) -> Vec<PathBuf> {
        self.working_set.read().await.paths().to_vec()
    }

    /// Validate that a path is within allowed resource directories.
    /// If no resource_dirs are configured, all paths are allowed.
    fn validate_path_access(&self, path: &Path) -> crate::error::Result<PathBuf> {
        if self.config.resource_dirs.is_empty() {
            return Ok(path.to_path_buf());
        }

        let canonical = std::fs::canonicalize(path).map_err(|_| Error::PathAccessDenied {
            path: path.display().to_string(),
        })?;

        for dir in &self.config.resource_dirs {
            if let Ok(canonical_dir) = std::fs::canonicalize(dir) {
                if canonical.starts_with(&canonical_dir) {
                    return Ok(canonical);
                }
            }
        }

        Err(Error::PathAccessDenied {
            path: path.display().to_string(),
        })
    }

    pub async fn process_add_files(&self, params: &AddFilesParams) -> AddFilesResult {
        let mut allowed = Vec::new();
        let mut denied = Vec::new();

        for candidate in &params.paths {
            let Some(path) = WorkingSet::candidate_path(OsStr::new(candidate), params.source)
            else {
                continue;
            };
            match self.validate_path_access(&path) {
                Ok(path) => allowed.push(path),
                Err(e) => {
                    tracing::warn!(error = %e, "add_files denied");
                    denied.push(candidate.clone());
                }
            }
        }

        // Drop payloads are already local paths at this point
        let source = match params.source {
            IngestSource::Drop => IngestSource::Directory,
            other => other,
        };

        let mut set = self.working_set.write().await;
        let added = set.ingest(&allowed, source);
        AddFilesResult {
            added: display_paths(&added),
            denied,
            total_count: set.len() as u32,
            error: None,
        }
    }

    pub async fn process_add_directory(
        &self,
        params: &AddDirectoryParams,
    ) -> crate::error::Result<AddFilesResult> {
        let directory = self.validate_path_access(Path::new(&params.directory))?;

        let mut set = self.working_set.write().await;
        let added =
            set.ingest_directory(&directory, params.recursive, params.pattern.as_deref())?;
        Ok(AddFilesResult {
            added: display_paths(&added),
            denied: vec![],
            total_count: set.len() as u32,
            error: None,
        })
    }

    pub async fn process_remove_files(&self, params: &RemoveFilesParams) -> RemoveFilesResult {
        let mut set = self.working_set.write().await;

        // Resolve positions against the set as listed, before path removals shift them
        let mut targets: Vec<PathBuf> = params
            .indices
            .iter()
            .filter_map(|&i| set.paths().get(i).cloned())
            .collect();
        targets.extend(params.paths.iter().map(PathBuf::from));

        let removed = set.remove(&targets);
        RemoveFilesResult {
            removed: display_paths(&removed),
            total_count: set.len() as u32,
        }
    }

    pub async fn process_list_files(&self) -> ListFilesResult {
        let paths = self.paths().await;
        let files: Vec<PdfFileInfo> = paths
            .iter()
            .enumerate()
            .map(|(index, path)| {
                let metadata = std::fs::metadata(path).ok();
                let size = metadata.as_ref().map(|m| m.len()).unwrap_or(0);
                let modified = metadata
                    .as_ref()
                    .and_then(|m| m.modified().ok())
                    .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                    .map(|d| {
                        chrono::DateTime::from_timestamp(d.as_secs() as i64, 0)
                            .map(|dt| dt.to_rfc3339())
                            .unwrap_or_default()
                    });
                PdfFileInfo {
                    index: index as u32,
                    path: path.display().to_string(),
                    name: path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default(),
                    size,
                    modified,
                }
            })
            .collect();

        ListFilesResult {
            total_count: files.len() as u32,
            files,
        }
    }

    /// Run a per-file batch operation over a snapshot of the working set
    pub async fn process_batch(&self, operation: OperationKind) -> BatchToolResult {
        let paths = self.paths().await;
        if paths.is_empty() {
            return BatchToolResult::from_outcome(Err(Error::NoFilesSelected), operation);
        }

        let outcome = tokio::task::spawn_blocking(move || batch::run(operation, &paths))
            .await
            .map_err(|e| Error::TaskJoin {
                reason: e.to_string(),
            })
            .and_then(|r| r);
        BatchToolResult::from_outcome(outcome, operation)
    }

    pub async fn process_merge(&self, params: &MergeFilesParams) -> BatchToolResult {
        let paths = self.paths().await;
        if paths.is_empty() {
            return BatchToolResult::from_outcome(
                Err(Error::NoFilesSelected),
                OperationKind::MergeFiles,
            );
        }

        let name = params.output_name.clone();
        let outcome = tokio::task::spawn_blocking(move || batch::merge(&paths, &name))
            .await
            .map_err(|e| Error::TaskJoin {
                reason: e.to_string(),
            })
            .and_then(|r| r);
        BatchToolResult::from_outcome(outcome, OperationKind::MergeFiles)
    }

    /// Map a resource URI back to its working set entry
    pub async fn resolve_resource(&self, uri: &str) -> std::result::Result<PathBuf, &'static str> {
        let path = url::Url::parse(uri)
            .ok()
            .filter(|u| u.scheme() == "file")
            .and_then(|u| u.to_file_path().ok())
            .ok_or("Only file:// URIs are supported")?;

        if !self.working_set.read().await.contains(&path) {
            return Err("Resource is not in the working set");
        }
        Ok(crate::source::normalize(&path))
    }

    async fn read_pdf_text(&self, path: PathBuf) -> crate::error::Result<String> {
        tokio::task::spawn_blocking(move || {
            let reader = PdfReader::open(&path)?;
            let pages = reader.extract_all_text()?;
            Ok::<_, Error>(
                pages
                    .iter()
                    .map(|(n, text)| batch::page_text_block(*n, text))
                    .collect::<String>(),
            )
        })
        .await
        .map_err(|e| Error::TaskJoin {
            reason: e.to_string(),
        })?
    }
}

impl Default for PdfBatchServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_handler]
impl ServerHandler for PdfBatchServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "PDF batch server: collect PDFs with add_files/add_directory, then run \
                 extract_images, convert_to_docx, convert_to_txt, split_files or merge_files \
                 over the whole working set. Results are written beside each source file. \
                 Working set entries are also exposed as resources."
                    .into(),
            ),
        }
    }

    /// List the working set as resources
    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        let paths = self.paths().await;
        let listing = self.process_list_files().await;
        let mut resources = Vec::with_capacity(listing.files.len());

        for (path, file) in paths.iter().zip(listing.files) {
            let uri = resource_uri(path);
            let mut resource = RawResource::new(uri, file.name.clone());
            resource.mime_type = Some("application/pdf".to_string());
            resource.description = Some(format!(
                "PDF file ({} bytes){}",
                file.size,
                file.modified
                    .as_ref()
                    .map(|m| format!(", modified: {}", m))
                    .unwrap_or_default()
            ));
            resource.size = Some(file.size as u32);

            resources.push(Annotated {
                raw: resource,
                annotations: None,
            });
        }

        Ok(ListResourcesResult {
            resources,
            next_cursor: None,
            meta: Default::default(),
        })
    }

    /// Read a working set entry and return its text content
    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        let uri = &request.uri;

        let path = self
            .resolve_resource(uri)
            .await
            .map_err(|message| ErrorData::invalid_params(message, None))?;

        match self.read_pdf_text(path).await {
            Ok(text) => Ok(ReadResourceResult {
                contents: vec![ResourceContents::TextResourceContents {
                    uri: uri.clone(),
                    mime_type: Some("text/plain".to_string()),
                    text,
                    meta: Default::default(),
                }],
            }),
            Err(e) => {
                tracing::warn!(error = %e, "read_resource failed");
                Err(ErrorData::internal_error(e.client_message(), None))
            }
        }
    }
}

/// Log working set changes as they happen
fn spawn_event_logger(mut events: broadcast::Receiver<WorkingSetEvent>) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(WorkingSetEvent::Added(paths)) => {
                    tracing::info!(count = paths.len(), ?paths, "files added to working set");
                }
                Ok(WorkingSetEvent::Removed(paths)) => {
                    tracing::info!(count = paths.len(), ?paths, "files removed from working set");
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "event logger lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Run the MCP server with the default configuration
pub async fn run_server() -> Result<()> {
    run_server_with_config(ServerConfig::default()).await
}

/// Run the MCP server with full configuration
pub async fn run_server_with_config(config: ServerConfig) -> Result<()> {
    let server = PdfBatchServer::with_config(config);
    spawn_event_logger(server.subscribe().await);

    tracing::info!("PDF batch server ready, waiting for connections...");

    let service = server.serve(rmcp::transport::io::stdio()).await?;
    service.waiting().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_files_params_default_source() {
        let params: AddFilesParams =
            serde_json::from_str(r#"{"paths": ["/a.pdf"]}"#).unwrap();
        assert_eq!(params.source, IngestSource::Dialog);

        let params: AddFilesParams =
            serde_json::from_str(r#"{"paths": ["file:///a.pdf"], "source": "drop"}"#).unwrap();
        assert_eq!(params.source, IngestSource::Drop);
    }

    #[test]
    fn test_remove_params_defaults() {
        let params: RemoveFilesParams = serde_json::from_str("{}").unwrap();
        assert!(params.paths.is_empty());
        assert!(params.indices.is_empty());
    }

    #[tokio::test]
    async fn test_add_files_dedupes_and_filters() {
        let server = PdfBatchServer::new();
        let first = server
            .process_add_files(&AddFilesParams {
                paths: vec!["/x/a.pdf".into(), "/x/b.txt".into(), "/x/c.pdf".into()],
                source: IngestSource::Dialog,
            })
            .await;
        assert_eq!(first.added, vec!["/x/a.pdf", "/x/c.pdf"]);

        let second = server
            .process_add_files(&AddFilesParams {
                paths: vec!["file:///x/c.pdf".into(), "file:///x/d.pdf".into()],
                source: IngestSource::Drop,
            })
            .await;
        assert_eq!(second.added, vec!["/x/d.pdf"]);
        assert_eq!(second.total_count, 3);
    }

    #[tokio::test]
    async fn test_remove_by_index_and_path() {
        let server = PdfBatchServer::new();
        server
            .process_add_files(&AddFilesParams {
                paths: vec!["/a.pdf".into(), "/b.pdf".into(), "/c.pdf".into()],
                source: IngestSource::Dialog,
            })
            .await;

        let result = server
            .process_remove_files(&RemoveFilesParams {
                paths: vec!["/a.pdf".into()],
                indices: vec![0, 2],
            })
            .await;

        assert_eq!(result.removed, vec!["/a.pdf", "/c.pdf"]);
        assert_eq!(result.total_count, 1);
        assert_eq!(server.paths().await, vec![PathBuf::from("/b.pdf")]);
    }

    #[tokio::test]
    async fn test_batch_on_empty_working_set() {
        let server = PdfBatchServer::new();
        let result = server.process_batch(OperationKind::SplitFiles).await;
        assert!(result.report.is_none());
        assert_eq!(result.error.as_deref(), Some("No path selected"));

        let result = server
            .process_merge(&MergeFilesParams {
                output_name: "all".into(),
            })
            .await;
        assert_eq!(result.error.as_deref(), Some("No path selected"));
    }

    #[tokio::test]
    async fn test_sandbox_denies_outside_paths() {
        let allowed = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        let inside_pdf = allowed.path().join("in.pdf");
        let outside_pdf = outside.path().join("out.pdf");
        std::fs::write(&inside_pdf, b"%PDF-1.4").unwrap();
        std::fs::write(&outside_pdf, b"%PDF-1.4").unwrap();

        let server = PdfBatchServer::with_config(ServerConfig {
            resource_dirs: vec![allowed.path().to_string_lossy().to_string()],
            ..ServerConfig::default()
        });
        let result = server
            .process_add_files(&AddFilesParams {
                paths: vec![
                    inside_pdf.to_string_lossy().to_string(),
                    outside_pdf.to_string_lossy().to_string(),
                ],
                source: IngestSource::Dialog,
            })
            .await;

        assert_eq!(result.added.len(), 1);
        assert_eq!(result.denied, vec![outside_pdf.to_string_lossy().to_string()]);

        let dir_result = server
            .process_add_directory(&AddDirectoryParams {
                directory: outside.path().to_string_lossy().to_string(),
                recursive: false,
                pattern: None,
            })
            .await;
        assert!(matches!(dir_result, Err(Error::PathAccessDenied { .. })));
    }

    #[tokio::test]
    async fn test_list_files_reports_missing_as_zero_size() {
        let server = PdfBatchServer::new();
        server
            .process_add_files(&AddFilesParams {
                paths: vec!["/nonexistent/dir/a.pdf".into()],
                source: IngestSource::Dialog,
            })
            .await;

        let listing = server.process_list_files().await;
        assert_eq!(listing.total_count, 1);
        assert_eq!(listing.files[0].name, "a.pdf");
        assert_eq!(listing.files[0].size, 0);
        assert!(listing.files[0].modified.is_none());
    }

    #[tokio::test]
    async fn test_listed_uri_resolves_for_dotted_paths() {
        let server = PdfBatchServer::new();
        let result = server
            .process_add_files(&AddFilesParams {
                paths: vec!["/x/../y.pdf".into(), "/y.pdf".into(), "/a/./b.pdf".into()],
                source: IngestSource::Dialog,
            })
            .await;
        assert_eq!(result.added, vec!["/y.pdf", "/a/b.pdf"]);

        for path in server.paths().await {
            let uri = resource_uri(&path);
            assert_eq!(server.resolve_resource(&uri).await, Ok(path));
        }
        assert_eq!(
            server.resolve_resource("file:///x/../y.pdf").await,
            Ok(PathBuf::from("/y.pdf"))
        );
        assert!(server.resolve_resource("https://example.com/y.pdf").await.is_err());
        assert!(server.resolve_resource("file:///other.pdf").await.is_err());
    }

    #[tokio::test]
    async fn test_events_reach_subscribers() {
        let server = PdfBatchServer::new();
        let mut events = server.subscribe().await;
        server
            .process_add_files(&AddFilesParams {
                paths: vec!["/a.pdf".into()],
                source: IngestSource::Dialog,
            })
            .await;
        assert_eq!(
            events.try_recv().unwrap(),
            WorkingSetEvent::Added(vec![PathBuf::from("/a.pdf")])
        );
    }
}
