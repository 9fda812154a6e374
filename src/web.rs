//! HTTP front end.
//!
//! Every request carries its own upload. The PDF is written to a uniquely
//! named temporary file, processed on the blocking pool, and the file is
//! removed when the work finishes, whether it succeeded or not.

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;

use crate::analysis::{provider, Analyzer};
use crate::config::Config;
use crate::error::SplitError;
use crate::page_range::PageSelection;
use crate::pdf::{text, PdfDocument};
use crate::split::{self, Section};

const INDEX_HTML: &str = include_str!("../static/index.html");

const SKIPPED_PAGES: HeaderName = HeaderName::from_static("x-skipped-pages");
const SKIPPED_SECTIONS: HeaderName = HeaderName::from_static("x-skipped-sections");

// ============================================================================
// State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    analyzer: Option<Analyzer>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let analyzer = if config.ai.is_enabled() {
            match provider::from_config(&config.ai) {
                Ok(provider) => Some(Analyzer::new(provider)),
                Err(e) => {
                    tracing::warn!("AI analysis disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };
        Self::with_analyzer(config, analyzer)
    }

    pub fn with_analyzer(config: Config, analyzer: Option<Analyzer>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, analyzer }),
        }
    }

    fn upload_dir(&self) -> &Path {
        &self.inner.config.server.upload_dir
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No file uploaded")]
    NoFile,

    #[error("No file selected")]
    NoFileSelected,

    #[error("Invalid file type. Please upload a PDF file.")]
    InvalidFileType,

    #[error("Please specify which pages to extract")]
    MissingPages,

    #[error("Invalid sections data: {0}")]
    InvalidSections(String),

    #[error("Invalid chunk size: {0}")]
    InvalidChunkSize(String),

    #[error("Failed to read upload: {0}")]
    Multipart(String),

    #[error("AI analysis is not configured. Please set ANTHROPIC_API_KEY, OPENAI_API_KEY, DEEPSEEK_API_KEY, or use Ollama.")]
    AiDisabled,

    #[error("Analysis failed: {0}")]
    Analysis(String),

    #[error(transparent)]
    Split(#[from] SplitError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        ApiError::Internal(e.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    skipped_pages: Option<Vec<i64>>,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NoFile => (StatusCode::BAD_REQUEST, "NO_FILE"),
            ApiError::NoFileSelected => (StatusCode::BAD_REQUEST, "NO_FILE_SELECTED"),
            ApiError::InvalidFileType => (StatusCode::BAD_REQUEST, "INVALID_FILE_TYPE"),
            ApiError::MissingPages => (StatusCode::BAD_REQUEST, "MISSING_PAGES"),
            ApiError::InvalidSections(_) => (StatusCode::BAD_REQUEST, "INVALID_SECTIONS"),
            ApiError::InvalidChunkSize(_) => (StatusCode::BAD_REQUEST, "INVALID_CHUNK_SIZE"),
            ApiError::Multipart(_) => (StatusCode::BAD_REQUEST, "BAD_MULTIPART"),
            ApiError::AiDisabled => (StatusCode::BAD_REQUEST, "AI_NOT_CONFIGURED"),
            ApiError::Analysis(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ANALYSIS_FAILED"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Split(e) => match e {
                SplitError::InvalidSourceDocument(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_SOURCE_DOCUMENT")
                }
                SplitError::EmptySelection => (StatusCode::UNPROCESSABLE_ENTITY, "EMPTY_SELECTION"),
                SplitError::NoValidPages { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "NO_VALID_PAGES")
                }
                SplitError::MalformedToken(_) => (StatusCode::BAD_REQUEST, "MALFORMED_TOKEN"),
                SplitError::InvalidChunkSize(_) => (StatusCode::BAD_REQUEST, "INVALID_CHUNK_SIZE"),
                SplitError::Write(_) | SplitError::Archive(_) | SplitError::Io(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "SPLIT_FAILED")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(code, "{}", self);
        } else {
            tracing::debug!(code, "{}", self);
        }

        let skipped_pages = match &self {
            ApiError::Split(SplitError::NoValidPages { skipped }) => Some(skipped.clone()),
            _ => None,
        };
        let body = Json(ErrorResponse {
            error: self.to_string(),
            code,
            skipped_pages,
        });
        (status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let body_limit = state.inner.config.server.max_upload_bytes;
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/upload", post(upload))
        .route("/split-chunks", post(split_chunks))
        .route("/split-multiple", post(split_multiple))
        .route("/analyze", post(analyze))
        .route("/summary", post(summary))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("pagecut v{} listening on http://{}", env!("CARGO_PKG_VERSION"), addr);
    if config.ai.is_enabled() {
        tracing::info!(provider = ?config.ai.provider, "AI analysis enabled");
    }

    axum::serve(listener, router(AppState::new(config)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

// ============================================================================
// Form handling
// ============================================================================

struct UploadedFile {
    file_name: String,
    bytes: Bytes,
}

#[derive(Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::Multipart(e.to_string()))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name == "pdf_file" || name == "file" {
                let file_name = field.file_name().unwrap_or("").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Multipart(e.to_string()))?;
                tracing::debug!(file_name = %file_name, size = bytes.len(), "received upload");
                form.file = Some(UploadedFile { file_name, bytes });
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Multipart(e.to_string()))?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(|v| v.trim()).unwrap_or("")
    }

    fn flag(&self, name: &str) -> bool {
        matches!(
            self.field(name).to_ascii_lowercase().as_str(),
            "1" | "true" | "on" | "yes"
        )
    }

    fn take_file(&mut self) -> ApiResult<UploadedFile> {
        match self.file.take() {
            None => Err(ApiError::NoFile),
            Some(file) if file.file_name.is_empty() => Err(ApiError::NoFileSelected),
            Some(file) => Ok(file),
        }
    }
}

fn ensure_pdf(file: &UploadedFile) -> ApiResult<()> {
    let is_pdf = Path::new(&file.file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf {
        Ok(())
    } else {
        Err(ApiError::InvalidFileType)
    }
}

/// Reduce an uploaded file name to ASCII letters, digits, `.`, `-` and `_`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');
    if cleaned.is_empty() {
        "document.pdf".to_string()
    } else {
        cleaned.to_string()
    }
}

fn file_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string()
}

/// Spill the upload to a temp file and run `work` on it off the async
/// runtime. The temp file is gone once this returns.
async fn with_temp_pdf<T, F>(dir: &Path, bytes: Bytes, work: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Path) -> ApiResult<T> + Send + 'static,
{
    let dir: PathBuf = dir.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let mut temp = tempfile::Builder::new()
            .prefix("pagecut_")
            .suffix(".pdf")
            .tempfile_in(&dir)?;
        temp.write_all(&bytes)?;
        temp.flush()?;
        work(temp.path())
    })
    .await
    .map_err(|e| ApiError::Internal(format!("worker failed: {}", e)))?
}

/// Unreadable documents keep their own status; anything else failed
/// during text extraction.
fn extraction_error(e: anyhow::Error) -> ApiError {
    match e.downcast::<SplitError>() {
        Ok(split) => ApiError::Split(split),
        Err(e) => ApiError::Analysis(format!("{:#}", e)),
    }
}

fn attachment(bytes: Vec<u8>, content_type: &'static str, file_name: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

async fn index(State(state): State<AppState>) -> Html<String> {
    let enabled = state.inner.analyzer.is_some();
    Html(INDEX_HTML.replace("{ai_enabled}", if enabled { "true" } else { "false" }))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// POST /upload
///
/// Extract the pages named in `pages` into a single PDF.
async fn upload(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Response> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file()?;

    let pages = form.field("pages").to_string();
    if pages.is_empty() {
        return Err(ApiError::MissingPages);
    }
    ensure_pdf(&file)?;

    let selection = if form.flag("strict") {
        PageSelection::parse_strict(&pages)?
    } else {
        PageSelection::parse(&pages)
    };
    if selection.is_empty() {
        return Err(SplitError::EmptySelection.into());
    }

    let safe_name = sanitize_filename(&file.file_name);
    let result = with_temp_pdf(state.upload_dir(), file.bytes, move |path| {
        let doc = PdfDocument::open(path)?;
        Ok(split::materialize(&doc, &selection)?)
    })
    .await?;

    tracing::info!(file = %safe_name, "{}", result.summary());

    let mut response = attachment(
        result.output,
        "application/pdf",
        &format!("extracted_{}", safe_name),
    );
    if !result.skipped_pages.is_empty() {
        let skipped: Vec<String> = result.skipped_pages.iter().map(i64::to_string).collect();
        if let Ok(value) = HeaderValue::from_str(&skipped.join(",")) {
            response.headers_mut().insert(SKIPPED_PAGES, value);
        }
    }
    Ok(response)
}

/// POST /split-chunks
///
/// Split the whole document into consecutive runs of `chunk_size` pages.
async fn split_chunks(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Response> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file()?;
    ensure_pdf(&file)?;

    let raw_size = form.field("chunk_size");
    let chunk_size: usize = if raw_size.is_empty() {
        1
    } else {
        raw_size
            .parse()
            .map_err(|_| ApiError::InvalidChunkSize(raw_size.to_string()))?
    };

    let safe_name = sanitize_filename(&file.file_name);
    let stem = file_stem(&safe_name);
    let chunk_stem = stem.clone();
    let archive = with_temp_pdf(state.upload_dir(), file.bytes, move |path| {
        let doc = PdfDocument::open(path)?;
        let artifacts = split::split_into_chunks(&doc, chunk_size, &chunk_stem)?;
        tracing::info!(chunks = artifacts.len(), chunk_size, "split into chunks");
        Ok(split::write_archive(&artifacts)?)
    })
    .await?;

    Ok(attachment(
        archive,
        "application/zip",
        &format!("split_{}.zip", stem),
    ))
}

/// POST /split-multiple
///
/// One PDF per entry of the `sections` JSON array, returned as a zip.
async fn split_multiple(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Response> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file()?;

    let raw_sections = match form.field("sections") {
        "" => "[]",
        raw => raw,
    };
    let sections: Vec<Section> = serde_json::from_str(raw_sections)
        .map_err(|e| ApiError::InvalidSections(e.to_string()))?;
    tracing::debug!(count = sections.len(), "received sections");
    ensure_pdf(&file)?;

    let safe_name = sanitize_filename(&file.file_name);
    let (archive, skipped) = with_temp_pdf(state.upload_dir(), file.bytes, move |path| {
        let doc = PdfDocument::open(path)?;
        let outcome = split::split_sections(&doc, &sections)?;
        let archive = split::write_archive(&outcome.artifacts)?;
        Ok((archive, outcome.skipped.len()))
    })
    .await?;

    let mut response = attachment(
        archive,
        "application/zip",
        &format!("split_{}.zip", file_stem(&safe_name)),
    );
    if skipped > 0 {
        response
            .headers_mut()
            .insert(SKIPPED_SECTIONS, HeaderValue::from(skipped));
    }
    Ok(response)
}

/// POST /analyze
///
/// Ask the configured model how the document could be split.
async fn analyze(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Response> {
    let Some(analyzer) = state.inner.analyzer.as_ref() else {
        return Err(ApiError::AiDisabled);
    };

    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file()?;
    ensure_pdf(&file)?;
    let question = form.field("question").to_string();

    let max_pages = state.inner.config.ai.max_pages;
    let sample = with_temp_pdf(state.upload_dir(), file.bytes, move |path| {
        let bytes = std::fs::read(path)?;
        text::sample_pages(&bytes, max_pages).map_err(extraction_error)
    })
    .await?;

    let question = Some(question.as_str()).filter(|q| !q.is_empty());
    let analysis = analyzer.analyze(&sample, question).await;
    Ok(Json(analysis).into_response())
}

/// POST /summary
async fn summary(State(state): State<AppState>, multipart: Multipart) -> ApiResult<Response> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file()?;
    ensure_pdf(&file)?;

    let summary = with_temp_pdf(state.upload_dir(), file.bytes, |path| {
        text::quick_summary(path).map_err(|e| {
            ApiError::Split(SplitError::InvalidSourceDocument(format!("{:#}", e)))
        })
    })
    .await?;
    Ok(Json(summary).into_response())
}
