//! API handlers for the accessibility server
//!
//! Provides REST endpoints for:
//! - PDF upload and audit, with reports written to disk
//! - Report download
//! - JSON audit returning the structured report

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use accessibility_engine::contrast::{contrast_messages, render_contrast_html};
use accessibility_engine::{apply_contrast, merge_contrast_section};
use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use shared_pdf::PdfDocument;
use shared_types::AccessibilityReport;
use tracing::{debug, info, warn};

use crate::error::ServerError;
use crate::storage::{is_pdf_name, sanitize_filename};
use crate::AppState;

/// Multipart field carrying the uploaded document
const UPLOAD_FIELD: &str = "pdf";

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "accessibility-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Names of the reports written for an upload
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub report: String,
    pub contrast_report: String,
}

/// Set when the request waiting on a blocking job has timed out. The job
/// itself cannot be aborted, so it checks this before writing anything.
#[derive(Clone, Debug)]
pub struct Cancellation {
    cancelled: Arc<AtomicBool>,
    timeout_ms: u64,
}

impl Cancellation {
    fn new(timeout_ms: u64) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            timeout_ms,
        }
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(Timeout)` once the caller has given up
    pub fn check(&self) -> Result<(), ServerError> {
        if self.is_cancelled() {
            Err(ServerError::Timeout(self.timeout_ms))
        } else {
            Ok(())
        }
    }
}

/// Run a blocking audit job on the blocking pool, bounded by the audit
/// timeout. On timeout the job keeps running but sees its cancellation set.
pub(crate) async fn run_blocking<T, F>(state: &AppState, job: F) -> Result<T, ServerError>
where
    T: Send + 'static,
    F: FnOnce(AppState, Cancellation) -> Result<T, ServerError> + Send + 'static,
{
    let timeout_ms = state.audit_timeout_ms;
    let state = state.clone();
    let cancellation = Cancellation::new(timeout_ms);
    let job_cancellation = cancellation.clone();

    let result = tokio::time::timeout(
        Duration::from_millis(timeout_ms),
        tokio::task::spawn_blocking(move || job(state, job_cancellation)),
    )
    .await;

    match result {
        Ok(Ok(result)) => result,
        Ok(Err(join_error)) => Err(ServerError::Internal(format!(
            "Audit task panicked: {}",
            join_error
        ))),
        Err(_timeout) => {
            cancellation.cancel();
            warn!("Audit timed out after {}ms; results will be discarded", timeout_ms);
            Err(ServerError::Timeout(timeout_ms))
        }
    }
}

/// Save, audit, write both reports, then splice contrast into the text
/// report. Uploads sharing a name are serialized on the report lock.
fn process_upload(
    state: &AppState,
    cancellation: &Cancellation,
    filename: &str,
    bytes: &[u8],
) -> Result<UploadResponse, ServerError> {
    let name = sanitize_filename(filename)
        .ok_or_else(|| ServerError::InvalidRequest(format!("Invalid file name: {}", filename)))?;

    state.store.with_report_lock(&name, || -> Result<UploadResponse, ServerError> {
        cancellation.check()?;
        state.store.save_upload(&name, bytes)?;
        let document = PdfDocument::from_bytes(bytes)?;

        let report = state.engine.audit(&document, &name, state.grammar.as_ref());
        let contrast = state.engine.find_contrast_issues(&document);

        cancellation.check()?;
        let report_name = state.store.write_report(&name, &state.engine.render(&report))?;
        let contrast_name = state
            .store
            .write_contrast_html(&name, &render_contrast_html(&name, &contrast))?;

        let messages = contrast_messages(&contrast);
        state
            .store
            .update_report(&report_name, |text| merge_contrast_section(text, &messages))?;

        info!(
            "Wrote {} and {} ({} contrast findings)",
            report_name,
            contrast_name,
            contrast.len()
        );

        Ok(UploadResponse {
            report: report_name,
            contrast_report: contrast_name,
        })
    })
}

/// Handler: POST /upload
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ServerError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::InvalidRequest(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!("Ignoring multipart field {:?}", field.name());
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;
        upload = Some((filename, bytes));
        break;
    }

    let (filename, bytes) =
        upload.ok_or_else(|| ServerError::InvalidRequest("No file uploaded".into()))?;
    if filename.is_empty() {
        return Err(ServerError::InvalidRequest("No selected file".into()));
    }
    if !is_pdf_name(&filename) {
        return Err(ServerError::InvalidRequest(
            "Invalid file type. Only PDF files are allowed.".into(),
        ));
    }

    info!("Upload: {} ({} bytes)", filename, bytes.len());
    let response = run_blocking(&state, move |state, cancellation| {
        process_upload(&state, &cancellation, &filename, &bytes)
    })
    .await?;

    Ok(Json(response))
}

/// Handler: GET /download/:filename
pub async fn handle_download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let path = state.store.report_path(&filename)?;
    let body = tokio::fs::read(&path).await?;

    let content_type = if filename.ends_with(".html") {
        "text/html; charset=utf-8"
    } else {
        "text/plain; charset=utf-8"
    };
    let disposition = format!("attachment; filename=\"{}\"", filename);

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// JSON audit request body
#[derive(Deserialize)]
pub struct AuditRequest {
    /// Base64-encoded PDF bytes
    pub pdf_base64: String,

    /// Name used in the report overview
    #[serde(default = "default_filename")]
    pub filename: String,
}

fn default_filename() -> String {
    "document.pdf".to_string()
}

/// JSON audit response
#[derive(Serialize)]
pub struct AuditResponse {
    pub success: bool,
    /// Structured findings, contrast included
    pub report: AccessibilityReport,
    /// Rendered text report
    pub text: String,
    /// Contrast findings, or the clean sentinel
    pub contrast: Vec<String>,
    pub issue_count: usize,
}

/// Handler: POST /api/audit
pub async fn handle_audit(
    State(state): State<AppState>,
    Json(req): Json<AuditRequest>,
) -> Result<Json<AuditResponse>, ServerError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(req.pdf_base64.trim())
        .map_err(|e| ServerError::InvalidRequest(format!("Invalid base64 PDF: {}", e)))?;
    info!("Audit request: {} ({} bytes)", req.filename, bytes.len());

    let filename = req.filename;
    let response = run_blocking(&state, move |state, _cancellation| {
        let document = PdfDocument::from_bytes(&bytes)?;
        let mut report = state.engine.audit(&document, &filename, state.grammar.as_ref());
        let contrast = state.engine.check_contrast(&document);
        apply_contrast(&mut report, &contrast);
        let text = state.engine.render(&report);

        Ok(AuditResponse {
            success: true,
            issue_count: report.issue_count(),
            report,
            text,
            contrast,
        })
    })
    .await?;

    Ok(Json(response))
}
