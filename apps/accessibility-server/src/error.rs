//! Error types for the accessibility server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Report not found: {0}")]
    NotFound(String),

    #[error("PDF analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Audit timeout after {0}ms")]
    Timeout(u64),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ServerError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg.clone())
            }
            ServerError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Report not found".to_string(),
            ),
            ServerError::AnalysisFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "ANALYSIS_FAILED",
                self.to_string(),
            ),
            ServerError::Timeout(ms) => (
                StatusCode::REQUEST_TIMEOUT,
                "TIMEOUT",
                format!("Audit timeout after {}ms", ms),
            ),
            ServerError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<accessibility_engine::AuditError> for ServerError {
    fn from(err: accessibility_engine::AuditError) -> Self {
        ServerError::AnalysisFailed(err.to_string())
    }
}

impl From<shared_pdf::PdfError> for ServerError {
    fn from(err: shared_pdf::PdfError) -> Self {
        ServerError::AnalysisFailed(err.to_string())
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("Storage error: {}", err))
    }
}
