use thiserror::Error;

/// Errors that abort an audit run
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Unreadable document: {0}")]
    Document(#[from] shared_pdf::PdfError),

    #[error("Image decode failed: {0}")]
    ImageDecode(String),
}

/// Failure talking to a grammar service. Never escapes the engine: it is
/// turned into a grammar finding.
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out after {0}ms")]
    Timeout(u64),

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}
