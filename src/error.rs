use crate::services::generation_service::GenerationStage;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use serde_json::json;
use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid request body: {0}")]
    JsonBody(#[from] JsonRejection),

    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationFailure),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Excel export error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        if let Error::Generation(failure) = &self {
            let status = match failure.kind {
                FailureKind::InvalidInput => StatusCode::BAD_REQUEST,
                FailureKind::CompletionServiceFailure | FailureKind::MalformedResponse => {
                    StatusCode::BAD_GATEWAY
                }
                FailureKind::EmptyResult => StatusCode::UNPROCESSABLE_ENTITY,
                FailureKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            };
            let mut body = json!({
                "error": failure.message,
                "kind": failure.kind,
                "stage": failure.stage,
            });
            if let Some(raw) = &failure.raw {
                body["raw"] = json!(raw);
            }
            return (status, Json(body)).into_response();
        }

        let (status, error_message) = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Json(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::JsonBody(rejection) => (rejection.status(), rejection.body_text()),
            Error::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
            Error::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Error::Xlsx(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Export error: {}", err),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred".to_string(),
            ),
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

/// Why a generation run ended in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    InvalidInput,
    CompletionServiceFailure,
    MalformedResponse,
    EmptyResult,
    /// A pipeline step panicked.
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::InvalidInput => "InvalidInput",
            FailureKind::CompletionServiceFailure => "CompletionServiceFailure",
            FailureKind::MalformedResponse => "MalformedResponse",
            FailureKind::EmptyResult => "EmptyResult",
            FailureKind::Internal => "Internal",
        };
        f.write_str(name)
    }
}

/// Terminal failure of one generation run. `raw` keeps the completion text
/// whenever the failure happened after the model answered.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind} during {stage}: {message}")]
pub struct GenerationFailure {
    pub kind: FailureKind,
    pub stage: GenerationStage,
    pub message: String,
    pub raw: Option<String>,
}

impl GenerationFailure {
    pub fn new(kind: FailureKind, stage: GenerationStage, message: impl Into<String>) -> Self {
        Self {
            kind,
            stage,
            message: message.into(),
            raw: None,
        }
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = Some(raw.into());
        self
    }
}
