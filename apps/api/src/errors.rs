use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::ExtractError;
use crate::ingest::IngestError;
use crate::render::RenderAttempt;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Every failure path produces a machine-parseable body:
/// `{ "error": { "code", "message", "troubleshooting": [...] } }`,
/// with the full attempt log attached when every render backend failed.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("All render backends failed")]
    RenderExhausted {
        attempts: Vec<RenderAttempt>,
        hints: Vec<String>,
    },

    #[error("Ingestion failed: {0}")]
    Ingestion(#[from] IngestError),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, troubleshooting) = match &self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                vec![],
            ),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
                vec![],
            ),
            AppError::Extraction(e) => {
                tracing::error!("Extraction error: {e}");
                (e.status_code(), e.code(), e.to_string(), e.troubleshooting())
            }
            AppError::RenderExhausted { attempts, hints } => {
                tracing::error!("All {} render backends failed", attempts.len());
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RENDER_EXHAUSTED",
                    "Every rendering backend failed; see the attempt log".to_string(),
                    hints.clone(),
                )
            }
            AppError::Ingestion(e) => {
                tracing::error!("Ingestion error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "INGESTION_FAILURE",
                    e.to_string(),
                    e.troubleshooting(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    msg.clone(),
                    vec!["Verify GEMINI_API_KEY is valid and the model name exists".to_string()],
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    vec![],
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message,
            "troubleshooting": troubleshooting,
        });

        if let AppError::RenderExhausted { attempts, .. } = &self {
            error["attempts"] = json!(attempts);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
