//! Axum route handlers for the render surface.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::placeholder::{fill_html, fill_latex, ValueMap};
use crate::render::{diagnose, html, latex, workdir::WorkDir, RenderAttempt};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GeneratePdfRequest {
    pub template: String,
    #[serde(default)]
    pub values: ValueMap,
}

#[derive(Debug, Deserialize)]
pub struct GeneratePdfFromHtmlRequest {
    pub html: String,
    #[serde(default)]
    pub values: ValueMap,
}

/// POST /generate-pdf (JSON: `{template, values}`)
///
/// Fills the LaTeX template and runs the compiler fallback chain inside a
/// request-private working directory.
pub async fn handle_generate_pdf(
    State(_state): State<AppState>,
    Json(request): Json<GeneratePdfRequest>,
) -> Result<Response, AppError> {
    if request.template.trim().is_empty() {
        return Err(AppError::Validation("template cannot be empty".to_string()));
    }

    let filled = fill_latex(&request.template, &request.values)
        .map_err(|e| AppError::UnprocessableEntity(e.to_string()))?;

    let dir = WorkDir::create().await.map_err(AppError::Internal)?;
    let result = latex::render_latex(dir.path(), &filled).await;
    dir.cleanup().await;

    match result {
        Ok(bytes) => Ok(pdf_response(bytes, "resume.pdf")),
        Err(failure) => {
            let hints = diagnose(&failure.attempts);
            Err(AppError::RenderExhausted {
                attempts: failure.attempts,
                hints,
            })
        }
    }
}

/// POST /generate-pdf-from-html (JSON: `{html, values}`)
///
/// Fills `{{id}}` placeholders (no escaping) and prints via headless
/// Chromium. A failure is reported through the same attempt-log shape as
/// the LaTeX path, with a single attempt entry.
pub async fn handle_generate_pdf_from_html(
    State(_state): State<AppState>,
    Json(request): Json<GeneratePdfFromHtmlRequest>,
) -> Result<Response, AppError> {
    if request.html.trim().is_empty() {
        return Err(AppError::Validation("html cannot be empty".to_string()));
    }

    let filled = fill_html(&request.html, &request.values);

    match html::render_html(&filled).await {
        Ok(bytes) => Ok(pdf_response(bytes, "resume.pdf")),
        Err(e) => {
            let attempts = vec![RenderAttempt {
                backend: "chromium".to_string(),
                command: "Page.printToPDF".to_string(),
                succeeded: false,
                error: Some(format!("{e:#}")),
                log_tail: String::new(),
            }];
            let hints = vec![
                "Ensure a Chrome or Chromium binary is installed and on PATH".to_string(),
            ];
            Err(AppError::RenderExhausted { attempts, hints })
        }
    }
}

fn pdf_response(bytes: Vec<u8>, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}
