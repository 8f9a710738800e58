//! Axum route handlers for the extraction surface.

use std::time::Instant;

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::extraction::{extract_schema, prompts, DocumentKind};
use crate::ingest::{extract_document, Block};
use crate::render::workdir::WorkDir;
use crate::schema::Schema;
use crate::state::AppState;

/// Hard cap on uploaded PDF size. Also enforced at the router layer.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UploadTexResponse {
    pub schema: Schema,
    pub meta: UploadTexMeta,
}

#[derive(Debug, Serialize)]
pub struct UploadTexMeta {
    pub field_count: usize,
    pub content_length: usize,
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct UploadPdfResponse {
    pub schema: Schema,
    #[serde(rename = "originalHtml")]
    pub original_html: String,
    pub markdown: String,
    pub blocks: Vec<Block>,
    pub meta: UploadPdfMeta,
}

#[derive(Debug, Serialize)]
pub struct UploadPdfMeta {
    pub page_number: usize,
    pub total_pages: usize,
    pub num_blocks: usize,
    pub field_count: usize,
}

#[derive(Debug, Serialize)]
pub struct TestGeminiResponse {
    pub response: String,
    pub latency_ms: u128,
    pub model: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /test-gemini
///
/// Round-trips a fixed prompt through the generation service and reports
/// the observed latency. Connectivity smoke check, nothing more.
pub async fn handle_test_gemini(
    State(state): State<AppState>,
) -> Result<Json<TestGeminiResponse>, AppError> {
    let started = Instant::now();
    let response = state
        .llm
        .generate(prompts::PING_PROMPT)
        .await
        .map_err(|e| AppError::Llm(e.to_string()))?;

    Ok(Json(TestGeminiResponse {
        response,
        latency_ms: started.elapsed().as_millis(),
        model: state.llm.model().to_string(),
    }))
}

/// POST /upload-tex (text body: LaTeX source)
///
/// Extracts the fillable-field schema from a LaTeX template.
pub async fn handle_upload_tex(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<UploadTexResponse>, AppError> {
    if body.trim().is_empty() {
        return Err(AppError::Validation(
            "Request body must contain LaTeX source".to_string(),
        ));
    }

    let schema = extract_schema(&body, DocumentKind::Template, &state.llm).await?;
    info!("upload-tex: extracted {} field(s)", schema.len());

    Ok(Json(UploadTexResponse {
        meta: UploadTexMeta {
            field_count: schema.len(),
            content_length: body.len(),
            model: state.llm.model().to_string(),
        },
        schema,
    }))
}

/// POST /upload-pdf (multipart: `file` ≤10MB PDF, optional `page`)
///
/// Ingests the PDF through the external extractor subprocess, then runs
/// field extraction over the recovered text.
pub async fn handle_upload_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadPdfResponse>, AppError> {
    let mut file_bytes: Option<bytes::Bytes> = None;
    let mut page: usize = 0;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let content_type = field.content_type().map(str::to_string);
                if content_type.as_deref() != Some("application/pdf") {
                    return Err(AppError::Validation(
                        "Only application/pdf uploads are accepted".to_string(),
                    ));
                }
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
                if data.len() > MAX_UPLOAD_BYTES {
                    return Err(AppError::Validation(
                        "Uploaded file exceeds the 10MB limit".to_string(),
                    ));
                }
                file_bytes = Some(data);
            }
            Some("page") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid page field: {e}")))?;
                page = text
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| AppError::Validation("page must be a non-negative integer".to_string()))?;
            }
            _ => {}
        }
    }

    let data = file_bytes
        .ok_or_else(|| AppError::Validation("Missing 'file' field in upload".to_string()))?;
    if data.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }

    // Request-private scratch directory for the extractor subprocess input.
    let scratch = WorkDir::create().await.map_err(AppError::Internal)?;
    let pdf_path = scratch.path().join("upload.pdf");
    if let Err(e) = tokio::fs::write(&pdf_path, &data).await {
        scratch.cleanup().await;
        return Err(AppError::Internal(anyhow::anyhow!(
            "failed to stage upload for extraction: {e}"
        )));
    }

    let result = extract_document(&state.config, &pdf_path, page).await;
    scratch.cleanup().await;
    let document = result?;

    if document.markdown.trim().is_empty() {
        return Err(AppError::Validation(
            "No text could be extracted from the uploaded PDF".to_string(),
        ));
    }

    let schema = extract_schema(&document.markdown, DocumentKind::RenderedDocument, &state.llm).await?;
    info!(
        "upload-pdf: page {} of {}, {} block(s), {} field(s)",
        document.metadata.page_number,
        document.metadata.total_pages,
        document.metadata.num_blocks,
        schema.len()
    );

    Ok(Json(UploadPdfResponse {
        meta: UploadPdfMeta {
            page_number: document.metadata.page_number,
            total_pages: document.metadata.total_pages,
            num_blocks: document.metadata.num_blocks,
            field_count: schema.len(),
        },
        schema,
        original_html: document.html,
        markdown: document.markdown,
        blocks: document.blocks,
    }))
}
