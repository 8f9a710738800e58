pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::extraction::handlers::{
    handle_test_gemini, handle_upload_pdf, handle_upload_tex, MAX_UPLOAD_BYTES,
};
use crate::lint::handle_validate_latex;
use crate::render::handlers::{handle_generate_pdf, handle_generate_pdf_from_html};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/test-gemini", get(handle_test_gemini))
        .route("/validate-latex", post(handle_validate_latex))
        .route("/upload-tex", post(handle_upload_tex))
        .route("/upload-pdf", post(handle_upload_pdf))
        .route("/generate-pdf", post(handle_generate_pdf))
        .route("/generate-pdf-from-html", post(handle_generate_pdf_from_html))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
