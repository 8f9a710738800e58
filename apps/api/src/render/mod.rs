//! Render pipeline — ordered LaTeX backend fallback and the headless-browser
//! HTML path, plus the per-request working directory.

pub mod handlers;
pub mod html;
pub mod latex;
pub mod workdir;

use serde::Serialize;

/// Log record of one backend's try during rendering. The full ordered list
/// is returned to the caller on total failure so they can see which backend
/// got how far.
#[derive(Debug, Clone, Serialize)]
pub struct RenderAttempt {
    pub backend: String,
    pub command: String,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub log_tail: String,
}

/// Every backend failed; carries the full attempt log.
#[derive(Debug)]
pub struct RenderFailure {
    pub attempts: Vec<RenderAttempt>,
}

/// Scans the captured logs for known failure markers and turns each into a
/// human hint, most specific first. Each marker contributes independently.
pub fn diagnose(attempts: &[RenderAttempt]) -> Vec<String> {
    let combined: String = attempts
        .iter()
        .flat_map(|a| [a.log_tail.as_str(), a.error.as_deref().unwrap_or("")])
        .collect();

    let mut hints = Vec::new();

    if combined.contains("! LaTeX Error: File") {
        hints.push(
            "A package or input file is missing; install the referenced package or drop the \\usepackage line".to_string(),
        );
    }
    if combined.contains("! Undefined control sequence") {
        hints.push(
            "The template uses a command no loaded package defines; check macro spellings".to_string(),
        );
    }
    if combined.contains("! LaTeX Error") {
        hints.push("The filled template has a LaTeX syntax error; check the log tail".to_string());
    }
    if combined.contains("Emergency stop") || combined.contains("Fatal error occurred") {
        hints.push(
            "The compiler aborted before producing output; the source may be truncated".to_string(),
        );
    }
    if attempts.iter().all(|a| a.log_tail.is_empty()) {
        hints.push(
            "No compiler produced any output; install tectonic, latexmk, or pdflatex".to_string(),
        );
    }

    hints
}
