//! Document ingestion adapter — wraps the out-of-process text/layout
//! extractor behind a request/response contract.
//!
//! The subprocess is a black box: arguments in (file path, page index), one
//! JSON object on stdout, exit status. Its absence is a routine, reportable
//! failure, never a startup condition.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::Config;

/// Wall-clock budget for one extractor run. The subprocess has no internal
/// timeout of its own, so the adapter enforces one.
const EXTRACTOR_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("text extractor could not be started: {0}")]
    Spawn(String),

    #[error("text extractor timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("text extractor exited with {status}: {detail}")]
    Crashed { status: String, detail: String },

    #[error("text extractor output was not the expected JSON object: {0}")]
    MalformedOutput(String),

    // The subprocess's own error message, passed through verbatim.
    #[error("{0}")]
    Reported(String),
}

impl IngestError {
    pub fn troubleshooting(&self) -> Vec<String> {
        match self {
            IngestError::Spawn(_) => vec![
                "Check OCR_PYTHON points at a Python interpreter".to_string(),
                "Check OCR_SCRIPT points at the extractor script".to_string(),
            ],
            IngestError::Timeout { .. } => {
                vec!["The PDF may be very large; try a single page".to_string()]
            }
            IngestError::Crashed { .. } | IngestError::MalformedOutput(_) => vec![
                "Run the extractor script by hand against the same file".to_string(),
                "Ensure its Python dependencies are installed".to_string(),
            ],
            IngestError::Reported(_) => vec![
                "Ensure the PDF file is valid and readable".to_string(),
                "Check the requested page exists in the document".to_string(),
            ],
        }
    }
}

/// One positioned text block from the extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub bbox: [i64; 4],
    pub label: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentMetadata {
    pub page_number: usize,
    pub num_blocks: usize,
    pub total_pages: usize,
}

/// Successful extractor payload: text-like content plus structural blocks.
#[derive(Debug, Deserialize)]
pub struct ExtractedDocument {
    pub html: String,
    pub markdown: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
    pub metadata: DocumentMetadata,
}

/// Runs the extractor subprocess against one page of a PDF on disk.
pub async fn extract_document(
    config: &Config,
    pdf_path: &Path,
    page: usize,
) -> Result<ExtractedDocument, IngestError> {
    debug!(
        "Running text extractor: {} {} {:?} {}",
        config.ocr_python, config.ocr_script, pdf_path, page
    );

    let mut cmd = Command::new(&config.ocr_python);
    cmd.arg(&config.ocr_script)
        .arg(pdf_path)
        .arg(page.to_string());

    let output = run_extractor(cmd, Duration::from_secs(EXTRACTOR_TIMEOUT_SECS)).await?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        debug!("Extractor stderr: {}", stderr.trim());
    }

    parse_extractor_output(&stdout, output.status.success(), &stderr)
}

/// Runs one extractor invocation under a wall-clock budget.
///
/// The child is killed when the budget expires; an orphaned interpreter
/// would keep the uploaded PDF open long after the request was answered.
async fn run_extractor(
    mut cmd: Command,
    budget: Duration,
) -> Result<std::process::Output, IngestError> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(budget, cmd.output()).await {
        Err(_) => Err(IngestError::Timeout {
            secs: budget.as_secs(),
        }),
        Ok(Err(e)) => Err(IngestError::Spawn(e.to_string())),
        Ok(Ok(output)) => Ok(output),
    }
}

/// Interprets one finished extractor run.
///
/// The script prints its JSON result on stdout for both success and failure
/// and mirrors that in its exit status, so stdout is parsed first and the
/// exit status only matters when stdout is unusable.
fn parse_extractor_output(
    stdout: &str,
    exited_ok: bool,
    stderr: &str,
) -> Result<ExtractedDocument, IngestError> {
    let payload: Value = match serde_json::from_str(stdout.trim()) {
        Ok(v) => v,
        Err(e) => {
            if exited_ok {
                return Err(IngestError::MalformedOutput(e.to_string()));
            }
            warn!("Extractor crashed with unreadable stdout");
            return Err(IngestError::Crashed {
                status: "nonzero exit".to_string(),
                detail: tail(stderr, 400),
            });
        }
    };

    if !payload.is_object() {
        return Err(IngestError::MalformedOutput(
            "top-level value is not an object".to_string(),
        ));
    }

    if payload.get("success").and_then(Value::as_bool) != Some(true) {
        let message = payload
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("extractor reported failure without a message")
            .to_string();
        return Err(IngestError::Reported(message));
    }

    serde_json::from_value(payload).map_err(|e| IngestError::MalformedOutput(e.to_string()))
}

fn tail(s: &str, max_chars: usize) -> String {
    let count = s.chars().count();
    if count <= max_chars {
        return s.trim().to_string();
    }
    s.chars().skip(count - max_chars).collect::<String>().trim().to_string()
}
