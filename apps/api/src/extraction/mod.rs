//! Extraction orchestrator — builds the prompt, calls Gemini once, repairs
//! the free-text response into JSON, and delegates to the schema validator.

pub mod handlers;
pub mod prompts;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm_client::{LlmClient, LlmError, GENERATION_TIMEOUT_SECS};
use crate::schema::{validate_fields, Schema};

/// How much raw/cleaned text to carry in diagnostics.
const PREVIEW_CHARS: usize = 240;

/// What kind of document the content came from. Drives prompt phrasing and
/// the troubleshooting advice attached to failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Template,
    RenderedDocument,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("generation service did not respond within {secs}s")]
    Timeout { secs: u64 },

    #[error("generation call failed: {0}")]
    Upstream(#[source] LlmError),

    #[error("model response did not contain a JSON array")]
    MalformedResponse {
        raw_preview: String,
        cleaned_preview: String,
    },

    #[error("model response was not valid JSON: {message}")]
    Parse { message: String, preview: String },

    #[error("model response parsed but was not a JSON array")]
    UnexpectedShape,

    #[error("no usable fields found in the document")]
    NoFieldsFound,
}

impl ExtractError {
    pub fn code(&self) -> &'static str {
        match self {
            ExtractError::Timeout { .. } => "UPSTREAM_TIMEOUT",
            ExtractError::Upstream(_) => "UPSTREAM_ERROR",
            ExtractError::MalformedResponse { .. } => "MALFORMED_RESPONSE",
            ExtractError::Parse { .. } => "PARSE_ERROR",
            ExtractError::UnexpectedShape => "UNEXPECTED_SHAPE",
            ExtractError::NoFieldsFound => "NO_FIELDS_FOUND",
        }
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            ExtractError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::BAD_GATEWAY,
        }
    }

    /// Advisory troubleshooting strings surfaced to the caller alongside the
    /// structured error. Not part of the functional contract.
    pub fn troubleshooting(&self) -> Vec<String> {
        match self {
            ExtractError::Timeout { .. } => vec![
                "The generation service is slow or unreachable; try again".to_string(),
                "Very large documents take longer; trim boilerplate before uploading".to_string(),
            ],
            ExtractError::Upstream(_) => vec![
                "Verify GEMINI_API_KEY is valid".to_string(),
                "Check that the configured GEMINI_MODEL exists".to_string(),
            ],
            ExtractError::MalformedResponse { .. } | ExtractError::Parse { .. } => vec![
                "The model answered in prose instead of JSON; retrying usually helps".to_string(),
                "The previews in this error show what was received".to_string(),
            ],
            ExtractError::UnexpectedShape => {
                vec!["The model returned JSON that was not an array; try again".to_string()]
            }
            ExtractError::NoFieldsFound => vec![
                "The document may contain no user-fillable values".to_string(),
                "For templates, make sure placeholder values are present in the source"
                    .to_string(),
            ],
        }
    }
}

/// Extracts a field schema from free-form document content.
///
/// One logical attempt: a single Gemini call under a hard timeout, then the
/// repair-and-validate chain. No failure mode is retried here.
pub async fn extract_schema(
    content: &str,
    kind: DocumentKind,
    llm: &LlmClient,
) -> Result<Schema, ExtractError> {
    let source_note = match kind {
        DocumentKind::Template => prompts::SOURCE_NOTE_TEMPLATE,
        DocumentKind::RenderedDocument => prompts::SOURCE_NOTE_RENDERED,
    };
    let prompt = prompts::FIELD_EXTRACTION_PROMPT_TEMPLATE
        .replace("{source_note}", source_note)
        .replace("{document_content}", content);

    let raw = llm.generate(&prompt).await.map_err(|e| match e {
        LlmError::Timeout { .. } => ExtractError::Timeout {
            secs: GENERATION_TIMEOUT_SECS,
        },
        other => ExtractError::Upstream(other),
    })?;

    parse_schema_response(&raw)
}

/// Repairs and validates one raw model response into a schema.
///
/// Split out from [`extract_schema`] so the whole recovery chain is testable
/// without a live LLM.
pub fn parse_schema_response(raw: &str) -> Result<Schema, ExtractError> {
    let cleaned = clean_response(raw);

    if !(cleaned.starts_with('[') && cleaned.ends_with(']')) {
        return Err(ExtractError::MalformedResponse {
            raw_preview: preview(raw),
            cleaned_preview: preview(&cleaned),
        });
    }

    let parsed: Value = serde_json::from_str(&cleaned).map_err(|e| ExtractError::Parse {
        message: e.to_string(),
        preview: preview(&cleaned),
    })?;

    let items = parsed.as_array().ok_or(ExtractError::UnexpectedShape)?;

    let (schema, dropped) = validate_fields(items);
    if dropped > 0 {
        warn!("Schema validator dropped {dropped} malformed item(s)");
    }
    if schema.is_empty() {
        // Zero fields is a valid validator outcome, but at this boundary it
        // means the extraction attempt itself was unproductive.
        return Err(ExtractError::NoFieldsFound);
    }

    debug!("Extracted {} field(s)", schema.len());
    Ok(schema)
}

/// Recovery heuristic for free-form model output.
///
/// Strips leading prose up through a code-fence opener, a trailing fence
/// closer, then any stray fence markers; finally narrows to the first
/// `[` .. last `]` span if one exists. The upstream output format is not
/// contractually guaranteed, so all of this is best-effort.
fn clean_response(raw: &str) -> String {
    let mut text = raw.trim().to_string();

    if let Some(idx) = text.find("```") {
        let after = &text[idx + 3..];
        let after = after.strip_prefix("json").unwrap_or(after);
        text = after.trim_start().to_string();
    }
    if let Some(stripped) = text.strip_suffix("```") {
        text = stripped.trim_end().to_string();
    }
    text = text.replace("```", "");

    if let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) {
        if start < end {
            text = text[start..=end].to_string();
        }
    }

    text.trim().to_string()
}

fn preview(s: &str) -> String {
    if s.chars().count() <= PREVIEW_CHARS {
        return s.to_string();
    }
    let truncated: String = s.chars().take(PREVIEW_CHARS).collect();
    format!("{truncated}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fenced_response() {
        let raw = "```json\n[{\"id\":\"name\",\"label\":\"Full Name\",\"default\":\"Jane\"}]\n```";
        let schema = parse_schema_response(raw).unwrap();
        assert_eq!(schema.len(), 1);
        assert_eq!(schema[0].id, "name");
        assert_eq!(schema[0].label, "Full Name");
        assert_eq!(schema[0].default, "Jane");
    }

    #[test]
    fn test_parse_response_wrapped_in_prose() {
        let raw = "Sure! Here are the fields:\n```\n[{\"id\":\"city\",\"label\":\"City\"}]\n```\nLet me know if you need more.";
        let schema = parse_schema_response(raw).unwrap();
        assert_eq!(schema.len(), 1);
        assert_eq!(schema[0].id, "city");
    }

    #[test]
    fn test_parse_bare_array_no_fences() {
        let raw = r#"[{"id":"role","label":"Role"}]"#;
        assert_eq!(parse_schema_response(raw).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_brackets_is_malformed_not_parse_error() {
        let raw = "I could not find any fields in this document.";
        match parse_schema_response(raw) {
            Err(ExtractError::MalformedResponse { raw_preview, .. }) => {
                assert!(raw_preview.contains("could not find"));
            }
            other => panic!("expected MalformedResponse, got {other:?}"),
        }
    }

    #[test]
    fn test_unbalanced_brackets_is_malformed_not_parse_error() {
        // Opens a bracket but never closes one, so no span is found and the
        // candidate fails the shape check before the parser ever runs.
        let raw = "[{\"id\":\"name\"";
        assert!(matches!(
            parse_schema_response(raw),
            Err(ExtractError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_invalid_json_inside_brackets_is_parse_error() {
        let raw = "[{\"id\": \"name\",]";
        match parse_schema_response(raw) {
            Err(ExtractError::Parse { message, .. }) => assert!(!message.is_empty()),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn test_array_of_invalid_items_is_no_fields_found() {
        let raw = r#"[{"id": 42}, "just a string"]"#;
        assert!(matches!(
            parse_schema_response(raw),
            Err(ExtractError::NoFieldsFound)
        ));
    }

    #[test]
    fn test_empty_array_is_no_fields_found() {
        assert!(matches!(
            parse_schema_response("[]"),
            Err(ExtractError::NoFieldsFound)
        ));
    }

    #[test]
    fn test_clean_response_strips_stray_fences() {
        let cleaned = clean_response("```json\n[1]\n``` trailing ```");
        assert_eq!(cleaned, "[1]");
    }

    #[test]
    fn test_clean_response_narrows_to_bracket_span() {
        let cleaned = clean_response("note [1, 2] after");
        assert_eq!(cleaned, "[1, 2]");
    }

    #[test]
    fn test_preview_truncates_long_text() {
        let long = "x".repeat(1000);
        let p = preview(&long);
        assert!(p.chars().count() <= PREVIEW_CHARS + 1);
        assert!(p.ends_with('…'));
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let malformed = ExtractError::MalformedResponse {
            raw_preview: String::new(),
            cleaned_preview: String::new(),
        };
        let parse = ExtractError::Parse {
            message: String::new(),
            preview: String::new(),
        };
        assert_ne!(malformed.code(), parse.code());
    }
}
