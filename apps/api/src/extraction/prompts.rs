// All LLM prompt constants for the Extraction module.

/// Field extraction prompt template. Replace `{source_note}` and
/// `{document_content}` before sending.
///
/// The upstream model is a free-text generator, so the JSON-only framing is
/// advisory; the response cleaner in `extraction` copes with prose and
/// code fences anyway.
pub const FIELD_EXTRACTION_PROMPT_TEMPLATE: &str = r#"You are analyzing {source_note} to find every value a person would customize when building their own resume from it.

Return ONLY a JSON array. No prose, no markdown code fences, no explanations.

Each array element describes one fillable field:
[
  {
    "id": "full_name",
    "label": "Full Name",
    "default": "Jane Doe",
    "section": "Header"
  }
]

Rules:
- "id": short snake_case identifier, lowercase letters, digits and underscores only
- "label": human-readable name for the form field
- "default": the current value found in the document, or "" if none
- "section": optional grouping such as "Header", "Experience", "Education"
- Include names, contact details, job titles, companies, dates, skills, and summary text
- Do NOT include structural commands or styling as fields

DOCUMENT:
{document_content}"#;

/// Note describing a LaTeX template source.
pub const SOURCE_NOTE_TEMPLATE: &str = "a LaTeX resume template";

/// Note describing text recovered from an uploaded, already-rendered resume.
pub const SOURCE_NOTE_RENDERED: &str =
    "the text content extracted from an uploaded resume document";

/// Fixed prompt used by the connectivity check endpoint.
pub const PING_PROMPT: &str =
    "Reply with exactly the word: pong";
