//! Structural LaTeX lint backing `/validate-latex`.
//!
//! A cheap pre-flight check, not a compiler: it spots the failure modes the
//! render pipeline would otherwise only report after a full compile attempt.

use axum::Json;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::errors::AppError;

static NEWCOMMAND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\newcommand\{\\[a-zA-Z@]+\}\{").expect("static regex"));
static DEF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\def\\[a-zA-Z@]+\{").expect("static regex"));
static VAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\VAR\{[a-z0-9_]+\}").expect("static regex"));
static ANGLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<<[a-z0-9_]+>>").expect("static regex"));

#[derive(Debug, Serialize)]
pub struct LintReport {
    pub valid: bool,
    pub has_documentclass: bool,
    pub has_begin_document: bool,
    pub has_end_document: bool,
    pub balanced_braces: bool,
    pub has_placeholders: bool,
    pub warnings: Vec<String>,
}

pub fn lint_latex(source: &str) -> LintReport {
    let has_documentclass = source.contains(r"\documentclass");
    let has_begin_document = source.contains(r"\begin{document}");
    let has_end_document = source.contains(r"\end{document}");
    let balanced_braces = braces_balanced(source);
    let has_placeholders = NEWCOMMAND_RE.is_match(source)
        || DEF_RE.is_match(source)
        || VAR_RE.is_match(source)
        || ANGLE_RE.is_match(source);

    let mut warnings = Vec::new();
    if !has_documentclass {
        warnings.push(r"Missing \documentclass declaration".to_string());
    }
    if !has_begin_document {
        warnings.push(r"Missing \begin{document}".to_string());
    }
    if !has_end_document {
        warnings.push(r"Missing \end{document}".to_string());
    }
    if !balanced_braces {
        warnings.push("Braces appear unbalanced; the template may not compile".to_string());
    }
    if !has_placeholders {
        warnings.push(
            "No fillable placeholders detected; field extraction may find nothing".to_string(),
        );
    }

    LintReport {
        valid: has_documentclass && has_begin_document && has_end_document && balanced_braces,
        has_documentclass,
        has_begin_document,
        has_end_document,
        balanced_braces,
        has_placeholders,
        warnings,
    }
}

/// Counts `{`/`}` depth, skipping escaped braces.
fn braces_balanced(source: &str) -> bool {
    let mut depth: i64 = 0;
    let mut escaped = false;
    for c in source.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                // A close before its open is unbalanced no matter what
                // comes later, even if the final depth works out to zero.
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// POST /validate-latex (text body)
pub async fn handle_validate_latex(body: String) -> Result<Json<LintReport>, AppError> {
    if body.trim().is_empty() {
        return Err(AppError::Validation(
            "Request body must contain LaTeX source".to_string(),
        ));
    }
    Ok(Json(lint_latex(&body)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str =
        r"\documentclass{article}\newcommand{\name}{Jane}\begin{document}\name\end{document}";

    #[test]
    fn test_minimal_template_is_valid() {
        let report = lint_latex(MINIMAL);
        assert!(report.valid);
        assert!(report.has_placeholders);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_missing_end_document_flagged() {
        let report = lint_latex(r"\documentclass{article}\begin{document}hello");
        assert!(!report.valid);
        assert!(!report.has_end_document);
        assert!(report.warnings.iter().any(|w| w.contains(r"\end{document}")));
    }

    #[test]
    fn test_unbalanced_braces_flagged() {
        let report = lint_latex(r"\documentclass{article}\begin{document}{\end{document}");
        assert!(!report.balanced_braces);
        assert!(!report.valid);
    }

    #[test]
    fn test_close_before_open_is_unbalanced_despite_zero_depth() {
        let report = lint_latex(r"\documentclass{article}\begin{document}}{\end{document}");
        assert!(!report.balanced_braces);
        assert!(!report.valid);
    }

    #[test]
    fn test_escaped_braces_do_not_affect_balance() {
        let report = lint_latex(r"\documentclass{article}\begin{document}\{\end{document}");
        assert!(report.balanced_braces);
    }

    #[test]
    fn test_no_placeholders_warns_but_stays_valid() {
        let report = lint_latex(r"\documentclass{article}\begin{document}static\end{document}");
        assert!(report.valid);
        assert!(!report.has_placeholders);
        assert!(report.warnings.iter().any(|w| w.contains("placeholders")));
    }

    #[test]
    fn test_angle_and_var_placeholders_detected() {
        assert!(lint_latex(r"\VAR{name}").has_placeholders);
        assert!(lint_latex("<<email>>").has_placeholders);
        assert!(lint_latex(r"\def\city{Oslo}").has_placeholders);
    }
}
