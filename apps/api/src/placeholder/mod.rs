//! Placeholder engine — pure text substitution over the template dialects.
//!
//! LaTeX templates may carry a field in five shapes:
//! `\newcommand{\id}{default}`, `\def\id{default}`, `{id}`, `\VAR{id}`,
//! and `<<id>>`. HTML fragments use `{{id}}` only. Values bound for LaTeX
//! are escaped once before any substitution; HTML values pass through raw.

use regex::{Captures, Regex};
use std::collections::HashMap;
use thiserror::Error;

/// Client-supplied field values, keyed by normalized field id.
pub type ValueMap = HashMap<String, String>;

#[derive(Debug, Error)]
pub enum PlaceholderError {
    #[error("could not build substitution pattern for field '{id}': {source}")]
    Pattern {
        id: String,
        #[source]
        source: regex::Error,
    },
}

/// Escapes LaTeX-special characters in a user value.
///
/// Single-pass over the input, so the backslashes it introduces are never
/// re-escaped. Only one application is contractual; callers must not apply
/// it twice.
pub fn escape_latex(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '{' => out.push_str(r"\{"),
            '}' => out.push_str(r"\}"),
            '$' | '&' | '%' | '#' | '^' | '_' | '~' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Fills a LaTeX template with escaped values.
///
/// For each field the five dialect passes run in a fixed order, each pass
/// operating on the output of the previous. Macro-definition passes replace
/// only the default-value group and keep the signature; the value group
/// matches the shortest non-brace span (nested braces in defaults are not
/// supported).
pub fn fill_latex(template: &str, values: &ValueMap) -> Result<String, PlaceholderError> {
    let mut out = template.to_string();
    for (id, value) in values {
        out = substitute_field(&out, id, &escape_latex(value))?;
    }
    Ok(out)
}

/// Fills an HTML fragment: `{{id}}` tokens only, values inserted verbatim.
pub fn fill_html(template: &str, values: &ValueMap) -> String {
    let mut out = template.to_string();
    for (id, value) in values {
        out = out.replace(&format!("{{{{{id}}}}}"), value);
    }
    out
}

fn substitute_field(input: &str, id: &str, value: &str) -> Result<String, PlaceholderError> {
    let esc = regex::escape(id);

    // 1. \newcommand{\id}{default} — replace the default group only.
    let mut out = replace_all(
        input,
        id,
        &format!(r"\\newcommand\{{\\{esc}\}}\{{[^{{}}]*\}}"),
        format!(r"\newcommand{{\{id}}}{{{value}}}"),
    )?;

    // 2. \def\id{default} — same discipline.
    out = replace_all(
        &out,
        id,
        &format!(r"\\def\\{esc}\{{[^{{}}]*\}}"),
        format!(r"\def\{id}{{{value}}}"),
    )?;

    // 3. Bare braced token {id}.
    out = replace_all(&out, id, &format!(r"\{{{esc}\}}"), value.to_string())?;

    // 4. Tagged token \VAR{id}.
    out = replace_all(&out, id, &format!(r"\\VAR\{{{esc}\}}"), value.to_string())?;

    // 5. Angle-bracket token <<id>>.
    out = replace_all(&out, id, &format!(r"<<{esc}>>"), value.to_string())?;

    Ok(out)
}

fn replace_all(
    input: &str,
    id: &str,
    pattern: &str,
    replacement: String,
) -> Result<String, PlaceholderError> {
    let re = Regex::new(pattern).map_err(|source| PlaceholderError::Pattern {
        id: id.to_string(),
        source,
    })?;
    // Closure replacer so `$` and `\` in escaped values stay literal.
    Ok(re
        .replace_all(input, |_: &Captures| replacement.clone())
        .into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> ValueMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_escape_percent_ampersand_dollar() {
        assert_eq!(escape_latex("100% & $5"), r"100\% \& \$5");
    }

    #[test]
    fn test_escape_backslash_not_double_escaped() {
        // The braces inside \textbackslash{} must survive untouched.
        assert_eq!(escape_latex(r"\"), r"\textbackslash{}");
        assert_eq!(escape_latex(r"a\b"), r"a\textbackslash{}b");
    }

    #[test]
    fn test_escape_braces_and_underscore() {
        assert_eq!(escape_latex("foo_{bar}"), r"foo\_\{bar\}");
    }

    #[test]
    fn test_escape_caret_and_tilde() {
        assert_eq!(escape_latex("x^2 ~y"), r"x\^2 \~y");
    }

    #[test]
    fn test_newcommand_default_replaced_signature_kept() {
        let template = r"\documentclass{article}\newcommand{\name}{Old}\begin{document}\name\end{document}";
        let filled = fill_latex(template, &values(&[("name", "A & B")])).unwrap();
        assert!(filled.contains(r"\newcommand{\name}{A \& B}"));
        assert!(filled.contains(r"\documentclass{article}"));
    }

    #[test]
    fn test_def_form_default_replaced() {
        let template = r"\def\email{old@example.com} \email";
        let filled = fill_latex(template, &values(&[("email", "new@example.com")])).unwrap();
        assert!(filled.contains(r"\def\email{new@example.com}"));
    }

    #[test]
    fn test_bare_braced_token_replaced() {
        let filled = fill_latex("Hello {name}!", &values(&[("name", "Jane")])).unwrap();
        assert_eq!(filled, "Hello Jane!");
    }

    #[test]
    fn test_angle_bracket_token_replaced() {
        let filled = fill_latex("Contact: <<phone>>", &values(&[("phone", "555-0100")])).unwrap();
        assert_eq!(filled, "Contact: 555-0100");
    }

    #[test]
    fn test_all_dialects_replaced_unrelated_text_untouched() {
        let template = concat!(
            r"\newcommand{\name}{Default} ",
            r"\def\name{Default} ",
            "{name} ",
            r"\VAR{name} ",
            "<<name>> ",
            "untouched trailer"
        );
        let filled = fill_latex(template, &values(&[("name", "Jane")])).unwrap();
        assert!(filled.contains(r"\newcommand{\name}{Jane}"));
        assert!(filled.contains(r"\def\name{Jane}"));
        assert!(!filled.contains("{name}"));
        assert!(!filled.contains(r"\VAR{name}"));
        assert!(!filled.contains("<<name>>"));
        assert!(filled.ends_with("untouched trailer"));
    }

    #[test]
    fn test_value_with_dollar_inserted_literally() {
        // `$` in the replacement must not be treated as a capture-group ref.
        let filled = fill_latex("Salary: {salary}", &values(&[("salary", "$120k")])).unwrap();
        assert_eq!(filled, r"Salary: \$120k");
    }

    #[test]
    fn test_unknown_field_leaves_template_unchanged() {
        let template = "Hello {name}";
        let filled = fill_latex(template, &values(&[("other", "x")])).unwrap();
        assert_eq!(filled, template);
    }

    #[test]
    fn test_nested_brace_default_not_consumed() {
        // Shortest non-brace span only: a nested-brace default does not match,
        // so the macro is left alone rather than mangled.
        let template = r"\newcommand{\name}{\textbf{Old}}";
        let filled = fill_latex(template, &values(&[("name", "Jane")])).unwrap();
        assert_eq!(filled, template);
    }

    #[test]
    fn test_fill_html_double_brace_no_escaping() {
        let vals = values(&[("name", "A & B"), ("city", "Oslo")]);
        let filled = fill_html("<p>{{name}} — {{city}}</p>", &vals);
        assert_eq!(filled, "<p>A & B — Oslo</p>");
    }

    #[test]
    fn test_fill_html_leaves_single_braces_alone() {
        let vals = values(&[("name", "Jane")]);
        assert_eq!(fill_html("{name} {{name}}", &vals), "{name} Jane");
    }
}
