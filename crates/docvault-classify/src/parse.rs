//! Best-effort parsing of free-form model output
//!
//! The inference service replies with prose; we match `Category:` and
//! `Summary:` lines out of it. Parsing is deliberately isolated here so the
//! strategy can be swapped without touching the pipeline.

use docvault_core::Classification;
use once_cell::sync::Lazy;
use regex::Regex;

static CATEGORY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)category:\s*(.+)").expect("category pattern is valid"));

static SUMMARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)summary:\s*(.+)").expect("summary pattern is valid"));

/// Parse a model response into a classification.
///
/// Case-insensitive, first match wins, values trimmed. A field that does not
/// match keeps its default; a response matching neither yields
/// [`Classification::unknown`].
pub fn parse_analysis(analysis: &str) -> Classification {
    let mut classification = Classification::unknown();

    if let Some(captures) = CATEGORY_RE.captures(analysis) {
        let value = captures[1].trim();
        if !value.is_empty() {
            classification.category = value.to_string();
        }
    }

    if let Some(captures) = SUMMARY_RE.captures(analysis) {
        let value = captures[1].trim();
        if !value.is_empty() {
            classification.summary = value.to_string();
        }
    }

    classification
}
