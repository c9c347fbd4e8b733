//! Concrete pipeline steps.

pub mod answer;
pub mod answer_stream;
pub mod mindmap;
pub mod retrieve;
pub mod search_queries;
pub mod suggestions;

pub use answer::{GenerateAnswerStep, NO_EVIDENCE_ANSWER};
pub use answer_stream::GenerateAnswerStreamStep;
pub use mindmap::{GenerateMindmapStep, RetrieveChunksStep};
pub use retrieve::{GlobalRetrieveContextStep, RetrieveContextStep, SynthesisRetrieveContextStep};
pub use search_queries::GenerateSearchQueriesStep;
pub use suggestions::GenerateSuggestionsStep;

use once_cell::sync::Lazy;
use regex::Regex;

static JSON_ARRAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[\s\S]*\]").unwrap());
static JSON_OBJECT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[\s\S]*\}").unwrap());

/// Widest `[...]` span in model output, parsed as a list of strings.
pub(crate) fn extract_string_array(text: &str) -> Option<Vec<String>> {
    let span = JSON_ARRAY.find(text)?;
    serde_json::from_str(span.as_str()).ok()
}

/// Widest `{...}` span in model output, parsed as JSON.
pub(crate) fn extract_json_object(text: &str) -> Option<serde_json::Value> {
    let span = JSON_OBJECT.find(text)?;
    serde_json::from_str(span.as_str()).ok()
}

/// First `max` characters of `text`.
pub(crate) fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_string_array_from_chatter() {
        let text = "Sure! Here you go:\n```json\n[\"a\", \"b\"]\n```";
        assert_eq!(extract_string_array(text), Some(vec!["a".into(), "b".into()]));
        assert_eq!(extract_string_array("no list here"), None);
        assert_eq!(extract_string_array("[1, 2]"), None);
    }

    #[test]
    fn test_extract_json_object() {
        let value = extract_json_object("prefix {\"nodes\": []} suffix").unwrap();
        assert!(value["nodes"].is_array());
        assert!(extract_json_object("{broken").is_none());
    }

    #[test]
    fn test_truncate_chars_is_char_safe() {
        assert_eq!(truncate_chars("Tiếng Việt", 5), "Tiếng");
        assert_eq!(truncate_chars("short", 50), "short");
        assert_eq!(truncate_chars("", 3), "");
    }
}
