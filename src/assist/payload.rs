//! Pulling marker suggestions out of free-form model replies.
//!
//! Replies may wrap the JSON in a fenced code block, surround it with prose,
//! or both. Entries are passed on unfiltered; the marker normalizer decides
//! which of them are usable.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::AssistError;
use crate::timing::RawMarker;

fn fence_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)```").ok())
        .as_ref()
}

fn markers_object_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r#"(?s)\{.*"markers".*\}"#).ok())
        .as_ref()
}

/// Contents of the first fenced code block, or the whole text when there is none
fn unfence(text: &str) -> &str {
    fence_pattern()
        .and_then(|pattern| pattern.captures(text))
        .and_then(|captures| captures.get(1))
        .map_or(text, |body| body.as_str().trim())
}

/// Extract the `markers` array from a model reply
pub fn extract_markers(reply: &str) -> Result<Vec<RawMarker>, AssistError> {
    let body = unfence(reply);

    let object = markers_object_pattern()
        .and_then(|pattern| pattern.find(body))
        .ok_or(AssistError::MarkersNotFound)?;

    let document: Value = serde_json::from_str(object.as_str()).map_err(|e| AssistError::InvalidPayload {
        reason: e.to_string(),
    })?;

    let entries = document
        .get("markers")
        .and_then(Value::as_array)
        .ok_or_else(|| AssistError::InvalidPayload {
            reason: "\"markers\" is not an array".to_string(),
        })?;

    let markers: Vec<RawMarker> = entries.iter().map(RawMarker::from_value).collect();
    debug!("Extracted {} marker suggestion(s)", markers.len());
    Ok(markers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_object() {
        let markers = extract_markers(r#"{"markers": [{"t": 0, "slide": 1}, {"t": 15.5, "slide": 2}]}"#).unwrap();

        assert_eq!(markers.len(), 2);
        assert_eq!(markers[1].coerce(), Some((15.5, 2.0)));
    }

    #[test]
    fn test_fenced_block_with_prose() {
        let reply = "Here you go:\n```json\n{\"markers\": [{\"t\": 0, \"slide\": 1}]}\n```\nLet me know!";
        let markers = extract_markers(reply).unwrap();
        assert_eq!(markers, vec![RawMarker { t: json!(0), slide: json!(1) }]);
    }

    #[test]
    fn test_untagged_fence() {
        let reply = "```\n{\"markers\": [{\"t\": \"3\", \"slide\": 2}]}\n```";
        let markers = extract_markers(reply).unwrap();
        assert_eq!(markers[0].coerce(), Some((3.0, 2.0)));
    }

    #[test]
    fn test_junk_entries_are_kept_for_the_normalizer() {
        let reply = r#"Sure! {"markers": [{"t": 0, "slide": 1}, "oops", {"t": "later"}]}"#;
        let markers = extract_markers(reply).unwrap();

        assert_eq!(markers.len(), 3);
        assert_eq!(markers[1], RawMarker::default());
        assert_eq!(markers[2].slide, Value::Null);
        assert_eq!(markers[2].coerce(), None);
    }

    #[test]
    fn test_no_markers() {
        assert_eq!(
            extract_markers("I could not match the slides, sorry."),
            Err(AssistError::MarkersNotFound)
        );
        assert_eq!(
            extract_markers("```json\n{\"slides\": []}\n```"),
            Err(AssistError::MarkersNotFound)
        );
    }

    #[test]
    fn test_invalid_json() {
        let result = extract_markers(r#"{"markers": [{"t": 0, "slide": 1},]}"#);
        assert!(matches!(result, Err(AssistError::InvalidPayload { .. })));
    }

    #[test]
    fn test_markers_not_an_array() {
        let result = extract_markers(r#"{"markers": {"t": 0}}"#);
        assert!(matches!(result, Err(AssistError::InvalidPayload { ref reason }) if reason.contains("array")));
    }
}
