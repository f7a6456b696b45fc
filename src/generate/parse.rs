//! Candidate extraction from generation-service responses.

use regex::Regex;

use crate::error::{KgraphError, Result};
use crate::reconcile::CandidateGraph;

/// Parse the model's reply into a candidate structure.
///
/// Models routinely wrap JSON in a fenced code block (``` or ```json) even
/// when told not to; the fence is stripped before parsing. Anything that
/// still fails to parse is a `Parse` error, kept distinct from transport
/// failures.
pub fn extract_candidate(content: &str) -> Result<CandidateGraph> {
    let fence_regex =
        Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("Invalid regex pattern");

    let payload = fence_regex
        .captures(content)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
        .unwrap_or_else(|| content.trim());

    serde_json::from_str(payload)
        .map_err(|e| KgraphError::Parse(format!("candidate structure invalid: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "topic": "Machine Learning",
        "description": "Learning from data",
        "concepts": [{"name": "Neural Networks", "type": "concept"}],
        "edges": [
            {"source": "Machine Learning", "relation": "includes", "target": "Neural Networks"}
        ]
    }"#;

    #[test]
    fn test_plain_json() {
        let candidate = extract_candidate(PAYLOAD).unwrap();
        assert_eq!(candidate.topic, "Machine Learning");
        assert_eq!(candidate.edges.len(), 1);
        assert_eq!(candidate.concepts.len(), 1);
    }

    #[test]
    fn test_fenced_json() {
        let wrapped = format!("```json\n{}\n```", PAYLOAD);
        let candidate = extract_candidate(&wrapped).unwrap();
        assert_eq!(candidate.topic, "Machine Learning");
        assert_eq!(candidate.edges[0].relation, "includes");
    }

    #[test]
    fn test_fenced_without_language_tag() {
        let wrapped = format!("```\n{}\n```", PAYLOAD);
        let candidate = extract_candidate(&wrapped).unwrap();
        assert_eq!(candidate.topic, "Machine Learning");
    }

    #[test]
    fn test_fence_with_surrounding_prose() {
        let wrapped = format!("Here is the graph:\n```json\n{}\n```\nHope it helps!", PAYLOAD);
        let candidate = extract_candidate(&wrapped).unwrap();
        assert_eq!(candidate.topic, "Machine Learning");
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let minimal = r#"{"topic": "X"}"#;
        let candidate = extract_candidate(minimal).unwrap();
        assert_eq!(candidate.topic, "X");
        assert!(candidate.description.is_none());
        assert!(candidate.edges.is_empty());
        assert!(candidate.concepts.is_empty());
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let err = extract_candidate("Sorry, I can't help with that.").unwrap_err();
        assert!(matches!(err, KgraphError::Parse(_)));
    }

    #[test]
    fn test_wrong_shape_is_parse_error() {
        let err = extract_candidate(r#"{"edges": "not-a-list"}"#).unwrap_err();
        assert!(matches!(err, KgraphError::Parse(_)));
    }
}
