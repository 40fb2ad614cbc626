//! Keyword scoring of POST operations to find the chat endpoint

use openapi_parser::{ApiOperation, OperationParameter, ParsedSpec};
use serde_json::Value;
use tracing::debug;

/// Positive path keywords and their weights
pub const PATH_KEYWORDS: &[(&str, f64)] = &[
    ("chat", 10.0),
    ("completions", 8.0),
    ("completion", 8.0),
    ("messages", 9.0),
    ("message", 7.0),
    ("converse", 7.0),
    ("complete", 6.0),
    ("generate", 6.0),
    ("inference", 5.0),
    ("ask", 4.0),
];

/// Path keywords pointing away from chat endpoints
pub const NEGATIVE_KEYWORDS: &[(&str, f64)] = &[
    ("list", -5.0),
    ("delete", -10.0),
    ("get", -3.0),
    ("models", -5.0),
    ("files", -10.0),
    ("embeddings", -8.0),
    ("images", -8.0),
    ("audio", -8.0),
    ("fine-tune", -10.0),
    ("batch", -8.0),
];

/// Request body property names that suggest a prompt-carrying body
pub const REQUEST_FIELD_KEYWORDS: &[(&str, f64)] = &[
    ("messages", 10.0),
    ("prompt", 9.0),
    ("message", 8.0),
    ("content", 6.0),
    ("input", 5.0),
    ("text", 5.0),
    ("query", 4.0),
];

const OPERATION_ID_FACTOR: f64 = 0.5;
const DESCRIPTION_FACTOR: f64 = 0.3;
const REQUEST_FIELD_FACTOR: f64 = 0.5;

/// A POST operation that could be the chat endpoint
#[derive(Debug, Clone)]
pub struct EndpointCandidate<'a> {
    pub operation: &'a ApiOperation,
    pub score: f64,
}

impl<'a> EndpointCandidate<'a> {
    pub fn path(&self) -> &str {
        &self.operation.path
    }

    pub fn summary(&self) -> &str {
        self.operation.summary.as_deref().unwrap_or_default()
    }

    pub fn request_schema(&self) -> Option<&'a Value> {
        self.operation.request_schema()
    }

    pub fn response_schema(&self) -> Option<&'a Value> {
        self.operation.response_schema()
    }

    pub fn required_headers(&self) -> impl Iterator<Item = &'a OperationParameter> {
        self.operation.required_headers()
    }
}

fn keyword_sum(text: &str, keywords: &[(&str, f64)]) -> f64 {
    keywords
        .iter()
        .filter(|(keyword, _)| text.contains(keyword))
        .map(|(_, weight)| weight)
        .sum()
}

/// Score a path from positive and negative keywords
pub fn score_path(path: &str) -> f64 {
    let path = path.to_lowercase();
    keyword_sum(&path, PATH_KEYWORDS) + keyword_sum(&path, NEGATIVE_KEYWORDS)
}

/// Score one operation; only meaningful for POST operations
pub fn score_operation(operation: &ApiOperation) -> f64 {
    let mut score = score_path(&operation.path);

    score += OPERATION_ID_FACTOR * keyword_sum(&operation.operation_id.to_lowercase(), PATH_KEYWORDS);

    let summary = operation.summary.as_deref().unwrap_or_default().to_lowercase();
    let description = operation.description.as_deref().unwrap_or_default().to_lowercase();
    score += DESCRIPTION_FACTOR
        * PATH_KEYWORDS
            .iter()
            .filter(|(keyword, _)| summary.contains(keyword) || description.contains(keyword))
            .map(|(_, weight)| weight)
            .sum::<f64>();

    if let Some(properties) = operation
        .request_schema()
        .and_then(|s| s.get("properties"))
        .and_then(Value::as_object)
    {
        for name in properties.keys() {
            let name = name.to_lowercase();
            if let Some((_, weight)) = REQUEST_FIELD_KEYWORDS.iter().find(|(k, _)| *k == name) {
                score += REQUEST_FIELD_FACTOR * weight;
            }
        }
    }

    score
}

/// All POST operations scoring above zero, best first.
///
/// The sort is stable: equal scores keep declaration order.
pub fn rank_candidates(spec: &ParsedSpec) -> Vec<EndpointCandidate<'_>> {
    let mut candidates: Vec<EndpointCandidate<'_>> = spec
        .post_operations()
        .map(|operation| EndpointCandidate {
            operation,
            score: score_operation(operation),
        })
        .filter(|c| c.score > 0.0)
        .collect();

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    for candidate in &candidates {
        debug!("Candidate [{:.1}] POST {}", candidate.score, candidate.path());
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use openapi_parser::OpenApiParser;

    fn spec_with_paths(paths: &str) -> ParsedSpec {
        let doc = format!(
            "openapi: \"3.0.0\"\ninfo:\n  title: Test\n  version: \"1\"\npaths:\n{}",
            paths
        );
        OpenApiParser::parse_yaml(&doc).unwrap()
    }

    fn post(path: &str, summary: &str) -> String {
        format!(
            "  {}:\n    post:\n      summary: \"{}\"\n      responses:\n        '200':\n          description: ok\n",
            path, summary
        )
    }

    #[test]
    fn test_score_path_keywords() {
        assert_eq!(score_path("/v1/chat/completions"), 26.0);
        assert_eq!(score_path("/v1/models"), -5.0);
        assert_eq!(score_path("/v1/Generate"), 6.0);
        assert_eq!(score_path("/v1/files"), -10.0);
    }

    #[test]
    fn test_single_chat_endpoint_selected() {
        let spec = spec_with_paths(&format!("{}{}", post("/users", "Create a user"), post("/chat", "")));
        let ranked = rank_candidates(&spec);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].path(), "/chat");
    }

    #[test]
    fn test_higher_score_wins_regardless_of_order() {
        let low = post("/generate", "");
        let high = post("/chat", "");

        let spec = spec_with_paths(&format!("{}{}", low, high));
        assert_eq!(rank_candidates(&spec)[0].path(), "/chat");

        let spec = spec_with_paths(&format!("{}{}", high, low));
        assert_eq!(rank_candidates(&spec)[0].path(), "/chat");
    }

    #[test]
    fn test_equal_scores_keep_declaration_order() {
        let spec = spec_with_paths(&format!("{}{}", post("/b/chat", ""), post("/a/chat", "")));
        let ranked = rank_candidates(&spec);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].score, ranked[1].score);
        assert_eq!(ranked[0].path(), "/b/chat");
    }

    #[test]
    fn test_summary_adds_low_weight() {
        let spec = spec_with_paths(&post("/v1/run", "Run a chat turn"));
        let ranked = rank_candidates(&spec);

        assert_eq!(ranked.len(), 1);
        assert!((ranked[0].score - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_post_and_negative_operations_are_discarded() {
        let doc = "  /chat:\n    get:\n      responses:\n        '200':\n          description: ok\n";
        let spec = spec_with_paths(&format!("{}{}", doc, post("/files", "")));
        assert!(rank_candidates(&spec).is_empty());
    }
}
