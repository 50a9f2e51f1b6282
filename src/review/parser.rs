//! Review Parser
//!
//! Turns raw model output into a [`ParsedReview`]. Parsing is total: any
//! input yields a review, degrading to defaults when the text is not the
//! JSON shape the prompt asked for.
//!
//! Handles common model output issues:
//! - Markdown code fence wrapping (```json ... ```)
//! - Bare strings where suggestion objects were expected
//! - Non-numeric or out-of-range scores
//! - Plain prose instead of JSON (heuristic score/summary extraction)

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::debug;

use crate::constants::review as review_constants;
use crate::types::{Finding, ParsedReview, Suggestion};

/// `score: 8`, `Rating = 7/10`, `score 9 / 10`
static SCORE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:score|rating)\s*[:=]?\s*(\d{1,2})(?:\s*/\s*10)?")
        .expect("score regex pattern is valid and tested")
});

/// A paragraph that carries nothing but the score
static SCORE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:score|rating)\s*[:=]?\s*\d{1,2}(?:\s*/\s*10)?\s*\.?$")
        .expect("score line regex pattern is valid")
});

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph regex pattern is valid"));

/// Result of parsing, tagged by which path produced it
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// The text was a JSON object and fields were read from it
    Structured(ParsedReview),
    /// The text was not usable JSON; score and summary were extracted heuristically
    Fallback(ParsedReview),
}

impl ParseOutcome {
    pub fn review(&self) -> &ParsedReview {
        match self {
            Self::Structured(r) | Self::Fallback(r) => r,
        }
    }

    pub fn into_review(self) -> ParsedReview {
        match self {
            Self::Structured(r) | Self::Fallback(r) => r,
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }
}

/// Parse raw model output into a review (convenience wrapper)
pub fn parse_review(raw: &str) -> ParsedReview {
    ReviewParser::new().parse(raw).into_review()
}

/// Review parser
#[derive(Debug, Default, Clone, Copy)]
pub struct ReviewParser;

impl ReviewParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse model output. Never fails.
    pub fn parse(&self, raw: &str) -> ParseOutcome {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            return ParseOutcome::Fallback(ParsedReview::default());
        }

        let cleaned = strip_code_fence(&normalized);

        match serde_json::from_str::<Value>(cleaned) {
            Ok(Value::Object(map)) => {
                ParseOutcome::Structured(self.read_object(&map).with_raw(normalized))
            }
            Ok(other) => {
                debug!("Review JSON is not an object ({}), using text heuristics", kind(&other));
                ParseOutcome::Fallback(self.read_text(&normalized))
            }
            Err(e) => {
                debug!("Review is not JSON ({}), using text heuristics", e);
                ParseOutcome::Fallback(self.read_text(&normalized))
            }
        }
    }

    fn read_object(&self, map: &Map<String, Value>) -> ParsedReview {
        let score = map
            .get("score")
            .and_then(coerce_score)
            .unwrap_or(review_constants::DEFAULT_SCORE);

        let summary = map
            .get("summary")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(review_constants::DEFAULT_SUMMARY);

        let suggestions = array(map, &["suggestions"])
            .iter()
            .filter_map(parse_suggestion)
            .collect();

        let issues = array(map, &["issues", "bugs"])
            .iter()
            .filter_map(parse_finding)
            .collect();

        let security = array(map, &["security"])
            .iter()
            .filter_map(parse_finding)
            .collect();

        ParsedReview::new(score, summary)
            .with_suggestions(suggestions)
            .with_issues(issues)
            .with_security(security)
    }

    /// Heuristic extraction. Never invents positioned suggestions.
    fn read_text(&self, normalized: &str) -> ParsedReview {
        let score = SCORE_PATTERN
            .captures(normalized)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u8>().ok())
            .map(|s| s.min(review_constants::MAX_SCORE))
            .unwrap_or(review_constants::DEFAULT_SCORE);

        // First paragraph, skipping a leading bare "Rating: 8/10" line
        let summary = PARAGRAPH_BREAK
            .split(normalized)
            .map(str::trim)
            .find(|p| !p.is_empty() && !SCORE_LINE.is_match(p))
            .unwrap_or(review_constants::DEFAULT_SUMMARY);

        ParsedReview::new(score, summary).with_raw(normalized)
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn normalize(raw: &str) -> String {
    raw.replace("\r\n", "\n").trim().to_string()
}

/// Strip one surrounding markdown fence, including its info string
fn strip_code_fence(s: &str) -> &str {
    let mut body = s.trim_start_matches('\u{feff}').trim();

    if let Some(rest) = body.strip_prefix("```") {
        let tag_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(rest.len());
        body = &rest[tag_len..];
    }

    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }

    body.trim()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// First array found under any of `keys`; anything else reads as empty
fn array<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> &'a [Value] {
    keys.iter()
        .find_map(|k| map.get(*k).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn coerce_score(value: &Value) -> Option<u8> {
    let n = coerce_number(value)?;
    Some(n.round().clamp(0.0, f64::from(review_constants::MAX_SCORE)) as u8)
}

fn coerce_line(value: &Value) -> Option<i64> {
    // Saturating float-to-int cast keeps absurd values representable; the
    // projector clamps them into the document.
    coerce_number(value).map(|n| n.round() as i64)
}

fn text_field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn parse_suggestion(value: &Value) -> Option<Suggestion> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(Suggestion::new(s.trim())),
        Value::Object(obj) => {
            let text = text_field(obj, &["suggestion", "message", "text"])?;
            Some(Suggestion {
                line: obj.get("line").and_then(coerce_line),
                suggestion: text.to_string(),
            })
        }
        _ => None,
    }
}

fn parse_finding(value: &Value) -> Option<Finding> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(Finding::new(s.trim())),
        Value::Object(obj) => {
            let text = text_field(obj, &["message", "issue", "description", "suggestion"])?;
            Some(Finding {
                line: obj.get("line").and_then(coerce_line),
                message: text.to_string(),
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parse(s: &str) -> ParseOutcome {
        ReviewParser::new().parse(s)
    }

    #[test]
    fn test_empty_input_gives_default() {
        let outcome = parse("");
        assert!(!outcome.is_structured());
        assert_eq!(outcome.review(), &ParsedReview::default());

        let blank = parse("  \r\n \n ").into_review();
        assert_eq!(blank.score, 5);
        assert_eq!(blank.summary, "Code reviewed");
    }

    #[test]
    fn test_fenced_json() {
        let outcome =
            parse("```json\n{\"score\":7,\"summary\":\"ok\",\"suggestions\":[]}\n```");
        assert!(outcome.is_structured());
        let review = outcome.into_review();
        assert_eq!(review.score, 7);
        assert_eq!(review.summary, "ok");
        assert!(review.suggestions.is_empty());
        assert!(review.raw.starts_with("```json"));
    }

    #[test]
    fn test_bare_fence_without_tag() {
        let review = parse("```\n{\"score\": 3, \"summary\": \"meh\"}\n```").into_review();
        assert_eq!(review.score, 3);
        assert_eq!(review.summary, "meh");
    }

    #[test]
    fn test_heuristic_fallback() {
        let outcome = parse("Rating: 8/10\n\nCode looks fine overall.\n\nMore text.");
        assert!(!outcome.is_structured());
        let review = outcome.into_review();
        assert_eq!(review.score, 8);
        assert_eq!(review.summary, "Code looks fine overall.");
        assert!(review.suggestions.is_empty());
    }

    #[test]
    fn test_heuristic_summary_is_first_paragraph() {
        let review = parse("Code looks fine overall.\n\nScore: 8/10").into_review();
        assert_eq!(review.score, 8);
        assert_eq!(review.summary, "Code looks fine overall.");
    }

    #[test]
    fn test_heuristic_score_only() {
        let review = parse("Score: 6/10").into_review();
        assert_eq!(review.score, 6);
        assert_eq!(review.summary, "Code reviewed");
    }

    #[test]
    fn test_heuristic_clamps_score() {
        let review = parse("score = 42 out of ten").into_review();
        assert_eq!(review.score, 10);
    }

    #[test]
    fn test_heuristic_without_score() {
        let review = parse("Looks great!").into_review();
        assert_eq!(review.score, 5);
        assert_eq!(review.summary, "Looks great!");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let review = parse("{}").into_review();
        assert_eq!(review.score, 5);
        assert_eq!(review.summary, "Code reviewed");
        assert!(review.suggestions.is_empty());
    }

    #[test]
    fn test_score_coercion() {
        assert_eq!(parse(r#"{"score":"9"}"#).review().score, 9);
        assert_eq!(parse(r#"{"score":"nine"}"#).review().score, 5);
        assert_eq!(parse(r#"{"score":0}"#).review().score, 0);
        assert_eq!(parse(r#"{"score":7.6}"#).review().score, 8);
        assert_eq!(parse(r#"{"score":-3}"#).review().score, 0);
        assert_eq!(parse(r#"{"score":99}"#).review().score, 10);
        assert_eq!(parse(r#"{"score":null}"#).review().score, 5);
    }

    #[test]
    fn test_string_suggestions_are_promoted() {
        let review = parse(
            r#"{"score":6,"summary":"s","suggestions":["Use const",{"line":4,"suggestion":"Rename x"},{"line":2},42]}"#,
        )
        .into_review();
        assert_eq!(
            review.suggestions,
            vec![Suggestion::new("Use const"), Suggestion::new("Rename x").at(4)]
        );
    }

    #[test]
    fn test_non_array_suggestions() {
        let review = parse(r#"{"suggestions":"do better"}"#).into_review();
        assert!(review.suggestions.is_empty());
    }

    #[test]
    fn test_line_as_string() {
        let review = parse(r#"{"suggestions":[{"line":"12","suggestion":"x"}]}"#).into_review();
        assert_eq!(review.suggestions[0].line, Some(12));
    }

    #[test]
    fn test_extended_categories() {
        let review = parse(
            r#"{"score":4,"summary":"risky","suggestions":[],
                "bugs":[{"line":3,"issue":"off by one"}],
                "security":["hardcoded secret"]}"#,
        )
        .into_review();
        assert_eq!(review.issues, vec![Finding::new("off by one").at(3)]);
        assert_eq!(review.security, vec![Finding::new("hardcoded secret")]);
    }

    #[test]
    fn test_non_object_json_falls_back() {
        let outcome = parse("[1, 2, 3]");
        assert!(!outcome.is_structured());
        assert_eq!(outcome.review().summary, "[1, 2, 3]");
    }

    #[test]
    fn test_raw_is_normalized() {
        let review = parse("  {\"score\": 2}\r\n").into_review();
        assert_eq!(review.raw, "{\"score\": 2}");
    }

    proptest! {
        #[test]
        fn prop_parse_is_total(s in ".*") {
            let review = parse_review(&s);
            prop_assert!(review.score <= 10);
            prop_assert!(!review.summary.is_empty());
        }

        #[test]
        fn prop_structured_score_in_range(score in proptest::num::f64::ANY) {
            let json = serde_json::json!({ "score": score }).to_string();
            let review = parse_review(&json);
            prop_assert!(review.score <= 10);
        }
    }
}
