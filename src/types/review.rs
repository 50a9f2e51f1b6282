//! Review Data Model
//!
//! Normalized review result produced by the parser and shared by the cache,
//! the store, and every projector.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::constants::review as review_constants;

/// Review shared between cache, store, and projectors without copying
pub type SharedReview = Arc<ParsedReview>;

/// A single piece of advice tied (optionally) to a source line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// 1-based line as reported by the model; clamped at projection time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<i64>,
    /// Advice text
    pub suggestion: String,
}

impl Suggestion {
    pub fn new(suggestion: impl Into<String>) -> Self {
        Self {
            line: None,
            suggestion: suggestion.into(),
        }
    }

    pub fn at(mut self, line: i64) -> Self {
        self.line = Some(line);
        self
    }
}

/// Issue or security finding from the extended review schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<i64>,
    pub message: String,
}

impl Finding {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            line: None,
            message: message.into(),
        }
    }

    pub fn at(mut self, line: i64) -> Self {
        self.line = Some(line);
        self
    }
}

/// Normalized review.
///
/// Always constructible: every field has a default, so any model output
/// degrades into a valid value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedReview {
    /// Quality score in `0..=10`
    pub score: u8,
    /// Short quality statement, never empty
    pub summary: String,
    /// Ordered suggestions, rendered top to bottom
    pub suggestions: Vec<Suggestion>,
    #[serde(default)]
    pub issues: Vec<Finding>,
    #[serde(default)]
    pub security: Vec<Finding>,
    /// Whitespace-normalized model output, kept for inspection
    pub raw: String,
}

impl Default for ParsedReview {
    fn default() -> Self {
        Self {
            score: review_constants::DEFAULT_SCORE,
            summary: review_constants::DEFAULT_SUMMARY.to_string(),
            suggestions: Vec::new(),
            issues: Vec::new(),
            security: Vec::new(),
            raw: String::new(),
        }
    }
}

impl ParsedReview {
    pub fn new(score: u8, summary: impl Into<String>) -> Self {
        Self {
            score: score.min(review_constants::MAX_SCORE),
            summary: summary.into(),
            ..Default::default()
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<Suggestion>) -> Self {
        self.suggestions = suggestions;
        self
    }

    pub fn with_issues(mut self, issues: Vec<Finding>) -> Self {
        self.issues = issues;
        self
    }

    pub fn with_security(mut self, security: Vec<Finding>) -> Self {
        self.security = security;
        self
    }

    pub fn with_raw(mut self, raw: impl Into<String>) -> Self {
        self.raw = raw.into();
        self
    }

    /// Score formatted the way the status bar shows it
    pub fn score_label(&self) -> String {
        format!("{}/{}", self.score, review_constants::MAX_SCORE)
    }

    /// Total number of positioned findings across all categories
    pub fn finding_count(&self) -> usize {
        self.suggestions.len() + self.issues.len() + self.security.len()
    }
}
