//! Hover text for a line of a reviewed document

use std::sync::Arc;

use crate::review::ReviewStore;
use crate::types::{DocumentId, ParsedReview};

/// Suggestion shown when hovering 0-based `line`: the one anchored to that
/// line, else the review's first suggestion. None if there are no suggestions.
pub fn hover_text(review: &ParsedReview, line: u32) -> Option<String> {
    let wanted = i64::from(line) + 1;
    review
        .suggestions
        .iter()
        .find(|s| s.line == Some(wanted))
        .or_else(|| review.suggestions.first())
        .map(|s| format!("💡 Suggestion: {}", s.suggestion))
}

#[derive(Debug, Clone)]
pub struct HoverProvider {
    store: Arc<ReviewStore>,
}

impl HoverProvider {
    pub fn new(store: Arc<ReviewStore>) -> Self {
        Self { store }
    }

    pub fn provide(&self, id: &DocumentId, line: u32) -> Option<String> {
        let review = self.store.get(id)?;
        hover_text(&review, line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Suggestion;

    fn review() -> ParsedReview {
        ParsedReview::new(7, "ok").with_suggestions(vec![
            Suggestion::new("general advice"),
            Suggestion::new("rename x").at(3),
        ])
    }

    #[test]
    fn test_exact_line_match() {
        assert_eq!(
            hover_text(&review(), 2).as_deref(),
            Some("💡 Suggestion: rename x")
        );
    }

    #[test]
    fn test_falls_back_to_first() {
        assert_eq!(
            hover_text(&review(), 40).as_deref(),
            Some("💡 Suggestion: general advice")
        );
    }

    #[test]
    fn test_no_suggestions() {
        assert!(hover_text(&ParsedReview::default(), 0).is_none());
    }

    #[test]
    fn test_provider_without_review() {
        let provider = HoverProvider::new(Arc::new(ReviewStore::new()));
        assert!(provider.provide(&DocumentId::new("file:///a.rs"), 0).is_none());
    }
}
