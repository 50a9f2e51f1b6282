//! File badge derived from the stored review

use serde::Serialize;
use std::sync::Arc;

use crate::review::ReviewStore;
use crate::types::{DocumentId, ParsedReview};

/// Badge tone for editor theming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTone {
    Warning,
    Passed,
}

/// Per-file explorer badge
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileBadge {
    pub badge: String,
    pub tooltip: String,
    pub tone: BadgeTone,
}

/// Badge for a review: a marker with the count when there are suggestions,
/// a check mark otherwise.
pub fn badge_for(review: &ParsedReview) -> FileBadge {
    match review.suggestions.len() {
        0 => FileBadge {
            badge: "✓".to_string(),
            tooltip: "AI review passed".to_string(),
            tone: BadgeTone::Passed,
        },
        n => FileBadge {
            badge: "💡".to_string(),
            tooltip: format!("{} suggestion(s) found by AI", n),
            tone: BadgeTone::Warning,
        },
    }
}

#[derive(Debug, Clone)]
pub struct DecorationProvider {
    store: Arc<ReviewStore>,
}

impl DecorationProvider {
    pub fn new(store: Arc<ReviewStore>) -> Self {
        Self { store }
    }

    /// Badge for a document, or none if it has no stored review
    pub fn provide(&self, id: &DocumentId) -> Option<FileBadge> {
        self.store.get(id).map(|review| badge_for(&review))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Suggestion;

    #[test]
    fn test_badge_with_suggestions() {
        let review = ParsedReview::new(6, "ok").with_suggestions(vec![
            Suggestion::new("a"),
            Suggestion::new("b").at(2),
        ]);
        let badge = badge_for(&review);
        assert_eq!(badge.badge, "💡");
        assert_eq!(badge.tooltip, "2 suggestion(s) found by AI");
        assert_eq!(badge.tone, BadgeTone::Warning);
    }

    #[test]
    fn test_badge_passed() {
        let badge = badge_for(&ParsedReview::new(10, "clean"));
        assert_eq!(badge.badge, "✓");
        assert_eq!(badge.tooltip, "AI review passed");
        assert_eq!(badge.tone, BadgeTone::Passed);
    }

    #[test]
    fn test_provide_follows_store() {
        let store = Arc::new(ReviewStore::new());
        let provider = DecorationProvider::new(store.clone());
        let id = DocumentId::new("file:///a.rs");

        assert!(provider.provide(&id).is_none());
        store.set(&id, Arc::new(ParsedReview::new(9, "ok")));
        assert_eq!(provider.provide(&id).unwrap().badge, "✓");
        store.delete(&id);
        assert!(provider.provide(&id).is_none());
    }
}
