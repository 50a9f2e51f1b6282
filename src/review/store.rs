//! Review Store
//!
//! Last accepted review per open document. Unlike the cache there is no
//! content check: hover, badge, and status read the latest review even if
//! the file has changed since.

use dashmap::DashMap;

use crate::types::{DocumentId, SharedReview};

/// Last-write-wins mapping from document to its most recent review
#[derive(Debug, Default)]
pub struct ReviewStore {
    reviews: DashMap<DocumentId, SharedReview>,
}

impl ReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, id: &DocumentId, review: SharedReview) {
        self.reviews.insert(id.clone(), review);
    }

    pub fn get(&self, id: &DocumentId) -> Option<SharedReview> {
        self.reviews.get(id).map(|r| r.clone())
    }

    pub fn delete(&self, id: &DocumentId) -> bool {
        self.reviews.remove(id).is_some()
    }

    pub fn contains(&self, id: &DocumentId) -> bool {
        self.reviews.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParsedReview;
    use std::sync::Arc;

    #[test]
    fn test_last_write_wins() {
        let store = ReviewStore::new();
        let id = DocumentId::new("file:///a.rs");

        store.set(&id, Arc::new(ParsedReview::new(2, "first")));
        store.set(&id, Arc::new(ParsedReview::new(8, "second")));

        assert_eq!(store.get(&id).unwrap().summary, "second");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete() {
        let store = ReviewStore::new();
        let id = DocumentId::new("file:///a.rs");
        store.set(&id, Arc::new(ParsedReview::default()));

        assert!(store.delete(&id));
        assert!(store.get(&id).is_none());
        assert!(!store.contains(&id));
        assert!(store.is_empty());
    }
}
