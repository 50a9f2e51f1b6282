//! Content-Addressed Review Cache
//!
//! Maps a document to the review computed for its exact text. An entry is
//! valid only while the SHA-256 of the current content equals the stored
//! hash; any mismatch evicts the entry and reports a miss.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use crate::types::{DocumentId, SharedReview};

/// Hex SHA-256 of the UTF-8 bytes of `content`
pub fn content_hash(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

/// Cached review with the content hash it was computed against
#[derive(Debug, Clone)]
pub struct CachedEntry {
    pub content_hash: String,
    pub review: SharedReview,
    pub computed_at: DateTime<Utc>,
}

/// Cache statistics (introspection only)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub count: usize,
    pub oldest: Option<DateTime<Utc>>,
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
}

impl CacheStats {
    /// Cache hit rate (0.0 - 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Review cache keyed by document identity.
///
/// No size limit and no persistence: entries live until overwritten,
/// invalidated by a content change, or deleted.
#[derive(Debug, Default)]
pub struct ReviewCache {
    entries: DashMap<DocumentId, CachedEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl ReviewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached review for `content`, evicting the entry if it is stale
    pub fn get(&self, id: &DocumentId, content: &str) -> Option<SharedReview> {
        let hash = content_hash(content);

        // Read under the shard guard, release it before any removal
        let lookup = self
            .entries
            .get(id)
            .map(|entry| (entry.content_hash == hash).then(|| entry.review.clone()));

        match lookup {
            Some(Some(review)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Review cache hit for {}", id);
                Some(review)
            }
            Some(None) => {
                // A concurrent set() may have stored this exact content meanwhile
                if self
                    .entries
                    .remove_if(id, |_, entry| entry.content_hash != hash)
                    .is_some()
                {
                    self.invalidations.fetch_add(1, Ordering::Relaxed);
                    debug!("Review cache entry for {} is stale, evicted", id);
                }
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store `review` as the result for `content`, replacing any entry
    pub fn set(&self, id: &DocumentId, content: &str, review: SharedReview) {
        let entry = CachedEntry {
            content_hash: content_hash(content),
            review,
            computed_at: Utc::now(),
        };
        self.entries.insert(id.clone(), entry);
    }

    /// Remove the entry unconditionally
    pub fn delete(&self, id: &DocumentId) -> bool {
        self.entries.remove(id).is_some()
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            count: self.entries.len(),
            oldest: self.entries.iter().map(|e| e.computed_at).min(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}
