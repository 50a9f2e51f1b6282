//! Review Orchestrator
//!
//! Coordinates one review of one document:
//!
//! ```text
//! scanning → cache.get ─hit──────────────────────────────┐
//!                      └miss→ analyze (timeout) → parse ─┤
//!                                                        ▼
//!              cache.set · store.set · annotations · badge · status done
//! ```
//!
//! The commit step runs without an await point, so no observer sees a
//! partially applied review. A failed analysis mutates nothing: the error
//! is shown to the user and the status reverts to idle.
//!
//! At most one analysis per document is in flight. A second request for the
//! same document waits for the first, then re-checks the cache, so identical
//! content is answered from the first result.
//!
//! Clearing or closing a document bumps its epoch. A review that started
//! under an older epoch is discarded when its analysis returns.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use super::{ReviewCache, ReviewParser, ReviewStore};
use crate::ai::{SharedProvider, with_timeout};
use crate::config::Config;
use crate::editor::{MessageLevel, RenderSink};
use crate::projection::{
    DecorationProvider, DiagnosticsProjector, HoverProvider, ProjectionOptions, StatusManager,
    StatusState,
};
use crate::types::{DocumentId, MentorError, Result, SharedReview};

/// Where an accepted review came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewSource {
    Cache,
    /// Fresh analysis; `structured` is false when the heuristic parser was used
    Provider { structured: bool },
}

/// Result of a completed review
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub review: SharedReview,
    pub source: ReviewSource,
    pub annotations: usize,
}

/// Shared engine state, constructed once and injected
#[derive(Debug)]
pub struct ReviewContext {
    pub cache: Arc<ReviewCache>,
    pub store: Arc<ReviewStore>,
    pub diagnostics: Arc<DiagnosticsProjector>,
    pub status: Arc<StatusManager>,
    pub decorations: DecorationProvider,
    pub hover: HoverProvider,
}

impl ReviewContext {
    pub fn new(
        sink: Arc<dyn RenderSink>,
        options: ProjectionOptions,
        status_window: Duration,
    ) -> Self {
        let store = Arc::new(ReviewStore::new());
        Self {
            cache: Arc::new(ReviewCache::new()),
            diagnostics: Arc::new(DiagnosticsProjector::new(options)),
            status: Arc::new(StatusManager::new(sink, status_window)),
            decorations: DecorationProvider::new(Arc::clone(&store)),
            hover: HoverProvider::new(Arc::clone(&store)),
            store,
        }
    }

    pub fn from_config(sink: Arc<dyn RenderSink>, config: &Config) -> Self {
        Self::new(
            sink,
            ProjectionOptions::from(&config.diagnostics),
            config.status.display_window(),
        )
    }
}

pub struct ReviewOrchestrator {
    provider: SharedProvider,
    context: ReviewContext,
    sink: Arc<dyn RenderSink>,
    parser: ReviewParser,
    timeout: Duration,
    in_flight: DashMap<DocumentId, Arc<AsyncMutex<()>>>,
    /// Last clear/close stamp per document
    epochs: DashMap<DocumentId, u64>,
    next_epoch: AtomicU64,
}

impl std::fmt::Debug for ReviewOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewOrchestrator")
            .field("provider", &self.provider.name())
            .field("timeout", &self.timeout)
            .field("context", &self.context)
            .finish()
    }
}

impl ReviewOrchestrator {
    pub fn new(
        provider: SharedProvider,
        context: ReviewContext,
        sink: Arc<dyn RenderSink>,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            context,
            sink,
            parser: ReviewParser::new(),
            timeout,
            in_flight: DashMap::new(),
            epochs: DashMap::new(),
            next_epoch: AtomicU64::new(1),
        }
    }

    pub fn context(&self) -> &ReviewContext {
        &self.context
    }

    pub fn provider(&self) -> &SharedProvider {
        &self.provider
    }

    fn document_lock(&self, id: &DocumentId) -> Arc<AsyncMutex<()>> {
        self.in_flight.entry(id.clone()).or_default().clone()
    }

    fn epoch(&self, id: &DocumentId) -> u64 {
        self.epochs.get(id).map(|e| *e).unwrap_or(0)
    }

    /// Invalidate every review of `id` that is still running
    fn bump_epoch(&self, id: &DocumentId) {
        let epoch = self.next_epoch.fetch_add(1, Ordering::SeqCst);
        self.epochs.insert(id.clone(), epoch);
    }

    /// Review `content` of document `id`.
    ///
    /// Fails with [`MentorError::Discarded`] if the document is cleared or
    /// closed before the analysis returns; nothing is committed then.
    pub async fn review(
        &self,
        id: &DocumentId,
        content: &str,
        language: Option<&str>,
    ) -> Result<ReviewOutcome> {
        // Read before waiting on the lock so a close while queued counts too
        let epoch = self.epoch(id);
        let lock = self.document_lock(id);

        let result = {
            let _guard = lock.lock().await;
            self.review_locked(id, content, language, epoch).await
        };

        // Drop the slot unless another request is queued on it
        drop(lock);
        self.in_flight
            .remove_if(id, |_, slot| Arc::strong_count(slot) == 1);

        result
    }

    async fn review_locked(
        &self,
        id: &DocumentId,
        content: &str,
        language: Option<&str>,
        epoch: u64,
    ) -> Result<ReviewOutcome> {
        if self.epoch(id) != epoch {
            return Err(self.discard(id));
        }

        self.context.status.scanning(id);

        let analyzed = match self.context.cache.get(id, content) {
            Some(review) => Ok((review, ReviewSource::Cache)),
            None => self.analyze(id, content, language).await,
        };

        if self.epoch(id) != epoch {
            return Err(self.discard(id));
        }

        let (review, source) = match analyzed {
            Ok(fresh) => fresh,
            Err(e) => {
                warn!("Review of {} failed: {}", id, e);
                let message = e.user_message();
                self.context.status.failed(message.clone());
                self.sink.show_message(MessageLevel::Error, &message);
                return Err(e);
            }
        };

        // Commit: no await from here on
        if source != ReviewSource::Cache {
            self.context.cache.set(id, content, Arc::clone(&review));
        }
        self.context.store.set(id, Arc::clone(&review));
        let annotations = self.context.diagnostics.update(id, content, &review);
        self.sink.publish_annotations(id, &annotations);
        self.sink
            .publish_badge(id, self.context.decorations.provide(id).as_ref());
        self.context.status.done(review.score);

        info!(
            "Reviewed {} (score {}/10, {} annotations, {:?})",
            id,
            review.score,
            annotations.len(),
            source
        );

        Ok(ReviewOutcome {
            review,
            source,
            annotations: annotations.len(),
        })
    }

    fn discard(&self, id: &DocumentId) -> MentorError {
        debug!("{} was cleared or closed during review, result discarded", id);
        if matches!(
            self.context.status.current(),
            StatusState::Scanning { ref document } if document == id
        ) {
            self.context.status.idle();
        }
        MentorError::Discarded(id.to_string())
    }

    async fn analyze(
        &self,
        id: &DocumentId,
        content: &str,
        language: Option<&str>,
    ) -> Result<(SharedReview, ReviewSource)> {
        debug!("Requesting analysis of {} from {}", id, self.provider.name());
        let raw = with_timeout(
            self.timeout,
            self.provider.analyze(content, language),
            "code analysis",
        )
        .await?;

        let outcome = self.parser.parse(&raw);
        let structured = outcome.is_structured();
        if !structured {
            debug!("Review of {} was not structured JSON, used heuristics", id);
        }
        Ok((
            Arc::new(outcome.into_review()),
            ReviewSource::Provider { structured },
        ))
    }

    /// Remove every trace of a review for a document
    pub fn clear(&self, id: &DocumentId) {
        self.bump_epoch(id);
        self.context.diagnostics.clear(id);
        self.context.store.delete(id);
        self.context.cache.delete(id);
        self.sink.publish_annotations(id, &[]);
        self.sink.publish_badge(id, None);
        debug!("Cleared review state for {}", id);
    }

    /// Document closed: clear its state and drop its in-flight slot
    pub fn close(&self, id: &DocumentId) {
        self.clear(id);
        self.in_flight
            .remove_if(id, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Hover text for a 0-based line
    pub fn hover(&self, id: &DocumentId, line: u32) -> Option<String> {
        self.context.hover.provide(id, line)
    }

    /// `Summary (N/10): <summary>` for the stored review
    pub fn summary_line(&self, id: &DocumentId) -> Option<String> {
        self.context
            .store
            .get(id)
            .map(|review| format!("Summary ({}): {}", review.score_label(), review.summary))
    }
}
