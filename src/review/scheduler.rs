//! Auto-Review Scheduler
//!
//! Debounces save events into at most one review per document per quiet
//! period. Per document the state is either Idle or Pending(timer); a save
//! while Pending aborts the armed timer and arms a fresh one, so only the
//! last save of a burst dispatches.
//!
//! When a timer fires the document must still be open, otherwise the
//! review is dropped. Dispatch failures are logged and never propagate.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::editor::DocumentVisibility;
use crate::types::{DocumentId, Result};

/// Per-document scheduling state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleState {
    Idle,
    Pending,
}

struct PendingReview {
    generation: u64,
    handle: JoinHandle<()>,
}

type PendingMap = HashMap<DocumentId, PendingReview>;

fn lock(pending: &Mutex<PendingMap>) -> MutexGuard<'_, PendingMap> {
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct AutoReviewScheduler {
    enabled: AtomicBool,
    delay: Duration,
    visibility: Arc<dyn DocumentVisibility>,
    pending: Arc<Mutex<PendingMap>>,
    next_generation: AtomicU64,
}

impl AutoReviewScheduler {
    pub fn new(visibility: Arc<dyn DocumentVisibility>, delay: Duration, enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            delay,
            visibility,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Enable or disable. Disabling cancels every pending timer.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        if !enabled {
            self.cancel_all();
        }
        info!(
            "Auto-review on save {}",
            if enabled { "enabled" } else { "disabled" }
        );
    }

    /// Flip the enable flag and return the new value
    pub fn toggle(&self) -> bool {
        let enabled = !self.enabled.fetch_xor(true, Ordering::SeqCst);
        if !enabled {
            self.cancel_all();
        }
        info!(
            "Auto-review on save {}",
            if enabled { "enabled" } else { "disabled" }
        );
        enabled
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a save. Returns true if a timer was armed.
    ///
    /// Must be called from within a tokio runtime.
    pub fn on_save<F, Fut>(&self, id: &DocumentId, dispatch: F) -> bool
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        if !self.is_enabled() {
            debug!("Auto-review disabled, ignoring save of {}", id);
            return false;
        }

        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);

        // Hold the map lock across spawn and insert so the timer task
        // always finds its own record when it fires.
        let mut pending = lock(&self.pending);
        if let Some(previous) = pending.remove(id) {
            previous.handle.abort();
            debug!("Re-armed auto-review timer for {}", id);
        }

        let task_pending = Arc::clone(&self.pending);
        let visibility = Arc::clone(&self.visibility);
        let delay = self.delay;
        let doc_id = id.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            {
                let mut pending = lock(&task_pending);
                match pending.get(&doc_id) {
                    Some(p) if p.generation == generation => {
                        pending.remove(&doc_id);
                    }
                    _ => return,
                }
            }

            if !visibility.is_open(&doc_id) {
                debug!("{} was closed before auto-review fired", doc_id);
                return;
            }

            debug!("Auto-review firing for {}", doc_id);
            if let Err(e) = dispatch().await {
                warn!("Auto-review of {} failed: {}", doc_id, e);
            }
        });

        pending.insert(id.clone(), PendingReview { generation, handle });
        debug!("Armed auto-review timer for {} ({:?})", id, delay);
        true
    }

    pub fn state(&self, id: &DocumentId) -> ScheduleState {
        if lock(&self.pending).contains_key(id) {
            ScheduleState::Pending
        } else {
            ScheduleState::Idle
        }
    }

    /// Cancel the pending timer for a document, if any
    pub fn cancel(&self, id: &DocumentId) -> bool {
        match lock(&self.pending).remove(id) {
            Some(p) => {
                p.handle.abort();
                debug!("Cancelled auto-review timer for {}", id);
                true
            }
            None => false,
        }
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }

    /// Cancel every pending timer
    pub fn cancel_all(&self) {
        for (_, p) in lock(&self.pending).drain() {
            p.handle.abort();
        }
    }
}

impl Drop for AutoReviewScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

impl std::fmt::Debug for AutoReviewScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoReviewScheduler")
            .field("enabled", &self.is_enabled())
            .field("delay", &self.delay)
            .field("pending", &self.pending_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::OpenDocuments;
    use crate::types::{ErrorCategory, MentorError};
    use std::sync::atomic::AtomicUsize;

    const DELAY: Duration = Duration::from_millis(1500);

    fn setup(enabled: bool) -> (AutoReviewScheduler, Arc<OpenDocuments>, DocumentId) {
        let docs = Arc::new(OpenDocuments::new());
        let id = DocumentId::new("file:///src/main.rs");
        docs.open(&id, "fn main() {}", None);
        let scheduler = AutoReviewScheduler::new(docs.clone(), DELAY, enabled);
        (scheduler, docs, id)
    }

    fn counting(
        counter: &Arc<AtomicUsize>,
    ) -> impl FnOnce() -> std::future::Ready<Result<()>> + use<> {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_saves_dispatches_once() {
        let (scheduler, _docs, id) = setup(true);
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            assert!(scheduler.on_save(&id, counting(&count)));
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.state(&id), ScheduleState::Pending);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.state(&id), ScheduleState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_saves_dispatch_each() {
        let (scheduler, _docs, id) = setup(true);
        let count = Arc::new(AtomicUsize::new(0));

        scheduler.on_save(&id, counting(&count));
        tokio::time::sleep(Duration::from_millis(1600)).await;
        scheduler.on_save(&id, counting(&count));
        tokio::time::sleep(Duration::from_millis(1600)).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_documents_debounce_independently() {
        let (scheduler, docs, a) = setup(true);
        let b = DocumentId::new("file:///src/lib.rs");
        docs.open(&b, "", None);
        let count = Arc::new(AtomicUsize::new(0));

        scheduler.on_save(&a, counting(&count));
        scheduler.on_save(&b, counting(&count));
        assert_eq!(scheduler.pending_count(), 2);

        tokio::time::sleep(Duration::from_millis(1600)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_document_is_not_reviewed() {
        let (scheduler, docs, id) = setup(true);
        let count = Arc::new(AtomicUsize::new(0));

        scheduler.on_save(&id, counting(&count));
        docs.close(&id);
        tokio::time::sleep(Duration::from_millis(1600)).await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.state(&id), ScheduleState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_arms_nothing() {
        let (scheduler, _docs, id) = setup(false);
        let count = Arc::new(AtomicUsize::new(0));

        assert!(!scheduler.on_save(&id, counting(&count)));
        assert_eq!(scheduler.state(&id), ScheduleState::Idle);
        tokio::time::sleep(Duration::from_millis(1600)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabling_cancels_pending() {
        let (scheduler, _docs, id) = setup(true);
        let count = Arc::new(AtomicUsize::new(0));

        scheduler.on_save(&id, counting(&count));
        assert!(!scheduler.toggle());
        tokio::time::sleep(Duration::from_millis(1600)).await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(scheduler.toggle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let (scheduler, _docs, id) = setup(true);
        let count = Arc::new(AtomicUsize::new(0));

        scheduler.on_save(&id, counting(&count));
        assert!(scheduler.cancel(&id));
        assert!(!scheduler.cancel(&id));
        tokio::time::sleep(Duration::from_millis(1600)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_failure_returns_to_idle() {
        let (scheduler, _docs, id) = setup(true);

        scheduler.on_save(&id, || async {
            Err(MentorError::analysis(ErrorCategory::RateLimit, "slow down"))
        });
        tokio::time::sleep(Duration::from_millis(1600)).await;

        assert_eq!(scheduler.state(&id), ScheduleState::Idle);
        assert!(scheduler.is_enabled());
    }
}
