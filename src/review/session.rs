//! Editor Session
//!
//! Wires editor events (open, change, save, close) and commands (review,
//! clear, hover, summary, toggle auto-review) to the orchestrator and the
//! auto-review scheduler. One session per editor connection.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{AutoReviewScheduler, ReviewContext, ReviewOrchestrator, ReviewOutcome};
use crate::ai::SharedProvider;
use crate::config::{Config, ConfigLoader};
use crate::editor::{MessageLevel, OpenDocuments, RenderSink};
use crate::types::{DocumentId, MentorError, Result, detect_language};

/// Answer for documents without a stored review
pub const NO_REVIEW_MESSAGE: &str = "No AI review available for this file yet.";

/// New auto-review state with its user-facing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoReviewToggle {
    pub enabled: bool,
    pub message: String,
}

pub struct MentorSession {
    orchestrator: Arc<ReviewOrchestrator>,
    scheduler: AutoReviewScheduler,
    documents: Arc<OpenDocuments>,
    sink: Arc<dyn RenderSink>,
    /// TOML file the auto-review toggle is written back to
    preferences: Option<PathBuf>,
}

impl std::fmt::Debug for MentorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MentorSession")
            .field("orchestrator", &self.orchestrator)
            .field("scheduler", &self.scheduler)
            .field("open_documents", &self.documents.len())
            .field("preferences", &self.preferences)
            .finish()
    }
}

impl MentorSession {
    pub fn new(provider: SharedProvider, sink: Arc<dyn RenderSink>, config: &Config) -> Self {
        let documents = Arc::new(OpenDocuments::new());
        let context = ReviewContext::from_config(Arc::clone(&sink), config);
        let orchestrator = Arc::new(ReviewOrchestrator::new(
            provider,
            context,
            Arc::clone(&sink),
            config.request_timeout(),
        ));
        let scheduler = AutoReviewScheduler::new(
            documents.clone(),
            config.auto_review.debounce(),
            config.auto_review.enabled,
        );

        Self {
            orchestrator,
            scheduler,
            documents,
            sink,
            preferences: None,
        }
    }

    /// Persist auto-review toggles to `path`
    pub fn with_preferences(mut self, path: PathBuf) -> Self {
        self.preferences = Some(path);
        self
    }

    pub fn orchestrator(&self) -> &ReviewOrchestrator {
        &self.orchestrator
    }

    pub fn scheduler(&self) -> &AutoReviewScheduler {
        &self.scheduler
    }

    pub fn documents(&self) -> &OpenDocuments {
        &self.documents
    }

    // =========================================================================
    // Editor Events
    // =========================================================================

    /// Document opened. The language falls back to the file extension.
    pub fn open(&self, id: &DocumentId, text: impl Into<String>, language: Option<String>) {
        let language = language.or_else(|| {
            id.to_file_path()
                .and_then(|path| detect_language(path))
                .map(str::to_string)
        });
        debug!("Opened {} ({:?})", id, language);
        self.documents.open(id, text, language);
    }

    /// Document text changed. Unknown documents are ignored.
    pub fn change(&self, id: &DocumentId, text: impl Into<String>) -> bool {
        self.documents.update(id, text)
    }

    /// Document saved. Arms the auto-review timer when enabled.
    pub fn save(&self, id: &DocumentId, text: Option<String>) -> bool {
        if let Some(text) = text {
            self.documents.update(id, text);
        }

        let orchestrator = Arc::clone(&self.orchestrator);
        let documents = Arc::clone(&self.documents);
        let doc_id = id.clone();

        self.scheduler.on_save(id, move || async move {
            // Review whatever the text is when the timer fires
            let Some(doc) = documents.get(&doc_id) else {
                return Ok(());
            };
            match orchestrator
                .review(&doc_id, &doc.text, doc.language.as_deref())
                .await
            {
                Ok(_) | Err(MentorError::Discarded(_)) => Ok(()),
                Err(e) => Err(e),
            }
        })
    }

    /// Document closed: cancel its timer and drop all review state
    pub fn close(&self, id: &DocumentId) {
        self.scheduler.cancel(id);
        self.documents.close(id);
        self.orchestrator.close(id);
        debug!("Closed {}", id);
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Review the current text of an open document
    pub async fn review(&self, id: &DocumentId) -> Result<ReviewOutcome> {
        let doc = self
            .documents
            .get(id)
            .ok_or_else(|| MentorError::NotOpen(id.to_string()))?;
        self.orchestrator
            .review(id, &doc.text, doc.language.as_deref())
            .await
    }

    /// Clear the review shown for a document
    pub fn clear(&self, id: &DocumentId) {
        self.orchestrator.clear(id);
        self.sink
            .show_message(MessageLevel::Info, "AI diagnostics cleared");
    }

    pub fn hover(&self, id: &DocumentId, line: u32) -> Option<String> {
        self.orchestrator.hover(id, line)
    }

    /// Summary line, or the no-review answer
    pub fn summary(&self, id: &DocumentId) -> String {
        self.orchestrator
            .summary_line(id)
            .unwrap_or_else(|| NO_REVIEW_MESSAGE.to_string())
    }

    /// Flip auto-review on save, persisting the preference if configured
    pub fn toggle_auto_review(&self) -> AutoReviewToggle {
        let enabled = self.scheduler.toggle();
        let message = format!(
            "Auto-review on save {}",
            if enabled { "enabled" } else { "disabled" }
        );

        if let Some(path) = &self.preferences
            && let Err(e) = ConfigLoader::persist_auto_review(path, enabled)
        {
            warn!("Failed to persist auto-review preference: {}", e);
        }

        self.sink.show_message(MessageLevel::Info, &message);
        AutoReviewToggle { enabled, message }
    }

    /// Cancel all pending auto-reviews
    pub fn shutdown(&self) {
        self.scheduler.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{HealthStatus, ReviewProvider};
    use crate::editor::NullSink;
    use crate::projection::StatusState;
    use crate::review::ScheduleState;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Records the code it was asked to review
    #[derive(Default)]
    struct EchoProvider {
        seen: Mutex<Vec<(String, Option<String>)>>,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl ReviewProvider for EchoProvider {
        async fn analyze(&self, code: &str, language: Option<&str>) -> Result<String> {
            self.seen
                .lock()
                .unwrap()
                .push((code.to_string(), language.map(str::to_string)));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(r#"{"score": 9, "summary": "Tidy", "suggestions": ["Add a test"]}"#.to_string())
        }

        async fn check_status(&self) -> Result<HealthStatus> {
            Ok(HealthStatus::default())
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    fn session(auto_review: bool) -> (MentorSession, Arc<EchoProvider>) {
        let provider = Arc::new(EchoProvider::default());
        let mut config = Config::default();
        config.auto_review.enabled = auto_review;
        let session = MentorSession::new(provider.clone(), Arc::new(NullSink), &config);
        (session, provider)
    }

    fn doc() -> DocumentId {
        DocumentId::new("file:///work/app.py")
    }

    #[tokio::test]
    async fn test_review_requires_open_document() {
        let (session, _provider) = session(false);
        let err = session.review(&doc()).await.unwrap_err();
        assert!(matches!(err, MentorError::NotOpen(_)));
    }

    #[tokio::test]
    async fn test_review_detects_language_and_summarizes() {
        let (session, provider) = session(false);
        let id = doc();
        assert_eq!(session.summary(&id), NO_REVIEW_MESSAGE);

        session.open(&id, "print('hi')", None);
        session.review(&id).await.unwrap();

        let seen = provider.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![("print('hi')".to_string(), Some("python".to_string()))]);
        assert_eq!(session.summary(&id), "Summary (9/10): Tidy");
        assert_eq!(
            session.hover(&id, 0).as_deref(),
            Some("💡 Suggestion: Add a test")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_reviews_latest_text_after_debounce() {
        let (session, provider) = session(true);
        let id = doc();
        session.open(&id, "v1", Some("python".to_string()));

        assert!(session.save(&id, Some("v2".to_string())));
        session.change(&id, "v3");
        assert_eq!(session.scheduler().state(&id), ScheduleState::Pending);

        tokio::time::sleep(Duration::from_millis(1600)).await;
        let seen = provider.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "v3");
        assert!(session.orchestrator().context().store.contains(&id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_pending_review() {
        let (session, provider) = session(true);
        let id = doc();
        session.open(&id, "v1", None);

        session.save(&id, None);
        session.close(&id);
        tokio::time::sleep(Duration::from_millis(1600)).await;

        assert!(provider.seen.lock().unwrap().is_empty());
        assert_eq!(session.scheduler().state(&id), ScheduleState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_during_review_discards_result() {
        let provider = Arc::new(EchoProvider {
            delay: Some(Duration::from_secs(2)),
            ..Default::default()
        });
        let session = Arc::new(MentorSession::new(
            provider.clone(),
            Arc::new(NullSink),
            &Config::default(),
        ));
        let id = doc();
        session.open(&id, "print('hi')", None);

        let task = tokio::spawn({
            let session = Arc::clone(&session);
            let id = id.clone();
            async move { session.review(&id).await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        session.close(&id);

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, MentorError::Discarded(_)));
        assert_eq!(provider.seen.lock().unwrap().len(), 1);

        let ctx = session.orchestrator().context();
        assert!(!ctx.store.contains(&id));
        assert!(ctx.cache.is_empty());
        assert!(ctx.diagnostics.get(&id).is_empty());
        assert_eq!(ctx.status.current(), StatusState::Idle);
        assert_eq!(session.summary(&id), NO_REVIEW_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_after_auto_review_fired_discards_result() {
        let provider = Arc::new(EchoProvider {
            delay: Some(Duration::from_secs(2)),
            ..Default::default()
        });
        let mut config = Config::default();
        config.auto_review.enabled = true;
        let session = MentorSession::new(provider.clone(), Arc::new(NullSink), &config);
        let id = doc();
        session.open(&id, "v1", None);

        session.save(&id, None);
        // Timer fired, analysis running
        tokio::time::sleep(Duration::from_millis(1600)).await;
        assert_eq!(provider.seen.lock().unwrap().len(), 1);

        session.close(&id);
        tokio::time::sleep(Duration::from_secs(3)).await;

        let ctx = session.orchestrator().context();
        assert!(!ctx.store.contains(&id));
        assert!(ctx.cache.is_empty());
        assert!(ctx.diagnostics.get(&id).is_empty());
    }

    #[tokio::test]
    async fn test_toggle_persists_preference() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let (session, _provider) = session(false);
        let session = session.with_preferences(path.clone());

        let on = session.toggle_auto_review();
        assert!(on.enabled);
        assert_eq!(on.message, "Auto-review on save enabled");
        assert!(ConfigLoader::load_from_file(&path).unwrap().auto_review.enabled);

        let off = session.toggle_auto_review();
        assert_eq!(off.message, "Auto-review on save disabled");
        assert!(!ConfigLoader::load_from_file(&path).unwrap().auto_review.enabled);
    }
}
