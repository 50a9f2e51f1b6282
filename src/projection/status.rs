//! Status Bar State Machine
//!
//! ```text
//! Idle ──review──▶ Scanning ──ok──▶ Done(score) ──window──▶ Idle
//!                     │
//!                     └──err──▶ Failed(message) ──window──▶ Idle
//! ```
//!
//! Every transition bumps a generation counter. A scheduled revert only
//! fires if no newer state was set in the meantime.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::debug;

use crate::editor::RenderSink;
use crate::types::DocumentId;

/// Current status-bar state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum StatusState {
    Idle,
    Scanning { document: DocumentId },
    Done { score: u8 },
    Failed { message: String },
}

impl std::fmt::Display for StatusState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Scanning { .. } => write!(f, "scanning"),
            Self::Done { .. } => write!(f, "done"),
            Self::Failed { .. } => write!(f, "failed"),
        }
    }
}

/// Rendered status-bar item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub state: StatusState,
    pub text: String,
    pub tooltip: String,
    /// Editor command bound to a click, if any
    pub command: Option<String>,
}

impl StatusView {
    pub fn from_state(state: StatusState) -> Self {
        let (text, tooltip, command) = match &state {
            StatusState::Idle => (
                "AI Mentor Ready".to_string(),
                "Click to review current file or workspace".to_string(),
                Some("review"),
            ),
            StatusState::Scanning { document } => (
                "Reviewing with AI...".to_string(),
                format!("AI is analyzing {}", document),
                None,
            ),
            StatusState::Done { score } => (
                format!("Code Score: {}/10", score),
                "Click to view full AI review result.".to_string(),
                Some("summary"),
            ),
            StatusState::Failed { message } => (
                "AI Review Failed".to_string(),
                message.clone(),
                Some("review"),
            ),
        };
        Self {
            state,
            text,
            tooltip,
            command: command.map(str::to_string),
        }
    }
}

struct StatusInner {
    state: StatusState,
    generation: u64,
}

/// Owns the status-bar state and publishes every transition to the sink
pub struct StatusManager {
    inner: Arc<Mutex<StatusInner>>,
    sink: Arc<dyn RenderSink>,
    display_window: Duration,
}

fn lock(inner: &Mutex<StatusInner>) -> MutexGuard<'_, StatusInner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl StatusManager {
    pub fn new(sink: Arc<dyn RenderSink>, display_window: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StatusInner {
                state: StatusState::Idle,
                generation: 0,
            })),
            sink,
            display_window,
        }
    }

    pub fn current(&self) -> StatusState {
        lock(&self.inner).state.clone()
    }

    pub fn view(&self) -> StatusView {
        StatusView::from_state(self.current())
    }

    pub fn idle(&self) {
        self.transition(StatusState::Idle);
    }

    pub fn scanning(&self, document: &DocumentId) {
        self.transition(StatusState::Scanning {
            document: document.clone(),
        });
    }

    /// Show the score, reverting to idle after the display window
    pub fn done(&self, score: u8) {
        let generation = self.transition(StatusState::Done { score });
        self.schedule_revert(generation);
    }

    /// Show a failure, reverting to idle after the display window
    pub fn failed(&self, message: impl Into<String>) {
        let generation = self.transition(StatusState::Failed {
            message: message.into(),
        });
        self.schedule_revert(generation);
    }

    fn transition(&self, state: StatusState) -> u64 {
        let mut inner = lock(&self.inner);
        inner.generation += 1;
        inner.state = state;
        // Publish under the lock so the sink sees transitions in order
        self.sink
            .publish_status(&StatusView::from_state(inner.state.clone()));
        inner.generation
    }

    fn schedule_revert(&self, generation: u64) {
        let Ok(handle) = Handle::try_current() else {
            debug!("No runtime available, status will not auto-revert");
            return;
        };

        let inner = Arc::clone(&self.inner);
        let sink = Arc::clone(&self.sink);
        let window = self.display_window;

        handle.spawn(async move {
            tokio::time::sleep(window).await;
            let mut current = lock(&inner);
            if current.generation != generation {
                return;
            }
            current.generation += 1;
            current.state = StatusState::Idle;
            sink.publish_status(&StatusView::from_state(StatusState::Idle));
        });
    }
}

impl std::fmt::Debug for StatusManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusManager")
            .field("state", &self.current())
            .field("display_window", &self.display_window)
            .finish()
    }
}
