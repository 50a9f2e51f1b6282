//! Bridge Command
//!
//! Drives a [`MentorSession`] from newline-delimited JSON on stdin and
//! writes render events as JSON lines on stdout. Logs go to stderr.
//!
//! ```text
//! → {"type":"open","uri":"file:///w/app.py","text":"print(1)"}
//! → {"type":"review","uri":"file:///w/app.py"}
//! ← {"type":"status","status":{"state":"scanning",...}}
//! ← {"type":"annotations","uri":"file:///w/app.py","annotations":[...]}
//! ```

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::ai::create_provider;
use crate::config::{Config, ConfigLoader};
use crate::editor::{MessageLevel, RenderSink};
use crate::projection::{Annotation, FileBadge, StatusView};
use crate::review::MentorSession;
use crate::types::{DocumentId, MentorError, Result};

// =============================================================================
// Protocol
// =============================================================================

/// Editor event read from stdin
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeEvent {
    Open {
        uri: DocumentId,
        text: String,
        #[serde(default)]
        language: Option<String>,
    },
    Change {
        uri: DocumentId,
        text: String,
    },
    Save {
        uri: DocumentId,
        #[serde(default)]
        text: Option<String>,
    },
    Close {
        uri: DocumentId,
    },
    Review {
        uri: DocumentId,
    },
    Clear {
        uri: DocumentId,
    },
    Hover {
        uri: DocumentId,
        line: u32,
    },
    Summary {
        uri: DocumentId,
    },
    ToggleAutoReview,
}

/// Render event written to stdout
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderEvent {
    Annotations {
        uri: DocumentId,
        annotations: Vec<Annotation>,
    },
    Badge {
        uri: DocumentId,
        badge: Option<FileBadge>,
    },
    Status {
        status: StatusView,
    },
    Hover {
        uri: DocumentId,
        line: u32,
        text: Option<String>,
    },
    Summary {
        uri: DocumentId,
        text: String,
    },
    AutoReview {
        enabled: bool,
    },
    Message {
        level: MessageLevel,
        message: String,
    },
}

// =============================================================================
// JSON Line Sink
// =============================================================================

/// [`RenderSink`] writing one JSON object per line
pub struct JsonLineSink<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLineSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn emit(&self, event: &RenderEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to encode render event: {}", e);
                return;
            }
        };

        let mut out = self.out.lock().unwrap_or_else(|p| p.into_inner());
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            warn!("Failed to write render event: {}", e);
        }
    }
}

impl<W: Write + Send> RenderSink for JsonLineSink<W> {
    fn publish_annotations(&self, id: &DocumentId, annotations: &[Annotation]) {
        self.emit(&RenderEvent::Annotations {
            uri: id.clone(),
            annotations: annotations.to_vec(),
        });
    }

    fn publish_badge(&self, id: &DocumentId, badge: Option<&FileBadge>) {
        self.emit(&RenderEvent::Badge {
            uri: id.clone(),
            badge: badge.cloned(),
        });
    }

    fn publish_status(&self, status: &StatusView) {
        self.emit(&RenderEvent::Status {
            status: status.clone(),
        });
    }

    fn show_message(&self, level: MessageLevel, message: &str) {
        self.emit(&RenderEvent::Message {
            level,
            message: message.to_string(),
        });
    }
}

// =============================================================================
// Bridge
// =============================================================================

pub struct Bridge<W> {
    session: Arc<MentorSession>,
    sink: Arc<JsonLineSink<W>>,
    tasks: JoinSet<()>,
}

impl<W: Write + Send + 'static> Bridge<W> {
    pub fn new(session: Arc<MentorSession>, sink: Arc<JsonLineSink<W>>) -> Self {
        Self {
            session,
            sink,
            tasks: JoinSet::new(),
        }
    }

    /// Handle one input line. Blank lines are ignored, bad JSON is reported.
    pub fn handle_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        match serde_json::from_str::<BridgeEvent>(line) {
            Ok(event) => self.handle(event),
            Err(e) => {
                warn!("Invalid bridge event: {}", e);
                self.sink
                    .show_message(MessageLevel::Error, &format!("Invalid event: {}", e));
            }
        }

        // Reap finished reviews
        while self.tasks.try_join_next().is_some() {}
    }

    pub fn handle(&mut self, event: BridgeEvent) {
        debug!("Bridge event: {:?}", event);
        match event {
            BridgeEvent::Open {
                uri,
                text,
                language,
            } => self.session.open(&uri, text, language),
            BridgeEvent::Change { uri, text } => {
                if !self.session.change(&uri, text) {
                    debug!("Change for unknown document {}", uri);
                }
            }
            BridgeEvent::Save { uri, text } => {
                self.session.save(&uri, text);
            }
            BridgeEvent::Close { uri } => self.session.close(&uri),
            BridgeEvent::Review { uri } => {
                let session = Arc::clone(&self.session);
                let sink = Arc::clone(&self.sink);
                self.tasks.spawn(async move {
                    // Provider failures are already reported by the orchestrator
                    if let Err(e @ MentorError::NotOpen(_)) = session.review(&uri).await {
                        sink.show_message(MessageLevel::Warning, &e.to_string());
                    }
                });
            }
            BridgeEvent::Clear { uri } => self.session.clear(&uri),
            BridgeEvent::Hover { uri, line } => {
                let text = self.session.hover(&uri, line);
                self.sink.emit(&RenderEvent::Hover { uri, line, text });
            }
            BridgeEvent::Summary { uri } => {
                let text = self.session.summary(&uri);
                self.sink.emit(&RenderEvent::Summary { uri, text });
            }
            BridgeEvent::ToggleAutoReview => {
                let toggle = self.session.toggle_auto_review();
                self.sink.emit(&RenderEvent::AutoReview {
                    enabled: toggle.enabled,
                });
            }
        }
    }

    /// Wait for in-flight reviews, then cancel pending auto-reviews
    pub async fn finish(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                warn!("Review task failed: {}", e);
            }
        }
        self.session.shutdown();
    }
}

/// Run the bridge until stdin closes
pub async fn run(config: &Config) -> Result<()> {
    let provider = create_provider(&config.provider)?;
    let sink = Arc::new(JsonLineSink::new(std::io::stdout()));
    let session = Arc::new(
        MentorSession::new(provider, sink.clone(), config)
            .with_preferences(ConfigLoader::project_config_path()),
    );

    info!(
        "Bridge started (auto-review {})",
        if session.scheduler().is_enabled() {
            "on"
        } else {
            "off"
        }
    );
    sink.publish_status(&session.orchestrator().context().status.view());

    let mut bridge = Bridge::new(session, sink);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        bridge.handle_line(&line);
    }

    bridge.finish().await;
    info!("Bridge input closed");
    Ok(())
}
