//! Editor Collaborator Seams
//!
//! The engine never renders anything itself. It pushes annotation sets,
//! badges, status text, and messages into a [`RenderSink`], and asks a
//! [`DocumentVisibility`] whether a document is still open before an
//! auto-review fires.

use dashmap::DashMap;
use serde::Serialize;

use crate::projection::{Annotation, FileBadge, StatusView};
use crate::types::DocumentId;

/// Severity of a user-facing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Warning,
    Error,
}

/// Render target supplied by the editor.
///
/// Calls replace whatever was previously shown for the same document:
/// an empty annotation slice clears the document's annotations, a `None`
/// badge removes the badge.
pub trait RenderSink: Send + Sync {
    fn publish_annotations(&self, id: &DocumentId, annotations: &[Annotation]);

    fn publish_badge(&self, id: &DocumentId, badge: Option<&FileBadge>);

    fn publish_status(&self, status: &StatusView);

    fn show_message(&self, level: MessageLevel, message: &str);
}

/// Sink that drops everything (headless use)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl RenderSink for NullSink {
    fn publish_annotations(&self, _id: &DocumentId, _annotations: &[Annotation]) {}

    fn publish_badge(&self, _id: &DocumentId, _badge: Option<&FileBadge>) {}

    fn publish_status(&self, _status: &StatusView) {}

    fn show_message(&self, _level: MessageLevel, _message: &str) {}
}

/// Whether a document is still open in the editor
pub trait DocumentVisibility: Send + Sync {
    fn is_open(&self, id: &DocumentId) -> bool;
}

/// Snapshot of an open document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenDocument {
    pub text: String,
    pub language: Option<String>,
}

/// In-memory registry of open documents
#[derive(Debug, Default)]
pub struct OpenDocuments {
    docs: DashMap<DocumentId, OpenDocument>,
}

impl OpenDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, id: &DocumentId, text: impl Into<String>, language: Option<String>) {
        self.docs.insert(
            id.clone(),
            OpenDocument {
                text: text.into(),
                language,
            },
        );
    }

    /// Replace the text of an open document. Returns false if it is not open.
    pub fn update(&self, id: &DocumentId, text: impl Into<String>) -> bool {
        match self.docs.get_mut(id) {
            Some(mut doc) => {
                doc.text = text.into();
                true
            }
            None => false,
        }
    }

    pub fn close(&self, id: &DocumentId) -> bool {
        self.docs.remove(id).is_some()
    }

    pub fn get(&self, id: &DocumentId) -> Option<OpenDocument> {
        self.docs.get(id).map(|d| d.clone())
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl DocumentVisibility for OpenDocuments {
    fn is_open(&self, id: &DocumentId) -> bool {
        self.docs.contains_key(id)
    }
}
