//! Code Mentor - AI Code Review State Engine
//!
//! Turns free-form model reviews into structured, cached, editor-visible
//! feedback.
//!
//! ## Core Features
//!
//! - **Tolerant Parsing**: any model output becomes a valid review
//! - **Content-Addressed Cache**: identical file content never hits the model twice
//! - **Editor Projections**: diagnostics, hover text, file badges, status bar
//! - **Auto-Review on Save**: debounced, cancel-safe per-document timers
//!
//! ## Quick Start
//!
//! ```ignore
//! use codementor::{ConfigLoader, MentorSession, NullSink, create_provider};
//!
//! let config = ConfigLoader::load()?;
//! let provider = create_provider(&config.provider)?;
//! let session = MentorSession::new(provider, Arc::new(NullSink), &config);
//!
//! let id = DocumentId::new("file:///work/app.py");
//! session.open(&id, "print('hi')", None);
//! let outcome = session.review(&id).await?;
//! println!("{}", session.summary(&id));
//! ```
//!
//! ## Modules
//!
//! - [`review`]: parser, cache, store, scheduler, orchestrator, session
//! - [`projection`]: diagnostics, hover, decorations, status bar
//! - [`ai`]: review providers, prompts, timeouts
//! - [`editor`]: render sink and open-document seams
//! - [`config`]: layered configuration

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod editor;
pub mod projection;
pub mod review;
pub mod types;

// =============================================================================
// Core Re-exports
// =============================================================================

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{ErrorCategory, MentorError, Result};

// Domain
pub use types::{DocumentId, ParsedReview, SharedReview, Suggestion};

// =============================================================================
// Engine Re-exports
// =============================================================================

pub use editor::{MessageLevel, NullSink, OpenDocuments, RenderSink};
pub use projection::{Annotation, FileBadge, Severity, StatusState, StatusView};
pub use review::{
    AutoReviewScheduler, MentorSession, ReviewCache, ReviewOrchestrator, ReviewOutcome,
    ReviewStore, parse_review,
};

// =============================================================================
// AI Re-exports
// =============================================================================

pub use ai::{HealthStatus, ReviewProvider, SharedProvider, create_provider, with_timeout};
