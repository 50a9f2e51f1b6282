//! Review State Engine
//!
//! Parser, content-addressed cache, store, auto-review scheduler, and the
//! orchestrator that ties them to the projections.

pub mod cache;
pub mod orchestrator;
pub mod parser;
pub mod scheduler;
pub mod session;
pub mod store;

pub use cache::{CacheStats, CachedEntry, ReviewCache, content_hash};
pub use orchestrator::{ReviewContext, ReviewOrchestrator, ReviewOutcome, ReviewSource};
pub use parser::{ParseOutcome, ReviewParser, parse_review};
pub use scheduler::{AutoReviewScheduler, ScheduleState};
pub use session::{AutoReviewToggle, MentorSession, NO_REVIEW_MESSAGE};
pub use store::ReviewStore;
