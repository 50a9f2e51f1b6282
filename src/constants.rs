//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Review parsing defaults
pub mod review {
    /// Score used when the model gives none or an unparseable one
    pub const DEFAULT_SCORE: u8 = 5;

    /// Highest score on the review scale
    pub const MAX_SCORE: u8 = 10;

    /// Summary used when the model gives none
    pub const DEFAULT_SUMMARY: &str = "Code reviewed";
}

/// Auto-review scheduler constants
pub mod auto_review {
    /// Quiet period after the last save before a review is dispatched (milliseconds)
    pub const DEBOUNCE_MS: u64 = 1500;
}

/// Status display constants
pub mod status {
    /// How long the "done" score stays visible before reverting to idle (seconds)
    pub const DONE_DISPLAY_SECS: u64 = 5;
}

/// Diagnostics constants
pub mod diagnostics {
    /// Source label attached to every annotation
    pub const SOURCE: &str = "AI Code Mentor";
}

/// HTTP/Network constants
pub mod network {
    /// Default backend URL
    pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3000";

    /// Default analysis request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Health check timeout (seconds)
    pub const HEALTH_TIMEOUT_SECS: u64 = 5;
}

/// Workspace review constants
pub mod workspace {
    /// Files reviewed concurrently by a workspace review
    pub const DEFAULT_CONCURRENCY: usize = 4;
}
