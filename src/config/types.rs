//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/codementor/) and project (.codementor/) level configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ai::ProviderConfig;
use crate::constants::{auto_review, diagnostics, status, workspace};
use crate::projection::ProjectionOptions;
use crate::types::{MentorError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Review provider settings
    pub provider: ProviderConfig,

    /// Auto-review on save
    pub auto_review: AutoReviewConfig,

    /// Status bar display
    pub status: StatusConfig,

    /// Annotation rendering
    pub diagnostics: DiagnosticsConfig,

    /// Workspace review
    pub workspace: WorkspaceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            provider: ProviderConfig::default(),
            auto_review: AutoReviewConfig::default(),
            status: StatusConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
            workspace: WorkspaceConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `MentorError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(MentorError::Config(format!(
                "Provider temperature must be between 0.0 and 2.0, got {}",
                self.provider.temperature
            )));
        }

        if self.provider.timeout_secs == 0 {
            return Err(MentorError::Config(
                "Provider timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.provider.max_tokens == 0 {
            return Err(MentorError::Config(
                "Provider max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.auto_review.debounce_ms == 0 {
            return Err(MentorError::Config(
                "Auto-review debounce_ms must be greater than 0".to_string(),
            ));
        }

        if self.workspace.concurrency == 0 {
            return Err(MentorError::Config(
                "Workspace concurrency must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Deadline for one external analysis call
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.timeout_secs)
    }
}

// =============================================================================
// Auto-Review Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoReviewConfig {
    /// Review documents automatically after they are saved
    pub enabled: bool,
    /// Quiet period after the last save (milliseconds)
    pub debounce_ms: u64,
}

impl Default for AutoReviewConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            debounce_ms: auto_review::DEBOUNCE_MS,
        }
    }
}

impl AutoReviewConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

// =============================================================================
// Status Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// How long a finished review's score stays visible (seconds)
    pub done_display_secs: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            done_display_secs: status::DONE_DISPLAY_SECS,
        }
    }
}

impl StatusConfig {
    pub fn display_window(&self) -> Duration {
        Duration::from_secs(self.done_display_secs)
    }
}

// =============================================================================
// Diagnostics Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Render the overall score as a hint on the first line
    pub score_hint: bool,
    /// Source label on annotations
    pub source: String,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            score_hint: true,
            source: diagnostics::SOURCE.to_string(),
        }
    }
}

impl From<&DiagnosticsConfig> for ProjectionOptions {
    fn from(config: &DiagnosticsConfig) -> Self {
        Self {
            score_hint: config.score_hint,
            source: config.source.clone(),
        }
    }
}

// =============================================================================
// Workspace Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Files reviewed concurrently
    pub concurrency: usize,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            concurrency: workspace::DEFAULT_CONCURRENCY,
        }
    }
}
