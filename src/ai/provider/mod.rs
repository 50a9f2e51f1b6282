//! Review Provider Abstraction
//!
//! The external analysis collaborator: given source text and an optional
//! language, return the model's raw review text. Providers classify their
//! failures into [`ErrorCategory`] so the engine can pick a user message;
//! they never retry on their own.
//!
//! ## Modules
//!
//! - `backend`: the review backend server (`POST /api/review`)
//! - `openrouter`: direct OpenRouter chat completions

mod backend;
mod openrouter;

pub use backend::BackendProvider;
pub use openrouter::OpenRouterProvider;

pub use crate::types::{ErrorCategory, ErrorClassifier};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use crate::constants::network as net_constants;
use crate::types::{MentorError, Result};

// =============================================================================
// Health Status
// =============================================================================

/// Informational provider health; never gates a review
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Credentials are present where the provider needs them
    pub configured: bool,
    /// The provider answered; `None` when it was not contacted
    pub reachable: Option<bool>,
    pub model: Option<String>,
    pub message: Option<String>,
}

/// Shared provider type for concurrent access across reviews.
pub type SharedProvider = Arc<dyn ReviewProvider>;

// =============================================================================
// Provider Configuration
// =============================================================================

/// Which provider implementation to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProviderKind {
    #[default]
    #[serde(rename = "backend")]
    Backend,
    #[serde(rename = "openrouter")]
    OpenRouter,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backend => write!(f, "backend"),
            Self::OpenRouter => write!(f, "openrouter"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = MentorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "backend" => Ok(Self::Backend),
            "openrouter" => Ok(Self::OpenRouter),
            other => Err(MentorError::Config(format!(
                "Unknown provider: {}. Supported: backend, openrouter",
                other
            ))),
        }
    }
}

/// Configuration for review providers
///
/// Note: the API key is never serialized and is redacted in debug output.
/// Providers convert it to `SecretString` internally.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Base URL of the review backend
    pub backend_url: String,
    /// Model name (OpenRouter only)
    pub model: Option<String>,
    /// OpenRouter API base override
    pub api_base: Option<String>,
    /// OpenRouter API key. Never serialized to output.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("backend_url", &self.backend_url)
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Backend,
            backend_url: net_constants::DEFAULT_BACKEND_URL.to_string(),
            model: None,
            api_base: None,
            api_key: None,
            timeout_secs: net_constants::DEFAULT_TIMEOUT_SECS,
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

// =============================================================================
// Review Provider Trait
// =============================================================================

#[async_trait]
pub trait ReviewProvider: Send + Sync {
    /// Analyze source text, returning the model's raw review text.
    ///
    /// The text is handed to the review parser unmodified; it may be JSON,
    /// fenced JSON, or prose.
    async fn analyze(&self, code: &str, language: Option<&str>) -> Result<String>;

    /// Probe provider health. Informational only.
    async fn check_status(&self) -> Result<HealthStatus>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Create a shared provider from configuration
pub fn create_provider(config: &ProviderConfig) -> Result<SharedProvider> {
    match config.kind {
        ProviderKind::Backend => Ok(Arc::new(BackendProvider::new(config)?)),
        ProviderKind::OpenRouter => Ok(Arc::new(OpenRouterProvider::new(config)?)),
    }
}
