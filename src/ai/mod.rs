//! AI Integration Layer
//!
//! Provider seam for the external analysis call, prompt construction,
//! and timeout handling.

pub mod prompt;
pub mod provider;
pub mod timeout;

pub use prompt::{PromptBuilder, PromptSection, review_system_prompt, review_user_prompt};
pub use provider::{
    BackendProvider, HealthStatus, OpenRouterProvider, ProviderConfig, ProviderKind,
    ReviewProvider, SharedProvider, create_provider,
};
pub use timeout::with_timeout;
