//! OpenRouter Provider
//!
//! Direct chat-completions call for running without the review backend.
//! A missing API key is reported per request as a configuration failure,
//! so the engine stays usable for everything else.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{HealthStatus, ProviderConfig, ReviewProvider};
use crate::ai::prompt::{review_system_prompt, review_user_prompt};
use crate::types::{AnalysisError, ErrorCategory, ErrorClassifier, MentorError, Result};

const DEFAULT_API_BASE: &str = "https://openrouter.ai/api/v1";
const DEFAULT_MODEL: &str = "stepfun/step-3.5-flash:free";
const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// OpenRouter provider with secure API key handling
pub struct OpenRouterProvider {
    /// Never exposed in logs or debug output
    api_key: Option<SecretString>,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: usize,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenRouterProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl OpenRouterProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::from);

        if api_key.is_none() {
            warn!("{} not set, OpenRouter reviews will fail until configured", API_KEY_ENV);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MentorError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            api_base: config
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        })
    }

    fn build_request(&self, code: &str, language: Option<&str>) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: review_system_prompt(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: review_user_prompt(code, language),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

/// Classify a non-success OpenRouter response
fn status_error(status: u16, body: &str) -> AnalysisError {
    match status {
        401 => AnalysisError::new(ErrorCategory::Configuration, "Invalid OpenRouter API key")
            .with_status(status),
        429 => AnalysisError::new(
            ErrorCategory::RateLimit,
            "Rate limit exceeded - please try again later",
        )
        .with_status(status),
        500 | 503 => AnalysisError::new(
            ErrorCategory::Generic,
            "OpenRouter service temporarily unavailable",
        )
        .with_status(status),
        _ => {
            let detail = serde_json::from_str::<ErrorResponse>(body)
                .ok()
                .and_then(|e| e.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            ErrorClassifier::classify_http_status(
                status,
                &format!("OpenRouter API error: {}", detail),
            )
        }
    }
}

#[async_trait]
impl ReviewProvider for OpenRouterProvider {
    async fn analyze(&self, code: &str, language: Option<&str>) -> Result<String> {
        let Some(api_key) = &self.api_key else {
            return Err(MentorError::analysis(
                ErrorCategory::Configuration,
                "OpenRouter API key not configured",
            ));
        };

        info!(
            "Reviewing with OpenRouter (model: {}, temperature: {})",
            self.model, self.temperature
        );

        let start_time = Instant::now();
        let url = format!("{}/chat/completions", self.api_base);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key.expose_secret()))
            .header("HTTP-Referer", "http://localhost")
            .header("X-Title", "AI Code Mentor")
            .json(&self.build_request(code, language))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MentorError::analysis(
                        ErrorCategory::Timeout,
                        "Request timeout - code analysis took too long",
                    )
                } else {
                    MentorError::analysis(
                        ErrorCategory::Generic,
                        format!("Code analysis failed: {}", e),
                    )
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let err = status_error(status, &body);
            warn!("OpenRouter request failed: {}", err);
            return Err(err.into());
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|e| {
            MentorError::analysis(
                ErrorCategory::MalformedResponse,
                format!("Failed to decode OpenRouter response: {}", e),
            )
        })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                MentorError::analysis(
                    ErrorCategory::MalformedResponse,
                    "No content in OpenRouter response",
                )
            })?;

        debug!(
            "Received {} characters from OpenRouter in {:?}",
            content.len(),
            start_time.elapsed()
        );
        Ok(content)
    }

    async fn check_status(&self) -> Result<HealthStatus> {
        let configured = self.api_key.is_some();
        Ok(HealthStatus {
            configured,
            reachable: None,
            model: Some(self.model.clone()),
            message: (!configured).then(|| "OpenRouter API key not configured".to_string()),
        })
    }

    fn name(&self) -> &str {
        "openrouter"
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}
