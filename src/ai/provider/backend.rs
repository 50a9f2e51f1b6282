//! Review Backend Provider
//!
//! Talks to the review backend server. The backend answers `POST
//! /api/review` with either a structured review object or
//! `{"review": "<text>"}` when the model's output was not JSON.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::{HealthStatus, ProviderConfig, ReviewProvider};
use crate::constants::network as net_constants;
use crate::types::{AnalysisError, ErrorCategory, ErrorClassifier, MentorError, Result};

pub struct BackendProvider {
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for BackendProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendProvider")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl BackendProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let parsed = Url::parse(&config.backend_url).map_err(|e| {
            MentorError::Config(format!(
                "Invalid backend URL '{}': {}",
                config.backend_url, e
            ))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(MentorError::Config(format!(
                "Backend URL must be http or https: {}",
                config.backend_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MentorError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.backend_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn send_error(&self, e: reqwest::Error) -> MentorError {
        if e.is_timeout() {
            MentorError::analysis(
                ErrorCategory::Timeout,
                "Request timed out. The code analysis is taking too long.",
            )
        } else if e.is_connect() {
            MentorError::analysis(
                ErrorCategory::Generic,
                format!(
                    "Cannot connect to backend server at {}. Please ensure the backend server is running.",
                    self.base_url
                ),
            )
        } else {
            MentorError::Http(e)
        }
    }
}

#[derive(Debug, Serialize)]
struct ReviewRequest<'a> {
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusBody {
    status: Option<String>,
    api_key_configured: Option<bool>,
    model: Option<String>,
    message: Option<String>,
}

/// `message` (or `error`) field of a JSON error body
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Classify a non-success response
fn status_error(status: u16, body: &str) -> AnalysisError {
    let detail = error_message(body);
    match status {
        400 => AnalysisError::new(
            ErrorCategory::Generic,
            format!(
                "Bad request: {}",
                detail.as_deref().unwrap_or("Invalid code provided")
            ),
        )
        .with_status(status),
        500 => ErrorClassifier::classify_http_status(
            status,
            &format!(
                "Server error: {}",
                detail
                    .as_deref()
                    .unwrap_or("The backend encountered an error")
            ),
        ),
        _ => ErrorClassifier::classify_http_status(
            status,
            &detail.unwrap_or_else(|| format!("Server returned error status {}", status)),
        ),
    }
}

/// Raw review text from a success body: the `review` string when the
/// backend wrapped unparsed output, otherwise the body itself.
fn raw_review_text(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("review") {
            Some(Value::String(text)) => text.clone(),
            _ => Value::Object(map).to_string(),
        },
        Ok(Value::String(text)) => text,
        _ => body.to_string(),
    }
}

#[async_trait]
impl ReviewProvider for BackendProvider {
    async fn analyze(&self, code: &str, language: Option<&str>) -> Result<String> {
        let url = format!("{}/api/review", self.base_url);
        debug!(
            "Sending {} bytes to {} (language: {})",
            code.len(),
            url,
            language.unwrap_or("unknown")
        );

        let response = self
            .client
            .post(&url)
            .json(&ReviewRequest { code, language })
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.send_error(e))?;

        if !status.is_success() {
            let err = status_error(status.as_u16(), &body);
            warn!("Backend review failed: {}", err);
            return Err(err.into());
        }

        info!("Received review from backend ({} bytes)", body.len());
        Ok(raw_review_text(&body))
    }

    async fn check_status(&self) -> Result<HealthStatus> {
        let timeout = Duration::from_secs(net_constants::HEALTH_TIMEOUT_SECS);
        let status_url = format!("{}/api/review/status", self.base_url);

        match self.client.get(&status_url).timeout(timeout).send().await {
            Ok(resp) if resp.status().is_success() => {
                let body: StatusBody = resp.json().await.unwrap_or_default();
                let configured = body
                    .api_key_configured
                    .unwrap_or(body.status.as_deref() == Some("ok"));
                return Ok(HealthStatus {
                    configured,
                    reachable: Some(true),
                    model: body.model,
                    message: body.message,
                });
            }
            Ok(resp) => debug!("Review status endpoint returned {}", resp.status()),
            Err(e) => debug!("Review status endpoint failed: {}", e),
        }

        let health_url = format!("{}/health", self.base_url);
        let reachable = matches!(
            self.client.get(&health_url).timeout(timeout).send().await,
            Ok(resp) if resp.status().is_success()
        );

        let message = if reachable {
            "Backend is running but did not report review status".to_string()
        } else {
            format!("Cannot connect to backend server at {}", self.base_url)
        };
        Ok(HealthStatus {
            configured: false,
            reachable: Some(reachable),
            model: None,
            message: Some(message),
        })
    }

    fn name(&self) -> &str {
        "backend"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(url: &str) -> BackendProvider {
        BackendProvider::new(&ProviderConfig {
            backend_url: url.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_raw_review_text() {
        assert_eq!(raw_review_text(r#"{"review":"Score: 7"}"#), "Score: 7");
        assert_eq!(raw_review_text("plain words"), "plain words");

        let structured = raw_review_text(r#"{"score":8,"summary":"ok","suggestions":[]}"#);
        let value: Value = serde_json::from_str(&structured).unwrap();
        assert_eq!(value["score"], 8);
    }

    #[test]
    fn test_status_error_mapping() {
        let config = status_error(
            500,
            r#"{"error":"Configuration Error","message":"API key not configured. Please check server configuration."}"#,
        );
        assert_eq!(config.category, ErrorCategory::Configuration);

        let rate = status_error(429, r#"{"message":"Too many requests."}"#);
        assert_eq!(rate.category, ErrorCategory::RateLimit);

        let bad = status_error(400, r#"{"message":"Missing code"}"#);
        assert_eq!(bad.category, ErrorCategory::Generic);
        assert_eq!(bad.message, "Bad request: Missing code");

        let other = status_error(502, "<html>");
        assert_eq!(other.message, "Server returned error status 502");
        assert_eq!(other.status, Some(502));
    }

    #[test]
    fn test_rejects_non_http_url() {
        assert!(
            BackendProvider::new(&ProviderConfig {
                backend_url: "ftp://example.com".to_string(),
                ..Default::default()
            })
            .is_err()
        );
        assert_eq!(provider("http://localhost:3000/").base_url(), "http://localhost:3000");
    }

    #[tokio::test]
    async fn test_analyze_unwraps_review_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/review"))
            .and(body_json(serde_json::json!({"code": "x = 1", "language": "python"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"review": "Rating: 6/10\n\nFine."})),
            )
            .mount(&server)
            .await;

        let raw = provider(&server.uri())
            .analyze("x = 1", Some("python"))
            .await
            .unwrap();
        assert_eq!(raw, "Rating: 6/10\n\nFine.");
    }

    #[tokio::test]
    async fn test_analyze_classifies_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/review"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(serde_json::json!({"message": "Too many requests."})),
            )
            .mount(&server)
            .await;

        let err = provider(&server.uri())
            .analyze("x", None)
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::RateLimit);
    }

    #[tokio::test]
    async fn test_analyze_connection_refused() {
        let err = provider("http://127.0.0.1:1")
            .analyze("x", None)
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Generic);
        assert!(err.to_string().contains("Cannot connect"));
    }

    #[tokio::test]
    async fn test_check_status_reads_status_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/review/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ok",
                "apiKeyConfigured": true,
                "model": "stepfun/step-3.5-flash:free"
            })))
            .mount(&server)
            .await;

        let health = provider(&server.uri()).check_status().await.unwrap();
        assert!(health.configured);
        assert_eq!(health.reachable, Some(true));
        assert_eq!(health.model.as_deref(), Some("stepfun/step-3.5-flash:free"));
    }

    #[tokio::test]
    async fn test_check_status_falls_back_to_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let health = provider(&server.uri()).check_status().await.unwrap();
        assert!(!health.configured);
        assert_eq!(health.reachable, Some(true));
    }
}
