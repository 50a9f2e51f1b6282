//! Unified Error Type System
//!
//! Centralized error types for the entire application.
//! External analysis failures are classified into a small taxonomy so that
//! every kind gets its own user-facing message.
//!
//! ## Error Categories
//!
//! - **Configuration**: Missing or rejected credential (fails the operation, not the process)
//! - **RateLimit**: Provider throttling (user may retry, never automatic)
//! - **Timeout**: The request took too long
//! - **MalformedResponse**: The transport envelope could not be decoded
//! - **Generic**: Anything else

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Error Categories
// =============================================================================

/// Analysis failure categories used for user-facing messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Credential missing or rejected
    Configuration,
    /// Provider rate limited the request
    RateLimit,
    /// Request exceeded its deadline
    Timeout,
    /// Response envelope was not decodable
    MalformedResponse,
    /// Catch-all
    Generic,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::MalformedResponse => write!(f, "MALFORMED_RESPONSE"),
            Self::Generic => write!(f, "GENERIC"),
        }
    }
}

impl ErrorCategory {
    /// Whether asking the user to try again makes sense.
    ///
    /// Advisory only: nothing in the engine retries on its own.
    pub fn is_retryable_by_user(&self) -> bool {
        matches!(self, Self::RateLimit | Self::Timeout | Self::Generic)
    }

    /// Short user-facing message for this category
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Configuration => {
                "AI review is not configured: the API key is missing or was rejected."
            }
            Self::RateLimit => "Rate limit exceeded. Please wait a moment and try again.",
            Self::Timeout => "Request timed out. The code analysis is taking too long.",
            Self::MalformedResponse => "The review service returned a response that could not be read.",
            Self::Generic => "AI review failed.",
        }
    }
}

// =============================================================================
// Analysis Error
// =============================================================================

/// Classified failure of the external analysis call
#[derive(Debug, Clone)]
pub struct AnalysisError {
    /// Error category for user-facing routing
    pub category: ErrorCategory,
    /// Detailed error message
    pub message: String,
    /// HTTP status, when the failure came from a response
    pub status: Option<u16>,
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "[{}:{}] {}", self.category, status, self.message),
            None => write!(f, "[{}] {}", self.category, self.message),
        }
    }
}

impl std::error::Error for AnalysisError {}

impl AnalysisError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

/// Maps provider failures onto [`ErrorCategory`]
pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an error message returned by a provider
    pub fn classify(message: &str) -> AnalysisError {
        let lower = message.to_lowercase();

        if lower.contains("api key")
            || lower.contains("not configured")
            || lower.contains("unauthorized")
            || lower.contains("configuration error")
        {
            return AnalysisError::new(ErrorCategory::Configuration, message);
        }

        if lower.contains("rate limit") || lower.contains("too many requests") {
            return AnalysisError::new(ErrorCategory::RateLimit, message);
        }

        if lower.contains("timeout") || lower.contains("timed out") {
            return AnalysisError::new(ErrorCategory::Timeout, message);
        }

        AnalysisError::new(ErrorCategory::Generic, message)
    }

    /// Classify an HTTP status, letting the body refine generic server errors
    pub fn classify_http_status(status: u16, message: &str) -> AnalysisError {
        let category = match status {
            401 | 403 => ErrorCategory::Configuration,
            429 => ErrorCategory::RateLimit,
            408 | 504 => ErrorCategory::Timeout,
            // The backend reports a missing key as a 500 with a telling body
            500 => Self::classify(message).category,
            _ => ErrorCategory::Generic,
        };
        AnalysisError::new(category, message).with_status(status)
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum MentorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config error: {0}")]
    Config(String),

    /// Classified failure of the external analysis call
    #[error("Analysis error: {0}")]
    Analysis(AnalysisError),

    #[error("Document is not open: {0}")]
    NotOpen(String),

    /// The document was cleared or closed while its review ran
    #[error("Review discarded, document was cleared or closed: {0}")]
    Discarded(String),

    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },
}

impl From<AnalysisError> for MentorError {
    fn from(err: AnalysisError) -> Self {
        MentorError::Analysis(err)
    }
}

pub type Result<T> = std::result::Result<T, MentorError>;

impl MentorError {
    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create an analysis error with a category
    pub fn analysis(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self::Analysis(AnalysisError::new(category, message))
    }

    /// Category used to pick the user-facing message
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Analysis(e) => e.category,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Config(_) => ErrorCategory::Configuration,
            Self::Json(_) => ErrorCategory::MalformedResponse,
            Self::Http(e) if e.is_timeout() => ErrorCategory::Timeout,
            Self::Http(e) if e.is_decode() => ErrorCategory::MalformedResponse,
            Self::Http(_) | Self::Io(_) | Self::NotOpen(_) | Self::Discarded(_) => {
                ErrorCategory::Generic
            }
        }
    }

    /// Message to show the user for this failure
    pub fn user_message(&self) -> String {
        let category = self.category();
        match (category, self) {
            (ErrorCategory::Generic, Self::Analysis(e)) => {
                format!("{} {}", category.user_message(), e.message)
            }
            (ErrorCategory::Generic, other) => format!("{} {}", category.user_message(), other),
            (ErrorCategory::Configuration, Self::Config(msg)) => {
                format!("{} {}", category.user_message(), msg)
            }
            _ => category.user_message().to_string(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
