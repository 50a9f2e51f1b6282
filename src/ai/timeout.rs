//! Timeout wrapper for external calls
//!
//! An elapsed deadline is a failure of the call, reported as
//! [`MentorError::Timeout`]. The caller's state machine still runs to
//! completion.

use std::future::Future;
use std::time::Duration;

use crate::types::{MentorError, Result};

/// Execute an async operation with a timeout
///
/// ```ignore
/// let raw = with_timeout(
///     Duration::from_secs(30),
///     provider.analyze(code, language),
///     "code analysis"
/// ).await?;
/// ```
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(MentorError::timeout(operation_name, timeout)),
    }
}
