pub mod error;
pub mod language;
pub mod review;

pub use error::{AnalysisError, ErrorCategory, ErrorClassifier, MentorError, Result};
pub use language::{detect_language, is_source_file};
pub use review::{Finding, ParsedReview, SharedReview, Suggestion};

// =============================================================================
// Domain Newtypes
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Type-safe wrapper for document identity.
///
/// One identity scheme is shared by the cache, the store, and the
/// diagnostics collection: the exact URI string, compared case-sensitively
/// and without further normalization. Paths are converted to `file://` URIs
/// once, at the edge, by [`DocumentId::from_path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Build a `file://` identity for a filesystem path
    pub fn from_path(path: &Path) -> Self {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        };

        match url::Url::from_file_path(&absolute) {
            Ok(url) => Self(url.to_string()),
            Err(()) => Self(absolute.display().to_string()),
        }
    }

    /// Filesystem path for `file://` identities
    pub fn to_file_path(&self) -> Option<PathBuf> {
        url::Url::parse(&self.0).ok()?.to_file_path().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
