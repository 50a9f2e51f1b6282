//! Review Command
//!
//! One-shot review of files and directories from the terminal.
//!
//! Usage:
//!   codementor review src/main.rs
//!   codementor review src/ --concurrency 8 -f json

use futures::stream::{self, StreamExt};
use ignore::WalkBuilder;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::ai::create_provider;
use crate::cli::Output;
use crate::config::Config;
use crate::constants::review as review_constants;
use crate::editor::{NullSink, RenderSink};
use crate::projection::Annotation;
use crate::review::{ReviewContext, ReviewOrchestrator, ReviewSource};
use crate::types::{DocumentId, MentorError, Result, detect_language, is_source_file};

/// Per-file result of a terminal review
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ReviewSource>,
    pub annotations: Vec<Annotation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    fn failed(path: &Path, message: String) -> Self {
        Self {
            path: path.display().to_string(),
            score: None,
            summary: None,
            source: None,
            annotations: Vec::new(),
            error: Some(message),
        }
    }
}

/// Expand the given paths into reviewable files.
///
/// Files named explicitly are always kept. Directories are walked with
/// gitignore rules and filtered to known source extensions.
pub fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            let walker = WalkBuilder::new(path)
                .hidden(true)
                .git_ignore(true)
                .git_global(true)
                .git_exclude(true)
                .follow_links(false)
                .build();

            for entry in walker {
                match entry {
                    Ok(entry) => {
                        let entry_path = entry.path();
                        if entry_path.is_file() && is_source_file(entry_path) {
                            files.push(entry_path.to_path_buf());
                        }
                    }
                    Err(e) => warn!("Skipping unreadable entry: {}", e),
                }
            }
        } else {
            return Err(MentorError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Path not found: {}", path.display()),
            )));
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Review every file with bounded concurrency. Reports come back sorted by path.
pub async fn review_files(
    orchestrator: &ReviewOrchestrator,
    files: Vec<PathBuf>,
    concurrency: usize,
) -> Vec<FileReport> {
    let mut reports: Vec<FileReport> = stream::iter(files)
        .map(|path| review_file(orchestrator, path))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    reports.sort_by(|a, b| a.path.cmp(&b.path));
    reports
}

async fn review_file(orchestrator: &ReviewOrchestrator, path: PathBuf) -> FileReport {
    let text = match tokio::fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(e) => return FileReport::failed(&path, format!("Cannot read file: {}", e)),
    };

    let id = DocumentId::from_path(&path);
    let language = detect_language(&path);
    debug!("Reviewing {} ({:?})", path.display(), language);

    match orchestrator.review(&id, &text, language).await {
        Ok(outcome) => FileReport {
            path: path.display().to_string(),
            score: Some(outcome.review.score),
            summary: Some(outcome.review.summary.clone()),
            source: Some(outcome.source),
            annotations: orchestrator.context().diagnostics.get(&id),
            error: None,
        },
        Err(e) => FileReport::failed(&path, e.user_message()),
    }
}

/// Run the review command. Returns the number of files that failed.
pub async fn run(
    config: &Config,
    paths: Vec<PathBuf>,
    format: &str,
    concurrency: Option<usize>,
) -> Result<usize> {
    let files = collect_files(&paths)?;
    let output = Output::new();

    if files.is_empty() {
        if format == "json" {
            println!("[]");
        } else {
            output.warning("No source files to review");
        }
        return Ok(0);
    }

    let provider = create_provider(&config.provider)?;
    let sink: Arc<dyn RenderSink> = Arc::new(NullSink);
    let orchestrator = ReviewOrchestrator::new(
        provider,
        ReviewContext::from_config(Arc::clone(&sink), config),
        sink,
        config.request_timeout(),
    );

    let concurrency = concurrency.unwrap_or(config.workspace.concurrency);
    let reports = review_files(&orchestrator, files, concurrency).await;
    let failed = reports.iter().filter(|r| r.error.is_some()).count();

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        print_reports(&output, &reports);
    }

    Ok(failed)
}

fn print_reports(output: &Output, reports: &[FileReport]) {
    for report in reports {
        output.section(&report.path);

        if let Some(error) = &report.error {
            output.error(error);
            continue;
        }

        if let Some(score) = report.score {
            output.score("Score:", score, review_constants::MAX_SCORE);
        }
        if let Some(summary) = &report.summary {
            println!("{}", summary);
        }
        for annotation in &report.annotations {
            output.annotation(annotation);
        }
    }

    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    println!();
    if failed == 0 {
        output.success(&format!("Reviewed {} file(s)", reports.len()));
    } else {
        output.warning(&format!(
            "Reviewed {} file(s), {} failed",
            reports.len() - failed,
            failed
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{HealthStatus, ReviewProvider};
    use crate::projection::ProjectionOptions;
    use async_trait::async_trait;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    struct FixedProvider;

    #[async_trait]
    impl ReviewProvider for FixedProvider {
        async fn analyze(&self, code: &str, _language: Option<&str>) -> Result<String> {
            if code.contains("boom") {
                return Err(MentorError::Config("OpenRouter API key missing".to_string()));
            }
            Ok(r#"{"score": 7, "summary": "Fine", "suggestions": [{"line": 1, "suggestion": "Name it better"}]}"#.to_string())
        }

        async fn check_status(&self) -> Result<HealthStatus> {
            Ok(HealthStatus::default())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn orchestrator() -> ReviewOrchestrator {
        let sink: Arc<dyn RenderSink> = Arc::new(NullSink);
        ReviewOrchestrator::new(
            Arc::new(FixedProvider),
            ReviewContext::new(
                Arc::clone(&sink),
                ProjectionOptions::default(),
                Duration::from_secs(5),
            ),
            sink,
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_collect_files_walks_sources_only() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/lib.rs"), "fn a() {}").unwrap();
        fs::write(dir.path().join("src/notes.txt"), "notes").unwrap();
        fs::write(dir.path().join("main.py"), "print(1)").unwrap();

        let files = collect_files(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("main.py"), dir.path().join("src/lib.rs")]
        );
    }

    #[test]
    fn test_collect_files_keeps_explicit_files() {
        let dir = TempDir::new().unwrap();
        let notes = dir.path().join("notes.txt");
        fs::write(&notes, "notes").unwrap();

        assert_eq!(collect_files(&[notes.clone()]).unwrap(), vec![notes]);
        assert!(collect_files(&[dir.path().join("missing")]).is_err());
    }

    #[tokio::test]
    async fn test_review_files_reports_each_file() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("a.rs");
        let bad = dir.path().join("b.rs");
        fs::write(&good, "fn main() {}").unwrap();
        fs::write(&bad, "boom").unwrap();

        let reports = review_files(&orchestrator(), vec![bad, good], 2).await;
        assert_eq!(reports.len(), 2);

        assert_eq!(reports[0].score, Some(7));
        assert_eq!(reports[0].summary.as_deref(), Some("Fine"));
        // suggestion plus score hint
        assert_eq!(reports[0].annotations.len(), 2);
        assert!(reports[0].error.is_none());

        assert!(reports[1].score.is_none());
        assert!(reports[1].error.is_some());
    }
}
