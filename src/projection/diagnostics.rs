//! Diagnostics Projector
//!
//! Converts a review into line-anchored annotations for one document and
//! keeps the per-document annotation collection. Every update replaces the
//! previous set, so annotations from a superseded review never linger.
//!
//! Severity per category:
//!
//! | Category   | Severity    | Anchor             |
//! |------------|-------------|--------------------|
//! | suggestion | Information | suggestion line    |
//! | issue      | Warning     | finding line       |
//! | security   | Warning     | finding line       |
//! | score      | Hint        | first line (0)     |

use dashmap::DashMap;
use serde::Serialize;

use crate::constants::diagnostics as diag_constants;
use crate::types::{DocumentId, ParsedReview};

/// Annotation severity; suggestions are opinions, never errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Information,
    Hint,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Information => write!(f, "info"),
            Self::Hint => write!(f, "hint"),
        }
    }
}

/// Stable category tag carried by every annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Suggestion,
    Issue,
    Security,
    Score,
}

impl AnnotationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Suggestion => "suggestion",
            Self::Issue => "issue",
            Self::Security => "security",
            Self::Score => "score",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Suggestion => Severity::Information,
            Self::Issue | Self::Security => Severity::Warning,
            Self::Score => Severity::Hint,
        }
    }
}

/// Full extent of one line. Columns count UTF-16 code units, as editors do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LineRange {
    /// 0-based line
    pub line: u32,
    pub start_character: u32,
    pub end_character: u32,
}

/// Positioned, editor-visible marker
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Annotation {
    pub range: LineRange,
    pub severity: Severity,
    pub kind: AnnotationKind,
    pub message: String,
    pub source: String,
}

/// Projection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionOptions {
    /// Render the overall score as a hint on the first line
    pub score_hint: bool,
    /// Source label on every annotation
    pub source: String,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            score_hint: true,
            source: diag_constants::SOURCE.to_string(),
        }
    }
}

/// Clamp a 1-based model line into a 0-based index of a document with
/// `line_count` lines. Absent lines anchor to the first line.
pub fn clamp_line(line: Option<i64>, line_count: usize) -> Option<usize> {
    if line_count == 0 {
        return None;
    }
    let last = (line_count - 1) as i64;
    let target = line.map(|l| l.saturating_sub(1)).unwrap_or(0);
    Some(target.clamp(0, last) as usize)
}

/// Lines of a document as an editor sees them: `"a\n"` has two lines,
/// the empty text has none.
fn document_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect()
}

/// Project a review onto a document. Pure and deterministic.
pub fn project(text: &str, review: &ParsedReview, options: &ProjectionOptions) -> Vec<Annotation> {
    let lines = document_lines(text);
    if lines.is_empty() {
        return Vec::new();
    }

    let annotate = |kind: AnnotationKind, line: Option<i64>, message: &str| {
        let index = clamp_line(line, lines.len())?;
        Some(Annotation {
            range: LineRange {
                line: index as u32,
                start_character: 0,
                end_character: lines[index].encode_utf16().count() as u32,
            },
            severity: kind.severity(),
            kind,
            message: message.to_string(),
            source: options.source.clone(),
        })
    };

    let suggestions = review
        .suggestions
        .iter()
        .filter_map(|s| annotate(AnnotationKind::Suggestion, s.line, &s.suggestion));
    let issues = review
        .issues
        .iter()
        .filter_map(|f| annotate(AnnotationKind::Issue, f.line, &f.message));
    let security = review
        .security
        .iter()
        .filter_map(|f| annotate(AnnotationKind::Security, f.line, &f.message));

    let mut annotations: Vec<Annotation> = suggestions.chain(issues).chain(security).collect();

    if options.score_hint {
        let message = format!("AI code score: {}", review.score_label());
        annotations.extend(annotate(AnnotationKind::Score, Some(1), &message));
    }

    annotations
}

/// Per-document annotation collection
#[derive(Debug, Default)]
pub struct DiagnosticsProjector {
    collection: DashMap<DocumentId, Vec<Annotation>>,
    options: ProjectionOptions,
}

impl DiagnosticsProjector {
    pub fn new(options: ProjectionOptions) -> Self {
        Self {
            collection: DashMap::new(),
            options,
        }
    }

    /// Replace the document's annotations with the projection of `review`
    pub fn update(&self, id: &DocumentId, text: &str, review: &ParsedReview) -> Vec<Annotation> {
        let annotations = project(text, review, &self.options);
        self.collection.insert(id.clone(), annotations.clone());
        annotations
    }

    pub fn get(&self, id: &DocumentId) -> Vec<Annotation> {
        self.collection
            .get(id)
            .map(|a| a.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self, id: &DocumentId) -> bool {
        self.collection.remove(id).is_some()
    }

    pub fn options(&self) -> &ProjectionOptions {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Finding, Suggestion};

    const TEXT: &str = "fn main() {\n    let x = 1;\n    println!(\"{}\", x);\n}";

    fn plain() -> ProjectionOptions {
        ProjectionOptions {
            score_hint: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_clamp_line() {
        assert_eq!(clamp_line(Some(0), 4), Some(0));
        assert_eq!(clamp_line(None, 4), Some(0));
        assert_eq!(clamp_line(Some(-7), 4), Some(0));
        assert_eq!(clamp_line(Some(2), 4), Some(1));
        assert_eq!(clamp_line(Some(99), 4), Some(3));
        assert_eq!(clamp_line(Some(i64::MIN), 4), Some(0));
        assert_eq!(clamp_line(Some(3), 0), None);
    }

    #[test]
    fn test_suggestion_spans_full_line() {
        let review = ParsedReview::new(6, "ok")
            .with_suggestions(vec![Suggestion::new("Inline x").at(2)]);
        let annotations = project(TEXT, &review, &plain());

        assert_eq!(annotations.len(), 1);
        let a = &annotations[0];
        assert_eq!(a.range.line, 1);
        assert_eq!(a.range.start_character, 0);
        assert_eq!(a.range.end_character, "    let x = 1;".len() as u32);
        assert_eq!(a.severity, Severity::Information);
        assert_eq!(a.kind.as_str(), "suggestion");
        assert_eq!(a.source, "AI Code Mentor");
    }

    #[test]
    fn test_out_of_range_lines_are_clamped() {
        let review = ParsedReview::new(6, "ok").with_suggestions(vec![
            Suggestion::new("zero").at(0),
            Suggestion::new("absent"),
            Suggestion::new("past end").at(500),
        ]);
        let lines: Vec<u32> = project(TEXT, &review, &plain())
            .iter()
            .map(|a| a.range.line)
            .collect();
        assert_eq!(lines, vec![0, 0, 3]);
    }

    #[test]
    fn test_category_severities_and_score_hint() {
        let review = ParsedReview::new(4, "risky")
            .with_suggestions(vec![Suggestion::new("s").at(1)])
            .with_issues(vec![Finding::new("i").at(2)])
            .with_security(vec![Finding::new("sec").at(3)]);
        let annotations = project(TEXT, &review, &ProjectionOptions::default());

        let kinds: Vec<(AnnotationKind, Severity)> =
            annotations.iter().map(|a| (a.kind, a.severity)).collect();
        assert_eq!(
            kinds,
            vec![
                (AnnotationKind::Suggestion, Severity::Information),
                (AnnotationKind::Issue, Severity::Warning),
                (AnnotationKind::Security, Severity::Warning),
                (AnnotationKind::Score, Severity::Hint),
            ]
        );
        let score = annotations.last().unwrap();
        assert_eq!(score.range.line, 0);
        assert_eq!(score.message, "AI code score: 4/10");
    }

    #[test]
    fn test_empty_document_has_no_annotations() {
        let review = ParsedReview::new(6, "ok").with_suggestions(vec![Suggestion::new("s")]);
        assert!(project("", &review, &ProjectionOptions::default()).is_empty());
    }

    #[test]
    fn test_trailing_newline_counts_as_line() {
        let review = ParsedReview::new(6, "ok").with_suggestions(vec![Suggestion::new("s").at(9)]);
        let annotations = project("a\r\n", &review, &plain());
        assert_eq!(annotations[0].range.line, 1);
        assert_eq!(annotations[0].range.end_character, 0);
    }

    #[test]
    fn test_utf16_columns() {
        let review = ParsedReview::new(6, "ok").with_suggestions(vec![Suggestion::new("s")]);
        let annotations = project("let s = \"😀\";", &review, &plain());
        assert_eq!(annotations[0].range.end_character, 13);
    }

    #[test]
    fn test_update_is_idempotent_and_replaces() {
        let projector = DiagnosticsProjector::new(ProjectionOptions::default());
        let id = DocumentId::new("file:///main.rs");
        let review = ParsedReview::new(7, "ok").with_suggestions(vec![
            Suggestion::new("a").at(1),
            Suggestion::new("b").at(3),
        ]);

        let once = projector.update(&id, TEXT, &review);
        let twice = projector.update(&id, TEXT, &review);
        assert_eq!(once, twice);
        assert_eq!(projector.get(&id), once);

        let newer = ParsedReview::new(9, "better");
        projector.update(&id, TEXT, &newer);
        let current = projector.get(&id);
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].kind, AnnotationKind::Score);

        assert!(projector.clear(&id));
        assert!(projector.get(&id).is_empty());
    }
}
