//! Editor-visible projections of the stored review

pub mod decoration;
pub mod diagnostics;
pub mod hover;
pub mod status;

pub use decoration::{BadgeTone, DecorationProvider, FileBadge, badge_for};
pub use diagnostics::{
    Annotation, AnnotationKind, DiagnosticsProjector, LineRange, ProjectionOptions, Severity,
    clamp_line, project,
};
pub use hover::{HoverProvider, hover_text};
pub use status::{StatusManager, StatusState, StatusView};
