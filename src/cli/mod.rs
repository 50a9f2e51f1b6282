//! Command-line surface: one-shot reviews, the editor bridge, and
//! configuration/status inspection.

pub mod commands;
pub mod ui;

pub use ui::Output;
