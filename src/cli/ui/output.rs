use console::style;

use crate::projection::{Annotation, Severity};

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn header(&self, message: &str) {
        println!("\n{}", style(message).bold().underlined());
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    /// Score colored by band: red below 5, yellow below 8, green otherwise
    pub fn score(&self, label: &str, score: u8, max: u8) {
        let text = format!("{}/{}", score, max);
        let styled = match score {
            0..=4 => style(text).red().bold(),
            5..=7 => style(text).yellow().bold(),
            _ => style(text).green().bold(),
        };
        println!("{} {}", label, styled);
    }

    /// One annotation as `L<n> [severity] message`, 1-based like editors show it
    pub fn annotation(&self, annotation: &Annotation) {
        let severity = match annotation.severity {
            Severity::Warning => style(annotation.severity.to_string()).yellow(),
            Severity::Information => style(annotation.severity.to_string()).blue(),
            Severity::Hint => style(annotation.severity.to_string()).dim(),
        };
        println!(
            "  {} [{}] {}",
            style(format!("L{}", annotation.range.line + 1)).dim(),
            severity,
            annotation.message
        );
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
