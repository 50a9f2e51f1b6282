//! Status Command
//!
//! Report provider configuration and reachability. Informational only:
//! reviews are attempted regardless of what this reports.

use serde_json::json;

use crate::ai::{HealthStatus, create_provider};
use crate::config::Config;
use crate::types::Result;

pub async fn run(config: &Config, format: &str) -> Result<()> {
    let provider = create_provider(&config.provider)?;
    let health = provider.check_status().await?;

    if format == "json" {
        let status = json!({
            "provider": provider.name(),
            "health": health,
            "auto_review": config.auto_review.enabled,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("AI Code Mentor Status");
        println!("══════════════════════════════════════");
        println!("Provider:    {}", provider.name());
        for line in health_lines(&health) {
            println!("{}", line);
        }
        println!(
            "Auto-review: {} (debounce {} ms)",
            if config.auto_review.enabled { "on" } else { "off" },
            config.auto_review.debounce_ms
        );
    }

    Ok(())
}

fn health_lines(health: &HealthStatus) -> Vec<String> {
    let reachable = match health.reachable {
        Some(true) => "yes",
        Some(false) => "no",
        None => "not checked",
    };

    let mut lines = vec![
        format!(
            "Configured:  {}",
            if health.configured { "yes" } else { "no" }
        ),
        format!("Reachable:   {}", reachable),
    ];
    if let Some(model) = &health.model {
        lines.push(format!("Model:       {}", model));
    }
    if let Some(message) = &health.message {
        lines.push(format!("Message:     {}", message));
    }
    lines
}
