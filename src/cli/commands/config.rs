//! Config Command
//!
//! Usage:
//!   codementor config show [-f json]
//!   codementor config path
//!   codementor config init [--force]

use crate::cli::Output;
use crate::config::{Config, ConfigLoader};
use crate::types::Result;

/// Show the merged effective configuration
pub fn show(config: &Config, format: &str) -> Result<()> {
    ConfigLoader::show_config(config, format == "json")
}

/// Show configuration paths
pub fn path() -> Result<()> {
    ConfigLoader::show_path();
    Ok(())
}

/// Write a default project configuration
pub fn init(force: bool) -> Result<()> {
    let path = ConfigLoader::project_config_path();
    let output = Output::new();

    if ConfigLoader::init_project(&path, force)? {
        output.success("Initialized project configuration");
        println!("  Config: {}", path.display());
    } else {
        output.warning(&format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }
    Ok(())
}
