//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (~/.config/codementor/config.toml)
//! 3. Project config (.codementor/config.toml)
//! 4. Environment variables (CODEMENTOR_* prefix, `__` between sections)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::types::{MentorError, Result};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain using Figment:
    /// defaults → global → project → env vars
    pub fn load() -> Result<Config> {
        Self::load_layers(
            Self::global_config_path().as_deref(),
            &Self::project_config_path(),
        )
    }

    /// Resolution chain over explicit global and project files
    pub fn load_layers(global: Option<&Path>, project: &Path) -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = global
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(global_path));
        }

        if project.exists() {
            debug!("Loading project config from: {}", project.display());
            figment = figment.merge(Toml::file(project));
        }

        // CODEMENTOR_AUTO_REVIEW__ENABLED -> auto_review.enabled
        figment = figment.merge(Env::prefixed("CODEMENTOR_").split("__").lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| MentorError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| MentorError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Get path to global config directory (~/.config/codementor/)
    pub fn global_dir() -> Option<PathBuf> {
        env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                env::var("HOME")
                    .ok()
                    .map(|home| PathBuf::from(home).join(".config"))
            })
            .map(|p| p.join("codementor"))
    }

    /// Get path to global config file
    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    /// Get path to project config file
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(".codementor/config.toml")
    }

    // =========================================================================
    // Config Commands
    // =========================================================================

    /// Show config file paths
    pub fn show_path() {
        println!("Configuration paths:");
        println!();

        if let Some(global) = Self::global_config_path() {
            let exists = if global.exists() { "✓" } else { "✗" };
            println!("  Global:  {} {}", exists, global.display());
        } else {
            println!("  Global:  (not available)");
        }

        let project = Self::project_config_path();
        let exists = if project.exists() { "✓" } else { "✗" };
        println!("  Project: {} {}", exists, project.display());
    }

    /// Show current effective configuration
    pub fn show_config(config: &Config, as_json: bool) -> Result<()> {
        if as_json {
            println!("{}", serde_json::to_string_pretty(config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(config).map_err(|e| MentorError::Config(e.to_string()))?
            );
        }

        Ok(())
    }

    // =========================================================================
    // Initialization and Persistence
    // =========================================================================

    /// Write a default project config. Existing files are kept unless `force`.
    pub fn init_project(path: &Path, force: bool) -> Result<bool> {
        if path.exists() && !force {
            info!("Project config exists: {}", path.display());
            return Ok(false);
        }

        Self::ensure_parent(path)?;
        let body = toml::to_string_pretty(&Config::default())
            .map_err(|e| MentorError::Config(e.to_string()))?;
        fs::write(
            path,
            format!(
                "# AI Code Mentor Project Configuration\n# Overrides ~/.config/codementor/config.toml\n\n{}",
                body
            ),
        )?;
        info!("Created project config: {}", path.display());
        Ok(true)
    }

    /// Persist the auto-review toggle into a TOML file, keeping every other key
    pub fn persist_auto_review(path: &Path, enabled: bool) -> Result<()> {
        let mut table: toml::Table = if path.exists() {
            toml::from_str(&fs::read_to_string(path)?).map_err(|e| {
                MentorError::Config(format!("Invalid TOML in {}: {}", path.display(), e))
            })?
        } else {
            toml::Table::new()
        };

        if !table.contains_key("auto_review") {
            table.insert(
                "auto_review".to_string(),
                toml::Value::Table(toml::Table::new()),
            );
        }
        let Some(toml::Value::Table(section)) = table.get_mut("auto_review") else {
            return Err(MentorError::Config(format!(
                "auto_review in {} is not a table",
                path.display()
            )));
        };
        section.insert("enabled".to_string(), toml::Value::Boolean(enabled));

        Self::ensure_parent(path)?;
        fs::write(
            path,
            toml::to_string_pretty(&table).map_err(|e| MentorError::Config(e.to_string()))?,
        )?;
        debug!("Persisted auto_review.enabled = {} to {}", enabled, path.display());
        Ok(())
    }

    fn ensure_parent(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}
