//! Config command - View and validate ACS configuration
//!
//! Provides the `acs config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Writes a default configuration file
//! 3. Validates the configuration file and reports errors

use std::path::Path;

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use acs_core::config::Config;

use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Validate configuration file
    Validate,
}

impl ConfigCommand {
    pub async fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(config_path, format),
            ConfigCommand::Init { force } => execute_init(config_path, *force, format),
            ConfigCommand::Validate => execute_validate(config_path, format),
        }
    }
}

fn execute_show(config_path: &Path, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let config = Config::load_or_default(config_path);

    info!(config_path = %config_path.display(), "Showing configuration");

    if format.is_json() {
        let json =
            serde_json::to_value(&config).context("Failed to serialize configuration to JSON")?;
        formatter.print_json(&json);
    } else {
        formatter.success(&format!("Configuration ({})", config_path.display()));
        formatter.info("");

        let yaml =
            serde_yaml::to_string(&config).context("Failed to serialize configuration to YAML")?;
        for line in yaml.lines() {
            formatter.info(line);
        }
    }

    Ok(())
}

fn execute_init(config_path: &Path, force: bool, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);

    if config_path.exists() && !force {
        formatter.error(&format!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        ));
        return Ok(());
    }

    Config::default()
        .save(config_path)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    info!(config_path = %config_path.display(), "Wrote default configuration");

    if format.is_json() {
        formatter.print_json(&serde_json::json!({
            "success": true,
            "config_path": config_path.display().to_string(),
        }));
    } else {
        formatter.success(&format!("Wrote {}", config_path.display()));
    }
    Ok(())
}

fn execute_validate(config_path: &Path, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);

    // Load explicitly so parse failures are reported rather than defaulted
    let config = match Config::load(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            let message = if config_path.exists() {
                format!("Failed to parse configuration: {}", e)
            } else {
                "Configuration file not found. Using defaults.".to_string()
            };
            if format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "valid": false,
                    "config_path": config_path.display().to_string(),
                    "errors": [message],
                }));
            } else {
                formatter.error(&message);
                formatter.info(&format!("File: {}", config_path.display()));
            }
            return Ok(());
        }
    };

    info!(config_path = %config_path.display(), "Validating configuration");

    let errors = config.validate();

    if format.is_json() {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        formatter.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": config_path.display().to_string(),
            "errors": error_msgs,
        }));
    } else if errors.is_empty() {
        formatter.success(&format!("Configuration is valid ({})", config_path.display()));
    } else {
        formatter.error(&format!(
            "Configuration has {} error(s) ({})",
            errors.len(),
            config_path.display()
        ));
        for e in &errors {
            formatter.info(&format!("  {}: {}", e.field, e.message));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acs").join("config.yaml");

        ConfigCommand::Init { force: false }
            .execute(&path, OutputFormat::Json)
            .await
            .unwrap();

        let loaded = Config::load(&path).unwrap();
        let defaults = Config::default();
        assert_eq!(loaded.store.database, defaults.store.database);
        assert_eq!(loaded.retention.max_age_days, defaults.retention.max_age_days);
        assert!(loaded.validate().is_empty());
    }

    #[tokio::test]
    async fn test_init_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "retention:\n  max_age_days: 30\n").unwrap();

        ConfigCommand::Init { force: false }
            .execute(&path, OutputFormat::Json)
            .await
            .unwrap();

        assert_eq!(Config::load(&path).unwrap().retention.max_age_days, 30);
    }

    #[tokio::test]
    async fn test_validate_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.yaml");
        assert!(ConfigCommand::Validate
            .execute(&path, OutputFormat::Json)
            .await
            .is_ok());
    }
}
