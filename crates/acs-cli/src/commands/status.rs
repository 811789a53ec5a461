//! Status command - Show what the entity cache holds

use anyhow::{Context, Result};
use clap::Args;

use acs_core::config::Config;

use super::Services;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let services = Services::open(config).await?;
        let stats = services.cache.stats();

        if format.is_json() {
            let mut json =
                serde_json::to_value(&stats).context("Failed to serialize cache stats")?;
            json["backend"] = serde_json::json!(config.store.backend);
            json["retention_days"] = serde_json::json!(config.retention.max_age_days);
            formatter.print_json(&json);
            return Ok(());
        }

        formatter.success(&format!("Store backend: {}", config.store.backend));
        if config.store.backend == "sqlite" {
            formatter.info(&format!("Database:    {}", config.store.database.display()));
        }
        formatter.info(&format!("Badges:      {}", stats.badges));
        formatter.info(&format!("Employees:   {}", stats.employees));
        formatter.info(&format!("Groups:      {}", stats.groups));
        formatter.info(&format!("Resources:   {}", stats.resources));
        formatter.info(&format!(
            "Log entries: {} (retained {} days)",
            stats.logs, config.retention.max_age_days
        ));

        Ok(())
    }
}
