//! Purge command - Apply access log retention
//!
//! Deletes access log entries older than the configured retention window,
//! or older than an explicit `--before` cutoff, from both the store and
//! the in-memory log.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;

use acs_core::config::Config;

use super::{parse_time, Services};
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct PurgeCommand {
    /// Delete entries strictly older than this time instead of the retention cutoff
    #[arg(long)]
    pub before: Option<String>,
}

impl PurgeCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let services = Services::open(config).await?;

        let now = Utc::now();
        let (cutoff, purged) = match &self.before {
            Some(before) => {
                let cutoff = parse_time(before)
                    .with_context(|| format!("Invalid --before value: '{}'", before))?;
                (cutoff, services.audit.purge_older_than(cutoff).await)
            }
            None => (
                now - services.audit.retention(),
                services.audit.purge_expired(now).await,
            ),
        };
        let removed = purged.context("Failed to purge access log")?;
        let remaining = services.cache.log_count();

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "cutoff": cutoff.to_rfc3339(),
                "removed": removed,
                "remaining": remaining,
            }));
        } else {
            formatter.success(&format!(
                "Removed {} access log entries older than {}",
                removed,
                cutoff.format("%Y-%m-%d %H:%M:%S")
            ));
            formatter.info(&format!("{} entries remain", remaining));
        }

        Ok(())
    }
}
