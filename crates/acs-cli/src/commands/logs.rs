//! Logs command - Query the access log
//!
//! Provides the `acs logs` CLI command which:
//! 1. Builds a query from at most one filter flag and an optional time range
//! 2. Rejects inverted ranges before querying
//! 3. Prints matching entries, oldest first, up to `--limit`

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use acs_audit::{LogFilter, LogQuery};
use acs_core::config::Config;
use acs_core::domain::newtypes::EmployeeId;

use super::{parse_time, Services};
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
#[group(id = "filter", multiple = false)]
pub struct LogsArgs {
    /// Only entries for this badge
    #[arg(long, group = "filter")]
    pub badge: Option<String>,

    /// Only entries resolved to this employee
    #[arg(long, group = "filter")]
    pub employee: Option<String>,

    /// Only entries for this resource
    #[arg(long, group = "filter")]
    pub resource: Option<String>,

    /// Only denied entries
    #[arg(long, group = "filter")]
    pub denied: bool,
}

#[derive(Debug, Args)]
pub struct LogsCommand {
    #[command(flatten)]
    pub filter: LogsArgs,

    /// Show entries since this time (e.g., "1h", "2d", "2026-01-01")
    #[arg(long)]
    pub since: Option<String>,

    /// Show entries up to this time
    #[arg(long)]
    pub until: Option<String>,

    /// Maximum number of entries to show (most recent)
    #[arg(long, default_value = "50")]
    pub limit: usize,
}

impl LogsCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        let query = self.build_query()?;
        if let Err(e) = query.validate() {
            formatter.error(&e.to_string());
            return Ok(());
        }

        let services = Services::open(config).await?;
        let entries = services.audit.query(&query);
        info!(count = entries.len(), "Retrieved access log entries");

        let shown = &entries[entries.len().saturating_sub(self.limit)..];

        if format.is_json() {
            let json = serde_json::json!({
                "query": query,
                "count": entries.len(),
                "entries": shown,
            });
            formatter.print_json(&json);
            return Ok(());
        }

        if shown.is_empty() {
            formatter.info("No access log entries found for the specified criteria.");
            return Ok(());
        }

        formatter.success(&format!("Access log ({} entries)", entries.len()));
        formatter.info("");
        formatter.print_entries(shown);

        if entries.len() > shown.len() {
            formatter.info("");
            formatter.info(&format!(
                "Showing the latest {} entries. Use --limit to show more.",
                self.limit
            ));
        }

        Ok(())
    }

    fn build_query(&self) -> Result<LogQuery> {
        let filter = if let Some(badge) = &self.filter.badge {
            LogFilter::Badge(badge.clone())
        } else if let Some(employee) = &self.filter.employee {
            LogFilter::Employee(
                EmployeeId::new(employee.as_str()).context("Invalid --employee value")?,
            )
        } else if let Some(resource) = &self.filter.resource {
            LogFilter::Resource(resource.clone())
        } else if self.filter.denied {
            LogFilter::Denied
        } else {
            LogFilter::All
        };

        let mut query = LogQuery::new(filter);
        if let Some(since) = &self.since {
            query = query.since(
                parse_time(since).with_context(|| format!("Invalid --since value: '{}'", since))?,
            );
        }
        if let Some(until) = &self.until {
            query = query.until(
                parse_time(until).with_context(|| format!("Invalid --until value: '{}'", until))?,
            );
        }
        Ok(query)
    }
}
