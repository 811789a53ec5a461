//! Check command - Evaluate an access request
//!
//! Provides the `acs check` CLI command which:
//! 1. Builds an access request from the badge and resource arguments
//! 2. Runs it through the decision engine (which records the decision)
//! 3. Prints the verdict, reason code and message

use anyhow::Result;
use chrono::Utc;
use clap::Args;

use acs_core::config::Config;
use acs_core::domain::AccessRequest;

use super::{parse_time, Services};
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Badge presented at the reader
    pub badge: String,

    /// Resource being accessed
    pub resource: String,

    /// Time of the request (default: now; e.g. "2026-01-01T08:00:00", "5m")
    #[arg(long)]
    pub at: Option<String>,
}

impl CheckCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let services = Services::open(config).await?;

        let timestamp = match &self.at {
            Some(at) => parse_time(at)?,
            None => Utc::now(),
        };
        let request = AccessRequest::new(self.badge.as_str(), self.resource.as_str(), timestamp);
        let result = services.engine.evaluate(&request).await;

        if format.is_json() {
            let json = serde_json::json!({
                "badge_id": request.badge_id,
                "resource_id": request.resource_id,
                "timestamp": timestamp.to_rfc3339(),
                "decision": result.decision().as_str(),
                "reason_code": result.reason_code().as_str(),
                "message": result.message(),
            });
            formatter.print_json(&json);
        } else if result.is_allowed() {
            formatter.success(&format!(
                "{} \u{2192} {}: {}",
                self.badge,
                self.resource,
                result.message()
            ));
        } else {
            formatter.error(&format!(
                "{} \u{2192} {}: {} ({})",
                self.badge,
                self.resource,
                result.message(),
                result.reason_code()
            ));
        }

        Ok(())
    }
}
