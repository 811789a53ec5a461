//! CLI subcommands and the wiring they share

pub mod admin;
pub mod check;
pub mod config;
pub mod logs;
pub mod purge;
pub mod status;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use acs_audit::AuditSink;
use acs_cache::LocalEntityCache;
use acs_core::config::Config;
use acs_core::ports::{IEntityLookup, IEntityStore};
use acs_engine::{AdminService, DecisionEngine};
use acs_store::{DatabasePool, InMemoryEntityStore, SqliteEntityStore};

/// Store, cache, audit sink, engine and admin service wired from config
pub struct Services {
    pub cache: Arc<LocalEntityCache>,
    pub audit: Arc<AuditSink>,
    pub engine: DecisionEngine,
    pub admin: AdminService,
}

impl Services {
    /// Opens the configured store and loads the cache from it
    pub async fn open(config: &Config) -> Result<Self> {
        let errors = config.validate();
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            bail!("Invalid configuration: {}", messages.join("; "));
        }

        let store: Arc<dyn IEntityStore> = match config.store.backend.as_str() {
            "memory" => Arc::new(InMemoryEntityStore::new()),
            _ => {
                let pool = DatabasePool::from_config(&config.store)
                    .await
                    .context("Failed to open database")?;
                Arc::new(SqliteEntityStore::new(pool.pool().clone()))
            }
        };

        let cache = Arc::new(
            LocalEntityCache::load(store.as_ref())
                .await
                .context("Failed to load entity cache")?,
        );
        let audit = Arc::new(
            AuditSink::new(Arc::clone(&store), Arc::clone(&cache))
                .with_retention(config.retention.max_age()),
        );
        let engine = DecisionEngine::new(
            Arc::clone(&cache) as Arc<dyn IEntityLookup>,
            Arc::clone(&audit),
        );
        let admin = AdminService::new(Arc::clone(&store), Arc::clone(&cache));

        tracing::debug!(backend = %config.store.backend, "Services initialized");

        Ok(Self {
            cache,
            audit,
            engine,
            admin,
        })
    }
}

/// Parse a time argument into a DateTime<Utc>
///
/// Supports:
/// - Relative: "30m", "1h", "2d", "1w" (that long ago)
/// - Absolute date: "2026-01-01"
/// - Absolute datetime: "2026-01-01T12:00:00"
/// - RFC 3339: "2026-01-01T12:00:00+02:00"
pub fn parse_time(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if input == "now" {
        return Ok(Utc::now());
    }

    if let Some(ago) = parse_relative_duration(input)? {
        return Utc::now()
            .checked_sub_signed(ago)
            .with_context(|| format!("'{}' reaches outside the supported time range", input));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(datetime) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S") {
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(datetime, Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        let datetime = date
            .and_hms_opt(0, 0, 0)
            .context("Failed to create datetime from date")?;
        return Ok(DateTime::<Utc>::from_naive_utc_and_offset(datetime, Utc));
    }

    bail!(
        "Could not parse '{}' as a time. Use relative (30m, 1h, 2d, 1w) or absolute (2026-01-01) format.",
        input
    )
}

/// Parse relative duration strings like "1h", "30m", "2d", "1w"
///
/// Returns `Ok(None)` when the input is not of that shape, and an error
/// when it is but the amount does not fit in a duration.
fn parse_relative_duration(input: &str) -> Result<Option<chrono::Duration>> {
    let Some((split, unit)) = input.char_indices().last() else {
        return Ok(None);
    };
    let Ok(num) = input[..split].parse::<i64>() else {
        return Ok(None);
    };

    let duration = match unit {
        'm' => chrono::Duration::try_minutes(num),
        'h' => chrono::Duration::try_hours(num),
        'd' => chrono::Duration::try_days(num),
        'w' => chrono::Duration::try_weeks(num),
        _ => return Ok(None),
    };
    duration
        .map(Some)
        .with_context(|| format!("'{}' is too large a duration", input))
}
