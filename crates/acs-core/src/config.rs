//! Configuration module for the access control system.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub retention: RetentionConfig,
    pub logging: LoggingConfig,
}

/// Entity store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store backend: `sqlite` (durable) or `memory` (ephemeral).
    pub backend: String,
    /// Path to the SQLite database file.
    pub database: PathBuf,
    /// Maximum pooled SQLite connections.
    pub max_connections: u32,
    /// Seconds to wait on a locked database before failing a write.
    pub busy_timeout_secs: u64,
}

/// Access log retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Log entries older than this many days are eligible for purge.
    pub max_age_days: u32,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Emit JSON-formatted log lines instead of human-readable ones.
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/acs/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("acs")
            .join("config.yaml")
    }

    /// Write the configuration as YAML to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }
}

impl RetentionConfig {
    /// The retention window as a duration.
    pub fn max_age(&self) -> Duration {
        Duration::days(i64::from(self.max_age_days))
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Default number of days access log entries are retained.
pub const DEFAULT_RETENTION_DAYS: u32 = 7;

impl Default for StoreConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("acs");
        Self {
            backend: "sqlite".to_string(),
            database: data_dir.join("acs.db"),
            max_connections: 5,
            busy_timeout_secs: 5,
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"retention.max_age_days"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `store.backend`.
const VALID_STORE_BACKENDS: &[&str] = &["sqlite", "memory"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- store ---
        if !VALID_STORE_BACKENDS.contains(&self.store.backend.as_str()) {
            errors.push(ValidationError {
                field: "store.backend".into(),
                message: format!(
                    "invalid backend '{}'; valid options: {}",
                    self.store.backend,
                    VALID_STORE_BACKENDS.join(", ")
                ),
            });
        }
        if self.store.backend == "sqlite" && self.store.database.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "store.database".into(),
                message: "must be set when backend is 'sqlite'".into(),
            });
        }
        if self.store.max_connections == 0 {
            errors.push(ValidationError {
                field: "store.max_connections".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- retention ---
        if self.retention.max_age_days == 0 {
            errors.push(ValidationError {
                field: "retention.max_age_days".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust
/// use acs_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .store_backend("memory")
///     .retention_max_age_days(14)
///     .logging_level("debug")
///     .build();
/// assert_eq!(config.retention.max_age_days, 14);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- store ---

    pub fn store_backend(mut self, backend: impl Into<String>) -> Self {
        self.config.store.backend = backend.into();
        self
    }

    pub fn store_database(mut self, path: PathBuf) -> Self {
        self.config.store.database = path;
        self
    }

    pub fn store_max_connections(mut self, n: u32) -> Self {
        self.config.store.max_connections = n;
        self
    }

    pub fn store_busy_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.store.busy_timeout_secs = seconds;
        self
    }

    // --- retention ---

    pub fn retention_max_age_days(mut self, days: u32) -> Self {
        self.config.retention.max_age_days = days;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_json(mut self, json: bool) -> Self {
        self.config.logging.json = json;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
