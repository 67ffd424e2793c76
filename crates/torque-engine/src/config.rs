//! # Engine Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TORQUE_DATABASE_PATH=/var/lib/torque/torque.db                     │
//! │     TORQUE_RETRY_MAX_ATTEMPTS=5                                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     path passed to EngineConfig::load, or $TORQUE_CONFIG               │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "torque.db"
//! max_connections = 5
//! min_connections = 1
//! connect_timeout_secs = 30
//!
//! [retry]
//! max_attempts = 3
//! initial_backoff_ms = 20
//! max_backoff_ms = 500
//!
//! [limits]
//! operation_timeout_secs = 10
//! default_per_page = 10
//! max_per_page = 100
//!
//! [log]
//! level = "info"
//! format = "compact"   # compact | pretty
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use torque_db::DbConfig;

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite database file. Created if missing.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// How long to wait for a pooled connection (seconds).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("torque.db")
}
fn default_max_connections() -> u32 {
    5
}
fn default_min_connections() -> u32 {
    1
}
fn default_connect_timeout() -> u64 {
    30
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

// =============================================================================
// Retry Settings
// =============================================================================

/// Retries for lock contention and sequence number collisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_initial_backoff() -> u64 {
    20
}
fn default_max_backoff() -> u64 {
    500
}

impl Default for RetrySettings {
    fn default() -> Self {
        RetrySettings {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
        }
    }
}

// =============================================================================
// Limits
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitSettings {
    /// Upper bound on any single engine operation, retries included.
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_secs: u64,

    #[serde(default = "default_per_page")]
    pub default_per_page: u32,

    #[serde(default = "default_max_per_page")]
    pub max_per_page: u32,
}

fn default_operation_timeout() -> u64 {
    10
}
fn default_per_page() -> u32 {
    torque_core::DEFAULT_PER_PAGE
}
fn default_max_per_page() -> u32 {
    100
}

impl Default for LimitSettings {
    fn default() -> Self {
        LimitSettings {
            operation_timeout_secs: default_operation_timeout(),
            default_per_page: default_per_page(),
            max_per_page: default_max_per_page(),
        }
    }
}

// =============================================================================
// Log Settings
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(ConfigError::Invalid(format!(
                "Unknown log format: '{}'. Valid options: compact, pretty",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive, e.g. `"info"` or `"info,torque_engine=debug"`.
    /// `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub limits: LimitSettings,

    #[serde(default)]
    pub log: LogSettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, else `$TORQUE_CONFIG`, if it exists)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        let path = config_path.or_else(|| std::env::var("TORQUE_CONFIG").ok().map(PathBuf::from));
        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid(format!(
                "database.min_connections ({}) exceeds max_connections ({})",
                self.database.min_connections, self.database.max_connections
            )));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".into(),
            ));
        }

        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(ConfigError::Invalid(
                "retry.initial_backoff_ms exceeds retry.max_backoff_ms".into(),
            ));
        }

        if self.limits.operation_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "limits.operation_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.limits.max_per_page == 0
            || self.limits.default_per_page == 0
            || self.limits.default_per_page > self.limits.max_per_page
        {
            return Err(ConfigError::Invalid(format!(
                "limits.default_per_page ({}) must be within 1..={}",
                self.limits.default_per_page, self.limits.max_per_page
            )));
        }

        Ok(())
    }

    /// Applies `TORQUE_*` environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup. Unparseable numbers are
    /// logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("TORQUE_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(value) = lookup("TORQUE_MAX_CONNECTIONS") {
            match value.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %value, "Ignoring invalid TORQUE_MAX_CONNECTIONS"),
            }
        }

        if let Some(value) = lookup("TORQUE_RETRY_MAX_ATTEMPTS") {
            match value.parse::<u32>() {
                Ok(n) => self.retry.max_attempts = n,
                Err(_) => warn!(value = %value, "Ignoring invalid TORQUE_RETRY_MAX_ATTEMPTS"),
            }
        }

        if let Some(value) = lookup("TORQUE_OPERATION_TIMEOUT_SECS") {
            match value.parse::<u64>() {
                Ok(n) => self.limits.operation_timeout_secs = n,
                Err(_) => warn!(value = %value, "Ignoring invalid TORQUE_OPERATION_TIMEOUT_SECS"),
            }
        }

        if let Some(level) = lookup("TORQUE_LOG_LEVEL") {
            self.log.level = level;
        }

        if let Some(value) = lookup("TORQUE_LOG_FORMAT") {
            match value.parse() {
                Ok(format) => self.log.format = format,
                Err(_) => warn!(value = %value, "Unknown log format in environment"),
            }
        }
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Pool settings for [`torque_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone())
            .max_connections(self.database.max_connections)
            .min_connections(self.database.min_connections)
            .connect_timeout(Duration::from_secs(self.database.connect_timeout_secs))
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.limits.operation_timeout_secs)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
