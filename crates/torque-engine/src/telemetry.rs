//! # Tracing Setup
//!
//! The library crates only emit `tracing` events; binaries install the
//! subscriber once at startup.
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - Show debug messages (wins over the config file)
//! - `RUST_LOG=torque_db=trace` - Trace the storage layer only
//! - Default: the `[log] level` directive from [`EngineConfig`](crate::config::EngineConfig)

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LogSettings};
use crate::error::{ConfigError, ConfigResult};

/// Builds the filter: `RUST_LOG` if set, else the configured directive
/// with sqlx's per-statement logging turned down.
pub fn env_filter(settings: &LogSettings) -> ConfigResult<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(format!("{},sqlx=warn", settings.level))
        .map_err(|e| ConfigError::Logging(e.to_string()))
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_tracing(settings: &LogSettings) -> ConfigResult<()> {
    let filter = env_filter(settings)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let result = match settings.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().with_thread_ids(true).try_init(),
    };

    result.map_err(|e| ConfigError::Logging(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_accepts_configured_directive() {
        let settings = LogSettings {
            level: "info,torque_engine=debug".to_string(),
            format: LogFormat::Compact,
        };
        assert!(env_filter(&settings).is_ok());
    }
}
