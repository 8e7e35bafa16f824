//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger policy configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    5
}

/// Ledger policy configuration.
///
/// These are policy constants, not derived values. The reversal window in
/// particular bounds how long a privileged actor may undo a deposit.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Seconds after a deposit during which it may be reversed.
    #[serde(default = "default_reversal_window")]
    pub reversal_window_secs: u64,
    /// Upper bound for a single store call, in milliseconds.
    #[serde(default = "default_store_timeout")]
    pub store_timeout_ms: u64,
    /// Attempts at committing a unit of work before giving up on a version conflict.
    #[serde(default = "default_max_commit_attempts")]
    pub max_commit_attempts: u32,
    /// Attempts at drawing an unused account number.
    #[serde(default = "default_max_account_number_attempts")]
    pub max_account_number_attempts: u32,
}

fn default_reversal_window() -> u64 {
    60
}

fn default_store_timeout() -> u64 {
    5_000
}

fn default_max_commit_attempts() -> u32 {
    3
}

fn default_max_account_number_attempts() -> u32 {
    20
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            reversal_window_secs: default_reversal_window(),
            store_timeout_ms: default_store_timeout(),
            max_commit_attempts: default_max_commit_attempts(),
            max_account_number_attempts: default_max_account_number_attempts(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "quetzal=debug,sea_orm=warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("QUETZAL").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_defaults() {
        let ledger = LedgerConfig::default();
        assert_eq!(ledger.reversal_window_secs, 60);
        assert_eq!(ledger.store_timeout_ms, 5_000);
        assert_eq!(ledger.max_commit_attempts, 3);
        assert_eq!(ledger.max_account_number_attempts, 20);
    }

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("QUETZAL__DATABASE__URL", Some("postgres://localhost/quetzal_test")),
                ("QUETZAL__LEDGER__REVERSAL_WINDOW_SECS", Some("120")),
                ("RUN_MODE", Some("nonexistent")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/quetzal_test");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.ledger.reversal_window_secs, 120);
                assert_eq!(config.ledger.max_commit_attempts, 3);
                assert_eq!(config.logging.filter, "quetzal=debug,sea_orm=warn");
            },
        );
    }

    #[test]
    fn test_load_fails_without_database_url() {
        temp_env::with_vars(
            [
                ("QUETZAL__DATABASE__URL", None::<&str>),
                ("RUN_MODE", Some("nonexistent")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }
}
