//! # Engine Configuration
//!
//! Layered configuration for the engine and the demo binary.
//!
//! Sources, later ones winning:
//!
//! 1. Built-in defaults
//! 2. An optional TOML file (`config/procurement.toml` by default)
//! 3. Environment variables prefixed `PROCUREMENT__`, with `__` between
//!    section and key (`PROCUREMENT__PAYMENTS__DEFAULT_CURRENCY=EUR`)
//!
//! A `.env` file, if present, is loaded into the environment first.

use crate::domain::services::DEFAULT_MONEY_SCALE;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/procurement";

/// Largest money scale accepted by validation.
pub const MAX_MONEY_SCALE: u32 = 10;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// Values were read but are out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Pricing settings.
    #[serde(default)]
    pub pricing: PricingConfig,
    /// Acceptance retry settings.
    #[serde(default)]
    pub acceptance: AcceptanceConfig,
    /// Payment settings.
    #[serde(default)]
    pub payments: PaymentsConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Pricing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Decimal places money amounts are rounded to.
    #[serde(default = "default_money_scale")]
    pub money_scale: u32,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            money_scale: DEFAULT_MONEY_SCALE,
        }
    }
}

/// Retry budget for the accept-and-pay unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceConfig {
    /// Total attempts, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Upper bound for the doubling delay.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for AcceptanceConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl AcceptanceConfig {
    /// Returns the initial backoff.
    #[must_use]
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    /// Returns the backoff ceiling.
    #[must_use]
    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

/// Payment settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentsConfig {
    /// ISO currency for payments opened by acceptance.
    #[serde(default = "default_currency")]
    pub default_currency: String,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            default_currency: default_currency(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of the compact format.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Database settings. Without a URL the engine runs in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Time to wait for a pooled connection.
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
        }
    }
}

fn default_money_scale() -> u32 {
    DEFAULT_MONEY_SCALE
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    50
}

fn default_max_backoff_ms() -> u64 {
    1_000
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_ms() -> u64 {
    5_000
}

impl EngineConfig {
    /// Loads configuration from defaults, `path` (or the default file) and
    /// the environment, then validates it.
    ///
    /// The default file is optional; an explicit `path` must exist.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Load` if a source is malformed or `path` is missing
    /// - `ConfigError::Invalid` if a value is out of range
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let config: Self = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(
                config::File::with_name(path.unwrap_or(DEFAULT_CONFIG_PATH))
                    .required(path.is_some()),
            )
            .add_source(
                config::Environment::with_prefix("PROCUREMENT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pricing.money_scale > MAX_MONEY_SCALE {
            return Err(ConfigError::Invalid(format!(
                "pricing.money_scale must be at most {MAX_MONEY_SCALE}, got {}",
                self.pricing.money_scale
            )));
        }
        if self.acceptance.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "acceptance.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.acceptance.initial_backoff_ms > self.acceptance.max_backoff_ms {
            return Err(ConfigError::Invalid(
                "acceptance.initial_backoff_ms exceeds acceptance.max_backoff_ms".to_string(),
            ));
        }
        if self.payments.default_currency.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "payments.default_currency must not be empty".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
