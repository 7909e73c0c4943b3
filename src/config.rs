//! Process configuration
//!
//! `WalletConfig` is loaded once at startup from an optional TOML file and
//! `WALLET__*` environment variables (`WALLET__MINIMUM_TRANSFER=50`,
//! `WALLET__SERVER__BIND=0.0.0.0:9000`), validated, and then passed by value
//! into the components that need it.
//!
//! ```toml
//! settlement_currency = "RUB"
//! minimum_transfer = 100
//!
//! [rates]
//! RUB = 1
//! USD = 100
//!
//! [opening_balances]
//! USD = 500
//!
//! [server]
//! bind = "127.0.0.1:8080"
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::core::EngineSettings;
use crate::types::{normalize_code, ConfigError, CurrencyRateTable};

/// HTTP gateway settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Wallet configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Currency of the internal balance
    pub settlement_currency: String,

    /// Value of one unit of each currency in settlement units
    pub rates: BTreeMap<String, Decimal>,

    /// Smallest accepted transfer, in settlement units
    pub minimum_transfer: Decimal,

    /// External balances of newly opened accounts
    pub opening_balances: BTreeMap<String, Decimal>,

    pub store_timeout_ms: u64,
    pub bus_timeout_ms: u64,

    /// Undelivered events the notification bus holds before failing publishes
    pub bus_capacity: usize,

    /// Identifiers tried per transfer when the log reports a collision
    pub id_attempts: u32,

    /// Default page size of transaction history queries
    pub history_limit: usize,

    pub server: ServerConfig,
}

impl Default for WalletConfig {
    fn default() -> Self {
        let rates = [
            ("RUB", Decimal::ONE),
            ("USD", Decimal::new(100, 0)),
            ("EUR", Decimal::new(105, 0)),
            ("BTC", Decimal::new(10135623, 0)),
        ];
        let opening_balances = [
            ("RUB", Decimal::new(10000, 0)),
            ("USD", Decimal::new(500, 0)),
            ("EUR", Decimal::new(400, 0)),
            ("BTC", Decimal::new(100, 0)),
        ];

        Self {
            settlement_currency: "RUB".to_string(),
            rates: rates
                .into_iter()
                .map(|(code, rate)| (code.to_string(), rate))
                .collect(),
            minimum_transfer: Decimal::new(100, 0),
            opening_balances: opening_balances
                .into_iter()
                .map(|(code, balance)| (code.to_string(), balance))
                .collect(),
            store_timeout_ms: 2000,
            bus_timeout_ms: 1000,
            bus_capacity: 1024,
            id_attempts: 3,
            history_limit: 10,
            server: ServerConfig::default(),
        }
    }
}

impl WalletConfig {
    /// Load configuration from `path` (if given) and the environment
    ///
    /// Values missing from both sources keep their defaults. The result is
    /// validated before it is returned.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        let config: WalletConfig = builder
            .add_source(Environment::with_prefix("WALLET").separator("__"))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check every constraint the engine relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rates = self.rate_table()?;

        if self.minimum_transfer < Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "minimum_transfer must not be negative, got {}",
                self.minimum_transfer
            )));
        }

        for (code, balance) in &self.opening_balances {
            if !rates.contains(&normalize_code(code)) {
                return Err(ConfigError::Invalid(format!(
                    "opening balance for unknown currency {}",
                    code
                )));
            }
            if *balance < Decimal::ZERO {
                return Err(ConfigError::Invalid(format!(
                    "opening balance for {} must not be negative, got {}",
                    code, balance
                )));
            }
        }

        if self.store_timeout_ms == 0 || self.bus_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        if self.id_attempts == 0 {
            return Err(ConfigError::Invalid(
                "id_attempts must be at least 1".to_string(),
            ));
        }
        if self.bus_capacity == 0 {
            return Err(ConfigError::Invalid(
                "bus_capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn rate_table(&self) -> Result<CurrencyRateTable, ConfigError> {
        CurrencyRateTable::new(
            &self.settlement_currency,
            self.rates.iter().map(|(code, rate)| (code.as_str(), *rate)),
        )
    }

    pub fn engine_settings(&self) -> Result<EngineSettings, ConfigError> {
        Ok(EngineSettings {
            rates: self.rate_table()?,
            minimum_transfer: self.minimum_transfer,
            store_timeout: Duration::from_millis(self.store_timeout_ms),
            bus_timeout: Duration::from_millis(self.bus_timeout_ms),
            id_attempts: self.id_attempts,
        })
    }
}
