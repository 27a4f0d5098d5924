use std::path::PathBuf;
use std::time::Duration;

use alloy::primitives::Address;
use config::{Config, ConfigError, Environment, File};
use log::LevelFilter;
use serde::Deserialize;

use crate::errors::MonitorError;
use crate::models::QuoteAsset;

/// Root application configuration.
///
/// Loaded once at startup from an optional `config` file, a `.env` file and
/// the process environment (highest precedence). Token and pool addresses are
/// kept as raw strings and only parsed when a pool is evaluated, so a missing
/// or malformed entry skips the affected pool instead of aborting startup.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub rpc_url: String,
    /// Monitored (base) token
    #[serde(default)]
    pub sht_address: Option<String>,
    #[serde(default)]
    pub usdc_address: Option<String>,
    // Algebra V3 pools, one per quote asset
    #[serde(
        default,
        alias = "quickswap_algebra_v3_pool_sht-usdc_address",
        alias = "Quickswap_Algebra_V3_POOL_SHT-USDC_ADDRESS"
    )]
    pub pool_usdc_address: Option<String>,
    #[serde(
        default,
        alias = "quickswap_algebra_v3_pool_sht-eth_address",
        alias = "Quickswap_Algebra_V3_POOL_SHT-ETH_ADDRESS"
    )]
    pub pool_eth_address: Option<String>,
    #[serde(
        default,
        alias = "quickswap_algebra_v3_pool_sht-pol_address",
        alias = "Quickswap_Algebra_V3_POOL_SHT-POL_ADDRESS"
    )]
    pub pool_pol_address: Option<String>,
    /// Display symbol of the base token, used for pair labels
    #[serde(default = "default_base_symbol")]
    pub base_symbol: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_observation_log_path")]
    pub observation_log_path: PathBuf,
    #[serde(default = "default_price_feed_url")]
    pub price_feed_url: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_base_symbol() -> String {
    "SHT".to_string()
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_observation_log_path() -> PathBuf {
    PathBuf::from("data/price_log.jsonl")
}

fn default_price_feed_url() -> String {
    "https://api.coingecko.com/api/v3/simple/price".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // A missing .env file is not an error
        let _ = dotenv::dotenv();

        let s = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::default().try_parsing(true))
            .build()?;

        Self::from_config(s)
    }

    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        config.try_deserialize()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Configured level, falling back to `Info` for unknown names.
    pub fn log_level_filter(&self) -> LevelFilter {
        parse_log_level(&self.log_level)
    }

    /// Level to log at before the settings are loaded, read from `LOG_LEVEL`
    /// (after `.env`).
    pub fn startup_log_level() -> LevelFilter {
        let _ = dotenv::dotenv();
        std::env::var("LOG_LEVEL")
            .map(|level| parse_log_level(&level))
            .unwrap_or(LevelFilter::Info)
    }

    pub fn base_token(&self) -> Result<Address, MonitorError> {
        parse_address("SHT_ADDRESS", self.sht_address.as_deref())
    }

    pub fn usdc_token(&self) -> Result<Address, MonitorError> {
        parse_address("USDC_ADDRESS", self.usdc_address.as_deref())
    }

    pub fn pool_address(&self, quote: QuoteAsset) -> Result<Address, MonitorError> {
        let (key, value) = match quote {
            QuoteAsset::Usdc => ("POOL_USDC_ADDRESS", &self.pool_usdc_address),
            QuoteAsset::Eth => ("POOL_ETH_ADDRESS", &self.pool_eth_address),
            QuoteAsset::Pol => ("POOL_POL_ADDRESS", &self.pool_pol_address),
        };
        parse_address(key, value.as_deref())
    }
}

fn parse_log_level(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::Info)
}

fn parse_address(key: &str, value: Option<&str>) -> Result<Address, MonitorError> {
    let raw = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| MonitorError::Configuration(format!("{} not set", key)))?;

    raw.parse::<Address>().map_err(|e| {
        MonitorError::Configuration(format!("{} is not a valid address ({}): {}", key, raw, e))
    })
}
