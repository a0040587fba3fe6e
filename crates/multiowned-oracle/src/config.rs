//! Oracle configuration

use multiowned_common::{
    Address, MultiownedError, Result, DEFAULT_MAX_EVENTS, DEFAULT_MAX_PENDING,
};
use multiowned_quorum::QuorumConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Oracle construction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Oracle owners
    pub owners: Vec<Address>,
    /// Signatures needed for updates, withdrawals, and owner changes
    pub required: usize,
    /// Exact payment for one `get_data` call
    pub price: Decimal,
    /// Bound on pending operations before they are swept
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
    /// Bound on each event journal
    #[serde(default = "default_max_events")]
    pub max_events: usize,
}

fn default_max_pending() -> usize {
    DEFAULT_MAX_PENDING
}

fn default_max_events() -> usize {
    DEFAULT_MAX_EVENTS
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            owners: Vec::new(),
            required: 2,
            price: Decimal::ONE,
            max_pending: DEFAULT_MAX_PENDING,
            max_events: DEFAULT_MAX_EVENTS,
        }
    }
}

impl OracleConfig {
    /// Load configuration from `.env` and `ORACLE_*` environment variables
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup, starting from defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(owners) = lookup("ORACLE_OWNERS") {
            cfg.owners = owners
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    Address::from_str(s)
                        .map_err(|e| config_error("ORACLE_OWNERS", s, &e.to_string()))
                })
                .collect::<Result<_>>()?;
        }
        if let Some(val) = lookup("ORACLE_SIGNS_REQUIRED") {
            cfg.required = val
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    config_error("ORACLE_SIGNS_REQUIRED", &val, &e.to_string())
                })?;
        }
        if let Some(val) = lookup("ORACLE_PRICE") {
            cfg.price = Decimal::from_str(val.trim())
                .map_err(|e| config_error("ORACLE_PRICE", &val, &e.to_string()))?;
        }
        if let Some(val) = lookup("ORACLE_MAX_PENDING") {
            cfg.max_pending = val
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    config_error("ORACLE_MAX_PENDING", &val, &e.to_string())
                })?;
        }
        if let Some(val) = lookup("ORACLE_MAX_EVENTS") {
            cfg.max_events = val
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    config_error("ORACLE_MAX_EVENTS", &val, &e.to_string())
                })?;
        }

        Ok(cfg)
    }

    /// Parse a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Engine part of the configuration
    pub fn quorum(&self) -> QuorumConfig {
        QuorumConfig::new(self.owners.clone(), self.required)
            .with_max_pending(self.max_pending)
            .with_max_events(self.max_events)
    }
}

fn config_error(key: &str, value: &str, reason: &str) -> MultiownedError {
    MultiownedError::Config(format!("{key}={value:?}: {reason}"))
}
