//! Quorum engine configuration

use multiowned_common::{
    Address, MultiownedError, Result, DEFAULT_MAX_EVENTS, DEFAULT_MAX_PENDING,
};
use serde::{Deserialize, Serialize};

/// Engine construction parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumConfig {
    /// Initial owners, assigned slots in this order
    pub owners: Vec<Address>,
    /// Confirmations needed to finalize an operation
    pub required: usize,
    /// Bound on the pending index before it is swept
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
    /// Bound on buffered events before the oldest are dropped
    #[serde(default = "default_max_events")]
    pub max_events: usize,
}

fn default_max_pending() -> usize {
    DEFAULT_MAX_PENDING
}

fn default_max_events() -> usize {
    DEFAULT_MAX_EVENTS
}

impl QuorumConfig {
    pub fn new(owners: Vec<Address>, required: usize) -> Self {
        Self {
            owners,
            required,
            max_pending: DEFAULT_MAX_PENDING,
            max_events: DEFAULT_MAX_EVENTS,
        }
    }

    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }

    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = max_events;
        self
    }

    /// Parse a JSON document such as
    /// `{"owners": ["0x..", "0x.."], "required": 2}`
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that do not belong to the owner registry itself
    pub fn validate(&self) -> Result<()> {
        if self.max_pending == 0 {
            return Err(MultiownedError::Config(
                "max_pending must be at least 1".to_string(),
            ));
        }
        if self.max_events == 0 {
            return Err(MultiownedError::Config(
                "max_events must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
