//! Node Configuration
//!
//! TOML-backed settings for the pool deployment and the scripted demo
//! scenario. Every field has a built-in default, so a partial file (or no
//! file at all) works.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lib_pool::MIN_START_LEAD;
use lib_types::{Amount, Permil, SECONDS_PER_DAY};

/// Error loading or validating node configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level node configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub pool: PoolSettings,
    #[serde(default)]
    pub demo: DemoSettings,
}

/// Deployment parameters for the pool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Seconds between process start and pool start
    pub start_lead_secs: u64,
    /// Pool lifetime in whole days
    pub duration_days: u64,
    /// Native funding locked at deploy
    pub funding: Amount,
    /// Referral withholding per redemption, permil
    pub reward_rate_permil: Permil,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            start_lead_secs: 600,
            duration_days: 180,
            funding: 1_800_000,
            reward_rate_permil: 50,
        }
    }
}

/// Scripted scenario the node runs after deploying
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    /// External token units per native unit
    pub token_price: Amount,
    /// Native staked by the top beneficiary on day one
    pub top_stake: Amount,
    /// Native staked by each demo depositor on day one
    pub stakes: Vec<Amount>,
    /// Native redeemed by the first depositor on day two
    pub redeem_amount: Amount,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            token_price: 4,
            top_stake: 5_000,
            stakes: vec![40_000, 30_000, 20_000, 5_000],
            redeem_amount: 2_000,
        }
    }
}

impl NodeConfig {
    /// Read and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config: NodeConfig = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool.start_lead_secs < MIN_START_LEAD {
            return Err(ConfigError::Invalid(format!(
                "start_lead_secs must be at least {}",
                MIN_START_LEAD
            )));
        }
        if self.pool.duration_days == 0 {
            return Err(ConfigError::Invalid(
                "duration_days must cover at least one day".into(),
            ));
        }
        if self.pool.funding == 0 {
            return Err(ConfigError::Invalid("funding must be non-zero".into()));
        }
        if self.pool.reward_rate_permil == 0 || self.pool.reward_rate_permil >= 1_000 {
            return Err(ConfigError::Invalid(format!(
                "reward_rate_permil must lie strictly between 0 and 1000, got {}",
                self.pool.reward_rate_permil
            )));
        }
        if self.demo.token_price == 0 {
            return Err(ConfigError::Invalid("token_price must be non-zero".into()));
        }
        if self.demo.stakes.is_empty() {
            return Err(ConfigError::Invalid(
                "demo needs at least one depositor stake".into(),
            ));
        }
        if self.demo.redeem_amount == 0 {
            return Err(ConfigError::Invalid("redeem_amount must be non-zero".into()));
        }
        Ok(())
    }

    /// Pool lifetime in seconds
    pub fn duration_secs(&self) -> u64 {
        self.pool.duration_days * SECONDS_PER_DAY
    }
}
