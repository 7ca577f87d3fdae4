use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_INTER_BATCH_DELAY_MS, DEFAULT_LOOKBACK_DAYS, DEFAULT_MAX_BLOCKS,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::logic::types::TimeWindow;
use crate::utils::{ConfigLoader, LoadConfigError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};
use url::Url;

/// Supported EVM chains and their static properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Chain {
    Ethereum,
    Polygon,
    Arbitrum,
    Optimism,
    Base,
    Bsc,
    Avalanche,
    Mantle,
}

impl Chain {
    pub fn chain_id(&self) -> u64 {
        match self {
            Chain::Ethereum => 1,
            Chain::Polygon => 137,
            Chain::Arbitrum => 42161,
            Chain::Optimism => 10,
            Chain::Base => 8453,
            Chain::Bsc => 56,
            Chain::Avalanche => 43114,
            Chain::Mantle => 5000,
        }
    }

    pub fn native_symbol(&self) -> &'static str {
        match self {
            Chain::Ethereum | Chain::Arbitrum | Chain::Optimism | Chain::Base => "ETH",
            Chain::Polygon => "POL",
            Chain::Bsc => "BNB",
            Chain::Avalanche => "AVAX",
            Chain::Mantle => "MNT",
        }
    }

    /// Approximate blocks per day from the nominal block time
    pub fn default_blocks_per_day(&self) -> u64 {
        match self {
            Chain::Ethereum => 7_200,
            Chain::Arbitrum => 345_600,
            Chain::Bsc => 28_800,
            Chain::Polygon | Chain::Optimism | Chain::Base | Chain::Avalanche | Chain::Mantle => 43_200,
        }
    }

    /// Environment variable holding the chain's HTTP RPC URL, e.g. `ETHEREUM_RPC_URL`
    pub fn rpc_env_var(&self) -> String {
        format!("{}_RPC_URL", self.to_string().to_uppercase())
    }
}

/// Per-chain configuration; unset overrides fall back to [`AnalyticsConfig`] values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain: Chain,
    #[serde(default)]
    pub rpc_http_url: Option<String>,
    #[serde(default)]
    pub blocks_per_day_hint: Option<u64>,
    #[serde(default)]
    pub max_blocks: Option<u64>,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub inter_batch_delay_ms: Option<u64>,
}

impl ChainConfig {
    pub fn new(chain: Chain) -> Self {
        Self {
            chain,
            rpc_http_url: None,
            blocks_per_day_hint: None,
            max_blocks: None,
            batch_size: None,
            inter_batch_delay_ms: None,
        }
    }

    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_http_url = Some(url.into());
        self
    }

    pub fn blocks_per_day_hint(&self) -> u64 {
        self.blocks_per_day_hint.unwrap_or_else(|| self.chain.default_blocks_per_day())
    }
}

/// Top-level configuration of an analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Lookback duration in days
    pub days: f64,
    /// Upper bound on the number of blocks analyzed per chain
    pub max_blocks: u64,
    /// Number of blocks fetched concurrently per batch
    pub batch_size: usize,
    /// Pause between batches in milliseconds
    pub inter_batch_delay_ms: u64,
    /// Timeout for a single RPC request in seconds
    pub request_timeout_secs: u64,
    pub chains: Vec<ChainConfig>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            days: DEFAULT_LOOKBACK_DAYS,
            max_blocks: DEFAULT_MAX_BLOCKS,
            batch_size: DEFAULT_BATCH_SIZE,
            inter_batch_delay_ms: DEFAULT_INTER_BATCH_DELAY_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            chains: vec![ChainConfig::new(Chain::Ethereum)],
        }
    }
}

/// Fully resolved settings for one chain, handed to the resolver and fetcher
#[derive(Debug, Clone)]
pub struct ChainSettings {
    pub chain: Chain,
    pub rpc_http_url: Option<String>,
    pub blocks_per_day_hint: u64,
    pub max_blocks: u64,
    pub batch_size: usize,
    pub inter_batch_delay: Duration,
    pub request_timeout: Duration,
}

impl ChainSettings {
    /// Settings with the crate defaults, mostly useful with [`crate::data_sync::MockChain`]
    pub fn for_chain(chain: Chain) -> Self {
        AnalyticsConfig::default().settings_for(&ChainConfig::new(chain))
    }
}

impl AnalyticsConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// One chain entry is created for every `<CHAIN>_RPC_URL` found. With no
    /// URL at all the default (unconfigured) Ethereum entry is kept.
    pub fn from_lookup<F>(lookup: F) -> eyre::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(days) = lookup("LOOKBACK_DAYS") {
            config.days = days.parse().map_err(|e| eyre::eyre!("Invalid LOOKBACK_DAYS: {}", e))?;
        }

        if let Some(max_blocks) = lookup("MAX_BLOCKS") {
            config.max_blocks = max_blocks.parse().map_err(|e| eyre::eyre!("Invalid MAX_BLOCKS: {}", e))?;
        }

        if let Some(batch_size) = lookup("BATCH_SIZE") {
            config.batch_size = batch_size.parse().map_err(|e| eyre::eyre!("Invalid BATCH_SIZE: {}", e))?;
        }

        if let Some(delay) = lookup("INTER_BATCH_DELAY_MS") {
            config.inter_batch_delay_ms =
                delay.parse().map_err(|e| eyre::eyre!("Invalid INTER_BATCH_DELAY_MS: {}", e))?;
        }

        if let Some(timeout) = lookup("REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs =
                timeout.parse().map_err(|e| eyre::eyre!("Invalid REQUEST_TIMEOUT_SECS: {}", e))?;
        }

        let mut chains = Vec::new();
        for chain in Chain::iter() {
            let var = chain.rpc_env_var();
            if let Some(rpc_url) = lookup(&var) {
                Url::parse(&rpc_url).map_err(|e| eyre::eyre!("Invalid {}: {}", var, e))?;
                chains.push(ChainConfig::new(chain).with_rpc_url(rpc_url));
            }
        }
        if !chains.is_empty() {
            config.chains = chains;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn time_window(&self) -> TimeWindow {
        TimeWindow::new(self.days, self.max_blocks)
    }

    pub fn settings_for(&self, chain: &ChainConfig) -> ChainSettings {
        ChainSettings {
            chain: chain.chain,
            rpc_http_url: chain.rpc_http_url.clone(),
            blocks_per_day_hint: chain.blocks_per_day_hint(),
            max_blocks: chain.max_blocks.unwrap_or(self.max_blocks),
            batch_size: chain.batch_size.unwrap_or(self.batch_size),
            inter_batch_delay: Duration::from_millis(chain.inter_batch_delay_ms.unwrap_or(self.inter_batch_delay_ms)),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn chain_settings(&self) -> Vec<ChainSettings> {
        self.chains.iter().map(|c| self.settings_for(c)).collect()
    }
}

impl ConfigLoader for AnalyticsConfig {
    fn validate(&self) -> Result<(), LoadConfigError> {
        if !self.days.is_finite() || self.days < 0.0 {
            return Err(LoadConfigError::ConfigError(format!(
                "days must be finite and non-negative, got {}",
                self.days
            )));
        }
        if self.max_blocks == 0 {
            return Err(LoadConfigError::ConfigError("max_blocks must be greater than zero".to_string()));
        }
        if self.batch_size == 0 {
            return Err(LoadConfigError::ConfigError("batch_size must be greater than zero".to_string()));
        }
        for chain in &self.chains {
            if chain.max_blocks == Some(0) || chain.batch_size == Some(0) {
                return Err(LoadConfigError::ConfigError(format!(
                    "{}: overrides must be greater than zero",
                    chain.chain
                )));
            }
            if let Some(url) = &chain.rpc_http_url {
                Url::parse(url).map_err(|e| {
                    LoadConfigError::ConfigError(format!("{}: invalid rpc_http_url {}: {}", chain.chain, url, e))
                })?;
            }
        }
        Ok(())
    }
}
