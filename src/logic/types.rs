use crate::constants::SECONDS_PER_DAY;
use crate::data_sync::config::Chain;
use crate::error::WindowError;
use crate::utils::units::{serialize_biguint, serialize_opt_biguint};
use alloy_primitives::Address;
use num_bigint::BigUint;
use serde::Serialize;
use std::collections::HashSet;

/// Lookback request: the last `days` days, at most `max_blocks` blocks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub days: f64,
    pub max_blocks: u64,
}

impl TimeWindow {
    pub fn new(days: f64, max_blocks: u64) -> Self {
        Self { days, max_blocks }
    }

    pub fn validate(&self) -> Result<(), WindowError> {
        if !self.days.is_finite() || self.days < 0.0 {
            return Err(WindowError::InvalidWindow(format!("days must be finite and non-negative, got {}", self.days)));
        }
        if self.max_blocks == 0 {
            return Err(WindowError::InvalidWindow("max_blocks must be greater than zero".to_string()));
        }
        Ok(())
    }

    pub fn lookback_secs(&self) -> u64 {
        lookback_secs(self.days)
    }
}

pub(crate) fn lookback_secs(days: f64) -> u64 {
    (days * SECONDS_PER_DAY as f64).round() as u64
}

/// Contiguous block range covering a window, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockRange {
    pub start_block: u64,
    pub end_block: u64,
    pub start_timestamp: u64,
    pub end_timestamp: u64,
    /// Start was raised to respect a block cap
    pub capped: bool,
    /// Start was clamped to genesis because the chain is younger than the window
    pub partial: bool,
}

impl BlockRange {
    pub fn new(start_block: u64, end_block: u64, start_timestamp: u64, end_timestamp: u64) -> Self {
        Self { start_block, end_block, start_timestamp, end_timestamp, capped: false, partial: false }
    }

    pub fn block_count(&self) -> u64 {
        if self.start_block > self.end_block {
            0
        } else {
            self.end_block - self.start_block + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.block_count() == 0
    }

    /// Narrow the range to its newest `max_blocks` blocks.
    ///
    /// `end_timestamp` is kept as recorded and no block is re-queried, so
    /// `start_timestamp` still refers to the uncapped start.
    pub fn cap_to(&self, max_blocks: u64) -> BlockRange {
        if max_blocks == 0 || self.block_count() <= max_blocks {
            return *self;
        }
        BlockRange {
            start_block: self.end_block - max_blocks + 1,
            capped: true,
            ..*self
        }
    }

    pub fn blocks(&self) -> std::ops::RangeInclusive<u64> {
        self.start_block..=self.end_block
    }
}

/// Statistics of one fetched block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockRecord {
    pub number: u64,
    pub timestamp: u64,
    /// Transactions in the block header
    pub tx_count: u64,
    /// Transactions whose receipt was obtained; per-tx fields cover only these
    pub analyzed_tx_count: u64,
    pub gas_used: BigUint,
    pub gas_limit: BigUint,
    pub base_fee_per_gas: Option<BigUint>,
    pub total_value: BigUint,
    pub contract_creations: u64,
    pub unique_contracts: HashSet<Address>,
    pub unique_addresses: HashSet<Address>,
    pub total_data_bytes: u64,
    pub failed_tx_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockCoverage {
    pub analyzed: u64,
    /// Blocks in the nominal range; larger than `analyzed` when fetches were dropped
    pub in_range: u64,
    pub first_block: u64,
    pub last_block: u64,
    pub first_timestamp: u64,
    pub last_timestamp: u64,
    pub time_span_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionStats {
    pub total: u64,
    pub analyzed: u64,
    pub successful: u64,
    pub failed: u64,
    pub without_receipt: u64,
    pub max_per_block: u64,
    pub average_per_block: u64,
    pub per_second: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GasStats {
    #[serde(serialize_with = "serialize_biguint")]
    pub total_used: BigUint,
    #[serde(serialize_with = "serialize_biguint")]
    pub total_limit: BigUint,
    #[serde(serialize_with = "serialize_biguint")]
    pub average_used: BigUint,
    #[serde(serialize_with = "serialize_biguint")]
    pub average_limit: BigUint,
    /// Percentage, 0 to 100
    pub utilization_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueStats {
    /// Wei
    #[serde(serialize_with = "serialize_biguint")]
    pub total: BigUint,
    /// `total` in native units, exact
    pub total_formatted: String,
    #[serde(serialize_with = "serialize_biguint")]
    pub average_per_tx: BigUint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractStats {
    pub total_creations: u64,
    pub unique_contracts: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressStats {
    pub unique: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataStats {
    pub total_bytes: u64,
    pub average_per_block: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseFeeStats {
    pub blocks_reporting: u64,
    #[serde(serialize_with = "serialize_biguint")]
    pub total: BigUint,
    #[serde(serialize_with = "serialize_biguint")]
    pub average: BigUint,
    #[serde(serialize_with = "serialize_opt_biguint")]
    pub min: Option<BigUint>,
    #[serde(serialize_with = "serialize_opt_biguint")]
    pub max: Option<BigUint>,
}

/// Aggregate over every analyzed block of a window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSummary {
    pub chain: Chain,
    pub blocks: BlockCoverage,
    pub transactions: TransactionStats,
    pub gas: GasStats,
    pub value: ValueStats,
    pub contracts: ContractStats,
    pub addresses: AddressStats,
    pub data: DataStats,
    pub base_fee: BaseFeeStats,
}

impl WindowSummary {
    /// Blocks of the nominal range that are missing from the summary
    pub fn dropped_blocks(&self) -> u64 {
        self.blocks.in_range.saturating_sub(self.blocks.analyzed)
    }
}
