use super::types::{
    AddressStats, BaseFeeStats, BlockCoverage, BlockRecord, ContractStats, DataStats, GasStats, TransactionStats,
    ValueStats, WindowSummary,
};
use crate::constants::{NATIVE_DECIMALS, UTILIZATION_SCALE};
use crate::data_sync::config::Chain;
use crate::error::WindowError;
use crate::utils::{format_units, to_f64_lossy};
use alloy_primitives::Address;
use num_bigint::BigUint;
use num_traits::Zero;
use std::collections::HashSet;

/// Running fold of [`BlockRecord`]s into a [`WindowSummary`].
///
/// Money and gas are summed as unbounded integers; address and contract
/// uniqueness is a set union over the whole window, so an address seen in
/// many blocks counts once.
#[derive(Debug, Clone)]
pub struct WindowAggregator {
    chain: Chain,
    nominal_blocks: Option<u64>,

    blocks: u64,
    first_block: u64,
    last_block: u64,
    first_timestamp: u64,
    last_timestamp: u64,

    tx_total: u64,
    tx_analyzed: u64,
    tx_failed: u64,
    max_tx_per_block: u64,

    gas_used: BigUint,
    gas_limit: BigUint,
    total_value: BigUint,

    contract_creations: u64,
    unique_contracts: HashSet<Address>,
    unique_addresses: HashSet<Address>,
    data_bytes: u64,

    base_fee_blocks: u64,
    base_fee_total: BigUint,
    base_fee_min: Option<BigUint>,
    base_fee_max: Option<BigUint>,
}

impl WindowAggregator {
    pub fn new(chain: Chain) -> Self {
        Self {
            chain,
            nominal_blocks: None,
            blocks: 0,
            first_block: u64::MAX,
            last_block: 0,
            first_timestamp: u64::MAX,
            last_timestamp: 0,
            tx_total: 0,
            tx_analyzed: 0,
            tx_failed: 0,
            max_tx_per_block: 0,
            gas_used: BigUint::zero(),
            gas_limit: BigUint::zero(),
            total_value: BigUint::zero(),
            contract_creations: 0,
            unique_contracts: HashSet::new(),
            unique_addresses: HashSet::new(),
            data_bytes: 0,
            base_fee_blocks: 0,
            base_fee_total: BigUint::zero(),
            base_fee_min: None,
            base_fee_max: None,
        }
    }

    /// Size of the range the records were fetched from
    pub fn with_nominal_blocks(mut self, nominal_blocks: u64) -> Self {
        self.nominal_blocks = Some(nominal_blocks);
        self
    }

    /// Aggregate a complete record sequence in one call
    pub fn aggregate(chain: Chain, records: &[BlockRecord]) -> Result<WindowSummary, WindowError> {
        let mut aggregator = Self::new(chain);
        for record in records {
            aggregator.add(record);
        }
        aggregator.finish()
    }

    pub fn len(&self) -> u64 {
        self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks == 0
    }

    pub fn add(&mut self, record: &BlockRecord) {
        self.blocks += 1;
        self.first_block = self.first_block.min(record.number);
        self.last_block = self.last_block.max(record.number);
        self.first_timestamp = self.first_timestamp.min(record.timestamp);
        self.last_timestamp = self.last_timestamp.max(record.timestamp);

        self.tx_total += record.tx_count;
        self.tx_analyzed += record.analyzed_tx_count;
        self.tx_failed += record.failed_tx_count;
        self.max_tx_per_block = self.max_tx_per_block.max(record.tx_count);

        self.gas_used += &record.gas_used;
        self.gas_limit += &record.gas_limit;
        self.total_value += &record.total_value;

        self.contract_creations += record.contract_creations;
        self.unique_contracts.extend(record.unique_contracts.iter().copied());
        self.unique_addresses.extend(record.unique_addresses.iter().copied());
        self.data_bytes += record.total_data_bytes;

        if let Some(base_fee) = &record.base_fee_per_gas {
            self.base_fee_blocks += 1;
            self.base_fee_total += base_fee;
            if self.base_fee_min.as_ref().is_none_or(|min| base_fee < min) {
                self.base_fee_min = Some(base_fee.clone());
            }
            if self.base_fee_max.as_ref().is_none_or(|max| base_fee > max) {
                self.base_fee_max = Some(base_fee.clone());
            }
        }
    }

    pub fn finish(self) -> Result<WindowSummary, WindowError> {
        if self.blocks == 0 {
            return Err(WindowError::EmptyWindow);
        }

        let blocks = self.blocks;
        let time_span_secs = self.last_timestamp - self.first_timestamp;
        let per_second = if time_span_secs > 0 { self.tx_total as f64 / time_span_secs as f64 } else { 0.0 };

        let utilization_rate = if self.gas_limit.is_zero() {
            0.0
        } else {
            let basis_points = &self.gas_used * UTILIZATION_SCALE / &self.gas_limit;
            to_f64_lossy(&basis_points) / 100.0
        };

        let average_value = if self.tx_analyzed > 0 { &self.total_value / self.tx_analyzed } else { BigUint::zero() };

        let base_fee_average =
            if self.base_fee_blocks > 0 { &self.base_fee_total / self.base_fee_blocks } else { BigUint::zero() };

        Ok(WindowSummary {
            chain: self.chain,
            blocks: BlockCoverage {
                analyzed: blocks,
                in_range: self.nominal_blocks.unwrap_or(blocks).max(blocks),
                first_block: self.first_block,
                last_block: self.last_block,
                first_timestamp: self.first_timestamp,
                last_timestamp: self.last_timestamp,
                time_span_secs,
            },
            transactions: TransactionStats {
                total: self.tx_total,
                analyzed: self.tx_analyzed,
                successful: self.tx_analyzed.saturating_sub(self.tx_failed),
                failed: self.tx_failed,
                without_receipt: self.tx_total.saturating_sub(self.tx_analyzed),
                max_per_block: self.max_tx_per_block,
                average_per_block: self.tx_total / blocks,
                per_second,
            },
            gas: GasStats {
                average_used: &self.gas_used / blocks,
                average_limit: &self.gas_limit / blocks,
                total_used: self.gas_used,
                total_limit: self.gas_limit,
                utilization_rate,
            },
            value: ValueStats {
                total_formatted: format_units(&self.total_value, NATIVE_DECIMALS),
                total: self.total_value,
                average_per_tx: average_value,
            },
            contracts: ContractStats {
                total_creations: self.contract_creations,
                unique_contracts: self.unique_contracts.len() as u64,
            },
            addresses: AddressStats { unique: self.unique_addresses.len() as u64 },
            data: DataStats { total_bytes: self.data_bytes, average_per_block: self.data_bytes / blocks },
            base_fee: BaseFeeStats {
                blocks_reporting: self.base_fee_blocks,
                total: self.base_fee_total,
                average: base_fee_average,
                min: self.base_fee_min,
                max: self.base_fee_max,
            },
        })
    }
}
