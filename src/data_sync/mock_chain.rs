use crate::data_sync::port::{BlockTransactions, ChainDataPort, RawBlock, RawReceipt, RawTransaction};
use alloy_primitives::{B256, U256};
use async_trait::async_trait;
use eyre::{Result, eyre};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// In-memory chain for tests, benches and demos.
///
/// Block `n` lives at index `n`. Failures can be injected per block and per
/// receipt, and every call is counted.
#[derive(Debug, Default)]
pub struct MockChain {
    timestamps: Vec<u64>,
    gas: HashMap<u64, (U256, U256)>,
    base_fees: HashMap<u64, U256>,
    transactions: HashMap<u64, Vec<RawTransaction>>,
    receipts: HashMap<B256, RawReceipt>,
    failing_blocks: HashSet<u64>,
    failing_full_blocks: HashSet<u64>,
    failing_receipts: HashSet<B256>,
    height_unavailable: bool,
    latency: Option<Duration>,
    pub stats: MockChainStats,
}

#[derive(Debug, Default)]
pub struct MockChainStats {
    pub header_calls: AtomicUsize,
    pub full_block_calls: AtomicUsize,
    pub receipt_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockChainStats {
    pub fn header_calls(&self) -> usize {
        self.header_calls.load(Ordering::Relaxed)
    }

    pub fn full_block_calls(&self) -> usize {
        self.full_block_calls.load(Ordering::Relaxed)
    }

    pub fn receipt_calls(&self) -> usize {
        self.receipt_calls.load(Ordering::Relaxed)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::Relaxed)
    }
}

impl MockChain {
    /// Chain whose blocks are given explicit timestamps
    pub fn from_timestamps(timestamps: Vec<u64>) -> Self {
        Self { timestamps, ..Self::default() }
    }

    /// `block_count` blocks, one every `block_time` seconds starting at `genesis_timestamp`
    pub fn regular(block_count: u64, genesis_timestamp: u64, block_time: u64) -> Self {
        Self::from_timestamps((0..block_count).map(|n| genesis_timestamp + n * block_time).collect())
    }

    pub fn latest(&self) -> u64 {
        self.timestamps.len().saturating_sub(1) as u64
    }

    pub fn timestamp_of(&self, number: u64) -> Option<u64> {
        self.timestamps.get(number as usize).copied()
    }

    pub fn with_gas(mut self, number: u64, gas_used: u64, gas_limit: u64) -> Self {
        self.gas.insert(number, (U256::from(gas_used), U256::from(gas_limit)));
        self
    }

    pub fn with_base_fee(mut self, number: u64, base_fee: u64) -> Self {
        self.base_fees.insert(number, U256::from(base_fee));
        self
    }

    /// Attach transactions and their receipts to a block
    pub fn with_transactions(mut self, number: u64, txs: Vec<(RawTransaction, RawReceipt)>) -> Self {
        let entry = self.transactions.entry(number).or_default();
        for (tx, receipt) in txs {
            self.receipts.insert(tx.hash, receipt);
            entry.push(tx);
        }
        self
    }

    pub fn failing_block(mut self, number: u64) -> Self {
        self.failing_blocks.insert(number);
        self
    }

    /// Fail only fetches that include transactions, so range resolution still works
    pub fn failing_full_block(mut self, number: u64) -> Self {
        self.failing_full_blocks.insert(number);
        self
    }

    pub fn failing_receipt(mut self, hash: B256) -> Self {
        self.failing_receipts.insert(hash);
        self
    }

    pub fn height_unavailable(mut self) -> Self {
        self.height_unavailable = true;
        self
    }

    /// Delay every call, which makes overlapping requests observable
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    async fn enter(&self) {
        let now = self.stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn exit(&self) {
        self.stats.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn build_block(&self, number: u64, include_transactions: bool) -> Result<RawBlock> {
        let fails_full = include_transactions && self.failing_full_blocks.contains(&number);
        if fails_full || self.failing_blocks.contains(&number) {
            return Err(eyre!("injected failure for block {}", number));
        }
        let timestamp = self.timestamp_of(number).ok_or_else(|| eyre!("block {} not found", number))?;
        let (gas_used, gas_limit) = self.gas.get(&number).copied().unwrap_or((U256::ZERO, U256::from(30_000_000u64)));
        let txs = self.transactions.get(&number).cloned().unwrap_or_default();

        let transactions = if include_transactions {
            BlockTransactions::Full(txs)
        } else {
            BlockTransactions::Hashes(txs.iter().map(|tx| tx.hash).collect())
        };

        Ok(RawBlock {
            number,
            timestamp,
            gas_used,
            gas_limit,
            base_fee_per_gas: self.base_fees.get(&number).copied(),
            transactions,
        })
    }
}

#[async_trait]
impl ChainDataPort for MockChain {
    async fn current_height(&self) -> Result<u64> {
        if self.height_unavailable || self.timestamps.is_empty() {
            return Err(eyre!("no endpoint reachable"));
        }
        Ok(self.latest())
    }

    async fn block_by_number(&self, number: u64, include_transactions: bool) -> Result<RawBlock> {
        if include_transactions {
            self.stats.full_block_calls.fetch_add(1, Ordering::Relaxed);
        } else {
            self.stats.header_calls.fetch_add(1, Ordering::Relaxed);
        }
        self.enter().await;
        let block = self.build_block(number, include_transactions);
        self.exit();
        block
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<RawReceipt> {
        self.stats.receipt_calls.fetch_add(1, Ordering::Relaxed);
        self.enter().await;
        let receipt = if self.failing_receipts.contains(&hash) {
            Err(eyre!("injected failure for receipt {}", hash))
        } else {
            self.receipts.get(&hash).cloned().ok_or_else(|| eyre!("receipt {} not found", hash))
        };
        self.exit();
        receipt
    }
}
