use crate::data_sync::config::{Chain, ChainSettings};
use crate::data_sync::port::{BlockWithReceipts, ChainDataPort, RawReceipt};
use crate::error::WindowError;
use crate::logic::analyzer::TransactionAnalyzer;
use crate::logic::types::{BlockRange, BlockRecord};
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// Outcome of fetching a block range.
///
/// Dropped blocks and receipts are first-class results, never errors.
#[derive(Debug, Default)]
pub struct RangeFetch {
    /// Analyzed blocks in ascending block order
    pub records: Vec<BlockRecord>,
    /// Every dropped block and receipt
    pub failures: Vec<WindowError>,
    pub nominal_blocks: u64,
}

impl RangeFetch {
    pub fn failed_blocks(&self) -> usize {
        self.failures.iter().filter(|f| matches!(f, WindowError::BlockFetchFailed { .. })).count()
    }

    pub fn failed_receipts(&self) -> usize {
        self.failures.iter().filter(|f| matches!(f, WindowError::ReceiptFetchFailed { .. })).count()
    }
}

/// Fetches and analyzes every block of a range in paced batches.
///
/// Blocks of one batch are fetched concurrently, then every receipt of each
/// block. At most `batch_size` block requests are in flight, but receipt
/// requests are not capped: a batch can have up to the sum of its blocks'
/// transaction counts outstanding at once. Batches run one after another with
/// a fixed pause in between, which keeps request rates under provider
/// per-second caps. Failed or timed-out calls are logged and dropped, never
/// retried.
pub struct BatchedBlockFetcher {
    chain: Chain,
    port: Arc<dyn ChainDataPort>,
    batch_size: usize,
    inter_batch_delay: Duration,
    request_timeout: Duration,
}

impl BatchedBlockFetcher {
    pub fn new(settings: &ChainSettings, port: Arc<dyn ChainDataPort>) -> Self {
        Self {
            chain: settings.chain,
            port,
            batch_size: settings.batch_size.max(1),
            inter_batch_delay: settings.inter_batch_delay,
            request_timeout: settings.request_timeout,
        }
    }

    pub async fn fetch_range(&self, range: &BlockRange) -> RangeFetch {
        let mut fetch = RangeFetch { nominal_blocks: range.block_count(), ..RangeFetch::default() };
        if range.is_empty() {
            debug!("{}: empty range {}..={}, nothing to fetch", self.chain, range.start_block, range.end_block);
            return fetch;
        }

        let started = Instant::now();
        let batches = split_into_batches(range.start_block, range.end_block, self.batch_size as u64);
        let batch_count = batches.len();
        info!(
            "{}: fetching {} blocks in {} batches of up to {}",
            self.chain, fetch.nominal_blocks, batch_count, self.batch_size
        );

        for (batch_idx, (first, last)) in batches.into_iter().enumerate() {
            let batch_start = Instant::now();
            let results = join_all((first..=last).map(|number| self.fetch_block(number))).await;

            let mut dropped = 0;
            for (result, receipt_failures) in results {
                fetch.failures.extend(receipt_failures);
                match result {
                    Ok(record) => fetch.records.push(record),
                    Err(e) => {
                        warn!("{}: {}", self.chain, e);
                        fetch.failures.push(e);
                        dropped += 1;
                    }
                }
            }

            debug!(
                "{}: batch {}/{} (blocks {}..={}) completed in {:?}, {} dropped",
                self.chain,
                batch_idx + 1,
                batch_count,
                first,
                last,
                batch_start.elapsed(),
                dropped
            );

            if batch_idx + 1 < batch_count && !self.inter_batch_delay.is_zero() {
                sleep(self.inter_batch_delay).await;
            }
        }

        fetch.records.sort_by_key(|r| r.number);
        info!(
            "{}: fetched {}/{} blocks in {:?} ({} blocks and {} receipts dropped)",
            self.chain,
            fetch.records.len(),
            fetch.nominal_blocks,
            started.elapsed(),
            fetch.failed_blocks(),
            fetch.failed_receipts()
        );
        fetch
    }

    /// Fetch one block with its receipts; receipt failures are returned beside the record
    async fn fetch_block(&self, number: u64) -> (Result<BlockRecord, WindowError>, Vec<WindowError>) {
        let block = match self.with_timeout(self.port.block_by_number(number, true)).await {
            Ok(block) => block,
            Err(reason) => return (Err(WindowError::BlockFetchFailed { block: number, reason }), Vec::new()),
        };

        // one request per transaction, all outstanding together
        let hashes: Vec<_> = block.transactions.full().iter().map(|tx| tx.hash).collect();
        let outcomes =
            join_all(hashes.iter().map(|hash| self.with_timeout(self.port.transaction_receipt(*hash)))).await;

        let mut receipt_failures = Vec::new();
        let receipts: Vec<Option<RawReceipt>> = outcomes
            .into_iter()
            .zip(hashes)
            .map(|(outcome, tx_hash)| match outcome {
                Ok(receipt) => Some(receipt),
                Err(reason) => {
                    let failure = WindowError::ReceiptFetchFailed { tx_hash, reason };
                    warn!("{}: block {}: {}", self.chain, number, failure);
                    receipt_failures.push(failure);
                    None
                }
            })
            .collect();

        let record = TransactionAnalyzer::analyze(&BlockWithReceipts::new(block, receipts));
        (Ok(record), receipt_failures)
    }

    async fn with_timeout<T>(&self, call: impl Future<Output = eyre::Result<T>>) -> Result<T, String> {
        match timeout(self.request_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("timed out after {:?}", self.request_timeout)),
        }
    }
}

/// Contiguous `(first, last)` pairs of at most `batch_size` blocks covering `start..=end`
fn split_into_batches(start: u64, end: u64, batch_size: u64) -> Vec<(u64, u64)> {
    let mut batches = Vec::new();
    if start > end || batch_size == 0 {
        return batches;
    }

    let mut first = start;
    loop {
        let last = first.saturating_add(batch_size - 1).min(end);
        batches.push((first, last));
        if last == end {
            break;
        }
        first = last + 1;
    }
    batches
}
