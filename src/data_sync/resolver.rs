use crate::data_sync::config::{Chain, ChainSettings};
use crate::data_sync::port::ChainDataPort;
use crate::error::WindowError;
use crate::logic::types::{BlockRange, lookback_secs};
use std::sync::Arc;
use tracing::{debug, info};

/// Finds the block range covering the last `days` days of a chain.
///
/// The start block is estimated from the block-rate hint, then located with
/// a first-true binary search over block timestamps. When the estimate lands
/// after the target the window is widened backwards, doubling each time, so
/// a poor hint costs extra probes but not correctness.
///
/// The search trusts each comparison it makes and does not re-check that
/// timestamps are monotonic; around a reorg the result may be off by a few
/// blocks.
pub struct BlockRangeResolver {
    chain: Chain,
    port: Arc<dyn ChainDataPort>,
}

impl BlockRangeResolver {
    pub fn new(settings: &ChainSettings, port: Arc<dyn ChainDataPort>) -> Self {
        Self { chain: settings.chain, port }
    }

    pub async fn resolve(&self, days: f64, blocks_per_day_hint: u64) -> Result<BlockRange, WindowError> {
        let mut probe = Probe { port: self.port.as_ref(), chain: self.chain, count: 0 };

        let latest = self.port.current_height().await.map_err(|e| WindowError::chain_unavailable(self.chain, e))?;
        let latest_ts = probe.timestamp(latest).await?;

        let window_secs = lookback_secs(days);
        let Some(target_ts) = latest_ts.checked_sub(window_secs) else {
            let earliest_timestamp = probe.timestamp(0).await?;
            return Err(WindowError::InsufficientHistory {
                target_timestamp: 0,
                earliest_timestamp,
                latest_block: latest,
                latest_timestamp: latest_ts,
            });
        };

        let blocks_back = ((blocks_per_day_hint as f64) * days).round() as u64;
        let estimate = latest.saturating_sub(blocks_back);
        let estimate_ts = probe.timestamp(estimate).await?;

        // `low` is known to be before the target, `high` at or after it
        let (low, high, high_ts) = if estimate_ts >= target_ts {
            let mut high = estimate;
            let mut high_ts = estimate_ts;
            let mut span = blocks_back.max(1);
            loop {
                if high == 0 {
                    if high_ts > target_ts {
                        return Err(WindowError::InsufficientHistory {
                            target_timestamp: target_ts,
                            earliest_timestamp: high_ts,
                            latest_block: latest,
                            latest_timestamp: latest_ts,
                        });
                    }
                    return Ok(self.found(0, high_ts, latest, latest_ts, probe.count));
                }
                let candidate = high.saturating_sub(span);
                let candidate_ts = probe.timestamp(candidate).await?;
                if candidate_ts < target_ts {
                    break (candidate, high, high_ts);
                }
                high = candidate;
                high_ts = candidate_ts;
                span = span.saturating_mul(2);
            }
        } else {
            (estimate, latest, latest_ts)
        };

        let (start, start_ts) = first_at_or_after(&mut probe, low, high, high_ts, target_ts).await?;
        Ok(self.found(start, start_ts, latest, latest_ts, probe.count))
    }

    fn found(&self, start: u64, start_ts: u64, latest: u64, latest_ts: u64, probes: usize) -> BlockRange {
        info!(
            "{}: resolved blocks {}..={} ({} blocks) in {} probes",
            self.chain,
            start,
            latest,
            latest - start + 1,
            probes
        );
        BlockRange::new(start, latest, start_ts.min(latest_ts), latest_ts)
    }
}

/// Lowest block in `(low, high]` whose timestamp is `>= target`, given
/// `ts(low) < target <= ts(high)`
async fn first_at_or_after(
    probe: &mut Probe<'_>,
    mut low: u64,
    mut high: u64,
    mut high_ts: u64,
    target: u64,
) -> Result<(u64, u64), WindowError> {
    while high - low > 1 {
        let mid = low + (high - low) / 2;
        let mid_ts = probe.timestamp(mid).await?;
        if mid_ts >= target {
            high = mid;
            high_ts = mid_ts;
        } else {
            low = mid;
        }
    }
    Ok((high, high_ts))
}

struct Probe<'a> {
    port: &'a dyn ChainDataPort,
    chain: Chain,
    count: usize,
}

impl Probe<'_> {
    async fn timestamp(&mut self, number: u64) -> Result<u64, WindowError> {
        self.count += 1;
        let block = self
            .port
            .block_by_number(number, false)
            .await
            .map_err(|e| {
                WindowError::chain_unavailable(self.chain, format!("probe of block {} failed: {}", number, e))
            })?;
        debug!("{}: probe #{} block {} at {}", self.chain, self.count, number, block.timestamp);
        Ok(block.timestamp)
    }
}
