use super::aggregator::WindowAggregator;
use super::types::{BlockRange, TimeWindow, WindowSummary};
use crate::data_sync::config::{AnalyticsConfig, Chain, ChainSettings};
use crate::data_sync::fetcher::BatchedBlockFetcher;
use crate::data_sync::port::ChainDataPort;
use crate::data_sync::resolver::BlockRangeResolver;
use crate::data_sync::rpc::JsonRpcChainClient;
use crate::error::WindowError;
use crate::reporting::ReportExporter;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Result of analyzing one chain
#[derive(Debug)]
pub enum ChainOutcome {
    Summary { range: BlockRange, summary: WindowSummary, failures: Vec<WindowError> },
    /// Every block of the range was dropped, or the range was empty
    NoData { range: BlockRange, failures: Vec<WindowError> },
}

impl ChainOutcome {
    pub fn range(&self) -> &BlockRange {
        match self {
            ChainOutcome::Summary { range, .. } | ChainOutcome::NoData { range, .. } => range,
        }
    }

    pub fn summary(&self) -> Option<&WindowSummary> {
        match self {
            ChainOutcome::Summary { summary, .. } => Some(summary),
            ChainOutcome::NoData { .. } => None,
        }
    }

    pub fn failures(&self) -> &[WindowError] {
        match self {
            ChainOutcome::Summary { failures, .. } | ChainOutcome::NoData { failures, .. } => failures,
        }
    }
}

/// Resolve, fetch and aggregate the window of a single chain
pub struct ChainWindowAnalyzer {
    settings: ChainSettings,
    resolver: BlockRangeResolver,
    fetcher: BatchedBlockFetcher,
}

impl ChainWindowAnalyzer {
    pub fn new(settings: ChainSettings, port: Arc<dyn ChainDataPort>) -> Self {
        let resolver = BlockRangeResolver::new(&settings, port.clone());
        let fetcher = BatchedBlockFetcher::new(&settings, port);
        Self { settings, resolver, fetcher }
    }

    pub fn chain(&self) -> Chain {
        self.settings.chain
    }

    pub async fn run(&self, window: &TimeWindow) -> Result<ChainOutcome, WindowError> {
        window.validate()?;
        let chain = self.settings.chain;

        let range = match self.resolver.resolve(window.days, self.settings.blocks_per_day_hint).await {
            Ok(range) => range,
            Err(WindowError::InsufficientHistory { earliest_timestamp, latest_block, latest_timestamp, .. }) => {
                warn!("{}: chain history is shorter than {} days, analyzing from genesis", chain, window.days);
                BlockRange { partial: true, ..BlockRange::new(0, latest_block, earliest_timestamp, latest_timestamp) }
            }
            Err(e) => return Err(e),
        };

        let range = range.cap_to(window.max_blocks);
        if range.capped {
            info!("{}: capped to the newest {} blocks, starting at {}", chain, window.max_blocks, range.start_block);
        }

        let fetch = self.fetcher.fetch_range(&range).await;

        let mut aggregator = WindowAggregator::new(chain).with_nominal_blocks(fetch.nominal_blocks);
        for record in &fetch.records {
            aggregator.add(record);
        }

        match aggregator.finish() {
            Ok(summary) => Ok(ChainOutcome::Summary { range, summary, failures: fetch.failures }),
            Err(WindowError::EmptyWindow) => {
                warn!("{}: no usable blocks in {}..={}", chain, range.start_block, range.end_block);
                Ok(ChainOutcome::NoData { range, failures: fetch.failures })
            }
            Err(e) => Err(e),
        }
    }
}

/// Builds the data port for a chain
pub type PortFactory = dyn Fn(&ChainSettings) -> Result<Arc<dyn ChainDataPort>, WindowError> + Send + Sync;

/// Outcome of one chain within a multi-chain run
#[derive(Debug)]
pub struct ChainRun {
    pub chain: Chain,
    pub result: Result<ChainOutcome, WindowError>,
}

/// Analyzes every configured chain in turn.
///
/// A chain that fails as a whole is logged and reported; the remaining
/// chains still run.
pub struct MultiChainRunner {
    config: AnalyticsConfig,
    port_factory: Box<PortFactory>,
    exporters: Vec<Box<dyn ReportExporter>>,
}

impl MultiChainRunner {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config, port_factory: Box::new(json_rpc_port), exporters: Vec::new() }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub async fn run_all(&self) -> Vec<ChainRun> {
        let started = Instant::now();
        let mut runs = Vec::with_capacity(self.config.chains.len());

        for settings in self.config.chain_settings() {
            let chain = settings.chain;
            let result = self.run_chain(settings).await;

            match &result {
                Ok(outcome) => {
                    if let Some(summary) = outcome.summary() {
                        self.export(summary).await;
                    }
                }
                Err(e) => error!("{}: analysis failed: {}", chain, e),
            }
            runs.push(ChainRun { chain, result });
        }

        let succeeded = runs.iter().filter(|r| r.result.is_ok()).count();
        info!("Analyzed {}/{} chains in {:?}", succeeded, runs.len(), started.elapsed());
        runs
    }

    async fn run_chain(&self, settings: ChainSettings) -> Result<ChainOutcome, WindowError> {
        let port = (self.port_factory)(&settings)?;
        let window = TimeWindow::new(self.config.days, settings.max_blocks);
        ChainWindowAnalyzer::new(settings, port).run(&window).await
    }

    async fn export(&self, summary: &WindowSummary) {
        for exporter in &self.exporters {
            if let Err(e) = exporter.export(summary).await {
                warn!("{}: {} export failed: {}", summary.chain, exporter.name(), e);
            }
        }
    }
}

fn json_rpc_port(settings: &ChainSettings) -> Result<Arc<dyn ChainDataPort>, WindowError> {
    Ok(Arc::new(JsonRpcChainClient::from_settings(settings)?))
}

/// Builder for [`MultiChainRunner`]
pub struct MultiChainRunnerBuilder {
    config: Option<AnalyticsConfig>,
    port_factory: Option<Box<PortFactory>>,
    exporters: Vec<Box<dyn ReportExporter>>,
}

impl MultiChainRunnerBuilder {
    pub fn new() -> Self {
        Self { config: None, port_factory: None, exporters: Vec::new() }
    }

    pub fn with_config(mut self, config: AnalyticsConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the JSON-RPC client, e.g. with a [`crate::data_sync::MockChain`]
    pub fn with_port_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&ChainSettings) -> Result<Arc<dyn ChainDataPort>, WindowError> + Send + Sync + 'static,
    {
        self.port_factory = Some(Box::new(factory));
        self
    }

    pub fn add_exporter(mut self, exporter: impl ReportExporter + 'static) -> Self {
        self.exporters.push(Box::new(exporter));
        self
    }

    pub fn build(self) -> eyre::Result<MultiChainRunner> {
        let config = match self.config {
            Some(config) => config,
            None => AnalyticsConfig::from_env()?,
        };

        let mut runner = MultiChainRunner::new(config);
        if let Some(factory) = self.port_factory {
            runner.port_factory = factory;
        }
        runner.exporters = self.exporters;
        Ok(runner)
    }
}

impl Default for MultiChainRunnerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_sync::mock_chain::MockChain;

    const GENESIS: u64 = 1_700_000_000;

    fn analyzer(chain: MockChain) -> ChainWindowAnalyzer {
        let mut settings = ChainSettings::for_chain(Chain::Ethereum);
        settings.inter_batch_delay = std::time::Duration::ZERO;
        ChainWindowAnalyzer::new(settings, Arc::new(chain))
    }

    #[tokio::test]
    async fn test_run_caps_range() {
        let analyzer = analyzer(MockChain::regular(20_000, GENESIS, 12));
        let outcome = analyzer.run(&TimeWindow::new(1.0, 100)).await.unwrap();

        let range = outcome.range();
        assert!(range.capped);
        assert_eq!(range.block_count(), 100);
        assert_eq!(range.end_block, 19_999);
        assert_eq!(range.end_timestamp, GENESIS + 19_999 * 12);

        let summary = outcome.summary().unwrap();
        assert_eq!(summary.blocks.analyzed, 100);
        assert_eq!(summary.blocks.in_range, 100);
        assert_eq!(summary.blocks.first_block, 19_900);
    }

    #[tokio::test]
    async fn test_run_clamps_young_chain_to_genesis() {
        let analyzer = analyzer(MockChain::regular(50, GENESIS, 12));
        let outcome = analyzer.run(&TimeWindow::new(30.0, 1_000)).await.unwrap();

        let range = outcome.range();
        assert!(range.partial);
        assert_eq!(range.start_block, 0);
        assert_eq!(range.start_timestamp, GENESIS);
        assert_eq!(outcome.summary().unwrap().blocks.analyzed, 50);
    }

    #[tokio::test]
    async fn test_run_reports_no_data() {
        let chain = (0..10).fold(MockChain::regular(10, GENESIS, 12), |chain, n| chain.failing_full_block(n));
        let outcome = analyzer(chain).run(&TimeWindow::new(1.0, 10)).await.unwrap();

        assert!(matches!(outcome, ChainOutcome::NoData { .. }));
        assert!(outcome.summary().is_none());
        assert_eq!(outcome.failures().len(), 10);
        assert!(outcome.failures().iter().all(WindowError::is_per_item));
    }

    #[tokio::test]
    async fn test_run_fails_when_probes_fail() {
        let chain = MockChain::regular(10, GENESIS, 12).failing_block(9);
        let outcome = analyzer(chain).run(&TimeWindow::new(1.0, 10)).await;
        assert!(matches!(outcome, Err(WindowError::ChainUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_window() {
        let analyzer = analyzer(MockChain::regular(10, GENESIS, 12));
        assert!(matches!(analyzer.run(&TimeWindow::new(1.0, 0)).await, Err(WindowError::InvalidWindow(_))));
    }
}
