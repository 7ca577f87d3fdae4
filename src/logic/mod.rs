/// Logic Layer - Window Analytics
///
/// This layer is responsible for:
/// - Reducing a fetched block and its receipts to a `BlockRecord`
/// - Folding records into an exact `WindowSummary`
/// - Driving resolve, fetch and aggregate for one chain or many
pub mod aggregator;
pub mod analyzer;
pub mod pipeline;
pub mod types;

// Re-export key components from the logic layer
pub use aggregator::WindowAggregator;
pub use analyzer::TransactionAnalyzer;
pub use pipeline::{ChainOutcome, ChainRun, ChainWindowAnalyzer, MultiChainRunner, MultiChainRunnerBuilder, PortFactory};
pub use types::{BlockRange, BlockRecord, TimeWindow, WindowSummary};
