// Three-Layer Architecture
pub mod data_sync; // Data Layer: chain access, range resolution, batched fetching
pub mod logic; // Logic Layer: per-block analysis, window aggregation, pipelines
pub mod reporting; // Reporting Layer: console, CSV and JSON exporters

// Common utilities and types
pub mod constants;
pub mod error;
pub mod utils;

// Re-export key components from each layer
pub use data_sync::{
    AnalyticsConfig, BatchedBlockFetcher, BlockRangeResolver, Chain, ChainConfig, ChainDataPort, ChainSettings,
    JsonRpcChainClient, MockChain, RangeFetch,
};
pub use error::WindowError;
pub use logic::{
    BlockRange, BlockRecord, ChainOutcome, ChainRun, ChainWindowAnalyzer, MultiChainRunner, MultiChainRunnerBuilder,
    TimeWindow, TransactionAnalyzer, WindowAggregator, WindowSummary,
};
pub use reporting::{ConsoleExporter, CsvExporter, JsonExporter, ReportExporter};
pub use utils::{ConfigLoader, LoadConfigError};
