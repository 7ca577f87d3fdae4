/// Data Synchronization Layer
///
/// Everything that talks to a chain lives here:
///
/// - `ChainDataPort`, the async seam every remote call goes through
/// - A JSON-RPC implementation of the port and an in-memory `MockChain`
/// - Resolution of a lookback window into a block range
/// - Paced, batched fetching of blocks and receipts
///
/// Chain and run settings are loaded here as well and handed to each
/// component at construction.

// Core data sync components
pub mod config;
pub mod fetcher;
pub mod mock_chain;
pub mod port;
pub mod resolver;
pub mod rpc;

// Tests
#[cfg(test)]
mod tests;

// Re-export main components for easy usage
pub use config::{AnalyticsConfig, Chain, ChainConfig, ChainSettings};
pub use fetcher::{BatchedBlockFetcher, RangeFetch};
pub use mock_chain::{MockChain, MockChainStats};
pub use port::{BlockTransactions, BlockWithReceipts, ChainDataPort, RawBlock, RawReceipt, RawTransaction};
pub use resolver::BlockRangeResolver;
pub use rpc::JsonRpcChainClient;
