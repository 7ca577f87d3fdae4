use crate::data_sync::config::Chain;
use crate::utils::LoadConfigError;
use alloy_primitives::B256;

/// Failures of the windowed analysis pipeline.
///
/// Only whole-chain failures (`ChainUnavailable`, `InsufficientHistory`) ever
/// reach the caller of a chain run. Per-item failures are collected by the
/// fetcher and reported alongside the records that did succeed.
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error("{chain} unavailable: {reason}")]
    ChainUnavailable { chain: Chain, reason: String },

    #[error(
        "requested window starts at {target_timestamp} but history begins at {earliest_timestamp}"
    )]
    InsufficientHistory {
        target_timestamp: u64,
        earliest_timestamp: u64,
        latest_block: u64,
        latest_timestamp: u64,
    },

    #[error("failed to fetch block {block}: {reason}")]
    BlockFetchFailed { block: u64, reason: String },

    #[error("failed to fetch receipt {tx_hash}: {reason}")]
    ReceiptFetchFailed { tx_hash: B256, reason: String },

    #[error("no blocks to aggregate")]
    EmptyWindow,

    #[error("invalid time window: {0}")]
    InvalidWindow(String),

    #[error(transparent)]
    Config(#[from] LoadConfigError),
}

impl WindowError {
    pub fn chain_unavailable(chain: Chain, reason: impl ToString) -> Self {
        Self::ChainUnavailable { chain, reason: reason.to_string() }
    }

    /// Per-item failures are absorbed by the fetcher and never end a chain run
    pub fn is_per_item(&self) -> bool {
        matches!(self, Self::BlockFetchFailed { .. } | Self::ReceiptFetchFailed { .. })
    }
}
