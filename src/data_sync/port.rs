use alloy_primitives::{Address, B256, Bytes, U256};
use async_trait::async_trait;
use eyre::Result;

/// Read-only view of a chain, as consumed by the resolver and the fetcher.
///
/// Implementations may fail transiently or be rate limited, but are assumed
/// not to return incorrect data for a given block number.
#[async_trait]
pub trait ChainDataPort: Send + Sync {
    async fn current_height(&self) -> Result<u64>;

    async fn block_by_number(&self, number: u64, include_transactions: bool) -> Result<RawBlock>;

    async fn transaction_receipt(&self, hash: B256) -> Result<RawReceipt>;
}

/// Block header fields plus its transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    pub number: u64,
    pub timestamp: u64,
    pub gas_used: U256,
    pub gas_limit: U256,
    /// Absent before the fee-market upgrade and on some L2s
    pub base_fee_per_gas: Option<U256>,
    pub transactions: BlockTransactions,
}

/// Transactions of a block, either as hashes only or fully populated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockTransactions {
    Hashes(Vec<B256>),
    Full(Vec<RawTransaction>),
}

impl BlockTransactions {
    pub fn len(&self) -> usize {
        match self {
            BlockTransactions::Hashes(hashes) => hashes.len(),
            BlockTransactions::Full(txs) => txs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fully populated transactions; empty when only hashes were requested
    pub fn full(&self) -> &[RawTransaction] {
        match self {
            BlockTransactions::Hashes(_) => &[],
            BlockTransactions::Full(txs) => txs,
        }
    }
}

impl Default for BlockTransactions {
    fn default() -> Self {
        BlockTransactions::Hashes(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTransaction {
    pub hash: B256,
    pub from: Option<Address>,
    /// `None` for contract-creation transactions
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReceipt {
    /// `true` when execution succeeded
    pub status: bool,
    pub contract_address: Option<Address>,
    pub gas_used: U256,
}

/// A fetched block with the receipt outcome of each of its transactions.
///
/// `receipts[i]` belongs to `block.transactions.full()[i]`; `None` marks a
/// receipt that could not be fetched.
#[derive(Debug, Clone)]
pub struct BlockWithReceipts {
    pub block: RawBlock,
    pub receipts: Vec<Option<RawReceipt>>,
}

impl BlockWithReceipts {
    pub fn new(block: RawBlock, receipts: Vec<Option<RawReceipt>>) -> Self {
        Self { block, receipts }
    }

    /// Transactions paired with the receipts that were obtained
    pub fn with_receipts(&self) -> impl Iterator<Item = (&RawTransaction, &RawReceipt)> {
        self.block
            .transactions
            .full()
            .iter()
            .zip(self.receipts.iter())
            .filter_map(|(tx, receipt)| receipt.as_ref().map(|r| (tx, r)))
    }
}
