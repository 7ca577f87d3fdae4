use super::types::BlockRecord;
use crate::data_sync::port::BlockWithReceipts;
use crate::utils::to_biguint;

/// Turns one fetched block into its [`BlockRecord`].
///
/// All per-transaction rules live here so aggregation stays a plain fold.
/// Transactions without a receipt only count toward `tx_count`.
pub struct TransactionAnalyzer;

impl TransactionAnalyzer {
    pub fn analyze(fetched: &BlockWithReceipts) -> BlockRecord {
        let block = &fetched.block;
        let mut record = BlockRecord {
            number: block.number,
            timestamp: block.timestamp,
            tx_count: block.transactions.len() as u64,
            gas_used: to_biguint(block.gas_used),
            gas_limit: to_biguint(block.gas_limit),
            base_fee_per_gas: block.base_fee_per_gas.map(to_biguint),
            ..BlockRecord::default()
        };

        for (tx, receipt) in fetched.with_receipts() {
            record.analyzed_tx_count += 1;

            if !receipt.status {
                record.failed_tx_count += 1;
            }

            if let Some(created) = receipt.contract_address {
                record.contract_creations += 1;
                record.unique_contracts.insert(created);
            }

            if let Some(from) = tx.from {
                record.unique_addresses.insert(from);
            }
            if let Some(to) = tx.to.or(receipt.contract_address) {
                record.unique_addresses.insert(to);
            }

            record.total_value += to_biguint(tx.value);

            if !tx.input.is_empty() {
                record.total_data_bytes += tx.input.len() as u64;
            }
        }

        record
    }
}
