use crate::data_sync::config::ChainSettings;
use crate::data_sync::port::{BlockTransactions, ChainDataPort, RawBlock, RawReceipt, RawTransaction};
use crate::error::WindowError;
use alloy_primitives::{Address, B256, Bytes, U64, U256};
use async_trait::async_trait;
use eyre::{Result, eyre};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// HTTP JSON-RPC client implementing [`ChainDataPort`]
#[derive(Debug)]
pub struct JsonRpcChainClient {
    http_client: reqwest::Client,
    rpc_url: String,
    next_id: AtomicU64,
}

impl JsonRpcChainClient {
    pub fn new(rpc_url: String, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

        Ok(Self { http_client, rpc_url, next_id: AtomicU64::new(1) })
    }

    /// Client for a configured chain; a chain without an RPC URL is unavailable
    pub fn from_settings(settings: &ChainSettings) -> std::result::Result<Self, WindowError> {
        let rpc_url = settings
            .rpc_http_url
            .clone()
            .ok_or_else(|| WindowError::chain_unavailable(settings.chain, "no RPC URL configured"))?;

        Self::new(rpc_url, settings.request_timeout).map_err(|e| WindowError::chain_unavailable(settings.chain, e))
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request_body = request_body(id, method, params);

        let response = self
            .http_client
            .post(&self.rpc_url)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?
            .error_for_status()?;

        let response_json: Value = response.json().await?;
        debug!("{} #{} answered", method, id);
        parse_response(method, response_json)
    }
}

fn request_body(id: u64, method: &str, params: Value) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": id
    })
}

fn parse_response<T: DeserializeOwned>(method: &str, mut response_json: Value) -> Result<T> {
    if let Some(error) = response_json.get("error") {
        return Err(eyre!("RPC error from {}: {}", method, error));
    }

    let result = response_json
        .get_mut("result")
        .map(Value::take)
        .ok_or_else(|| eyre!("Missing result in {} response", method))?;

    if result.is_null() {
        return Err(eyre!("{} returned null", method));
    }

    serde_json::from_value(result).map_err(|e| eyre!("Malformed {} result: {}", method, e))
}

#[async_trait]
impl ChainDataPort for JsonRpcChainClient {
    async fn current_height(&self) -> Result<u64> {
        let height: U64 = self.request("eth_blockNumber", serde_json::json!([])).await?;
        Ok(height.to::<u64>())
    }

    async fn block_by_number(&self, number: u64, include_transactions: bool) -> Result<RawBlock> {
        let block: RpcBlock = self
            .request("eth_getBlockByNumber", serde_json::json!([format!("0x{:x}", number), include_transactions]))
            .await?;
        Ok(block.into())
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<RawReceipt> {
        let receipt: RpcReceipt = self
            .request("eth_getTransactionReceipt", serde_json::json!([format!("{:#x}", hash)]))
            .await?;
        Ok(receipt.into())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcBlock {
    number: U64,
    timestamp: U64,
    gas_used: U256,
    gas_limit: U256,
    #[serde(default)]
    base_fee_per_gas: Option<U256>,
    #[serde(default)]
    transactions: RpcTransactions,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RpcTransactions {
    Hashes(Vec<B256>),
    Full(Vec<RpcTransaction>),
}

impl Default for RpcTransactions {
    fn default() -> Self {
        RpcTransactions::Hashes(Vec::new())
    }
}

#[derive(Debug, Deserialize)]
struct RpcTransaction {
    hash: B256,
    #[serde(default)]
    from: Option<Address>,
    #[serde(default)]
    to: Option<Address>,
    #[serde(default)]
    value: U256,
    #[serde(default)]
    input: Bytes,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    /// Missing on pre-Byzantium receipts, which carry a state root instead
    #[serde(default)]
    status: Option<U64>,
    #[serde(default)]
    contract_address: Option<Address>,
    #[serde(default)]
    gas_used: U256,
}

impl From<RpcBlock> for RawBlock {
    fn from(block: RpcBlock) -> Self {
        let transactions = match block.transactions {
            RpcTransactions::Hashes(hashes) => BlockTransactions::Hashes(hashes),
            RpcTransactions::Full(txs) => BlockTransactions::Full(
                txs.into_iter()
                    .map(|tx| RawTransaction {
                        hash: tx.hash,
                        from: tx.from,
                        to: tx.to,
                        value: tx.value,
                        input: tx.input,
                    })
                    .collect(),
            ),
        };

        RawBlock {
            number: block.number.to::<u64>(),
            timestamp: block.timestamp.to::<u64>(),
            gas_used: block.gas_used,
            gas_limit: block.gas_limit,
            base_fee_per_gas: block.base_fee_per_gas,
            transactions,
        }
    }
}

impl From<RpcReceipt> for RawReceipt {
    fn from(receipt: RpcReceipt) -> Self {
        RawReceipt {
            status: receipt.status.is_none_or(|s| !s.is_zero()),
            contract_address: receipt.contract_address,
            gas_used: receipt.gas_used,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_sync::config::Chain;
    use alloy_primitives::address;

    fn full_block_json() -> Value {
        serde_json::json!({
            "number": "0x12d687",
            "timestamp": "0x6553f100",
            "gasUsed": "0xe4e1c0",
            "gasLimit": "0x1c9c380",
            "baseFeePerGas": "0x3b9aca00",
            "hash": "0x00000000000000000000000000000000000000000000000000000000000000aa",
            "transactions": [
                {
                    "hash": "0x1111111111111111111111111111111111111111111111111111111111111111",
                    "from": "0x2222222222222222222222222222222222222222",
                    "to": null,
                    "value": "0xde0b6b3a7640000",
                    "input": "0x6080"
                }
            ]
        })
    }

    #[test]
    fn test_request_body() {
        let body = request_body(7, "eth_blockNumber", serde_json::json!([]));
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["method"], "eth_blockNumber");
        assert_eq!(body["id"], 7);
    }

    #[test]
    fn test_parse_full_block() {
        let response = serde_json::json!({ "result": full_block_json() });
        let block: RpcBlock = parse_response("eth_getBlockByNumber", response).unwrap();
        let block: RawBlock = block.into();

        assert_eq!(block.number, 0x12d687);
        assert_eq!(block.timestamp, 0x6553f100);
        assert_eq!(block.gas_used, U256::from(15_000_000u64));
        assert_eq!(block.gas_limit, U256::from(30_000_000u64));
        assert_eq!(block.base_fee_per_gas, Some(U256::from(1_000_000_000u64)));

        let txs = block.transactions.full();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].from, Some(address!("2222222222222222222222222222222222222222")));
        assert_eq!(txs[0].to, None);
        assert_eq!(txs[0].value, U256::from(1_000_000_000_000_000_000u64));
        assert_eq!(txs[0].input.len(), 2);
    }

    #[test]
    fn test_parse_header_only_block_without_base_fee() {
        let mut json = full_block_json();
        json["transactions"] =
            serde_json::json!(["0x1111111111111111111111111111111111111111111111111111111111111111"]);
        json.as_object_mut().unwrap().remove("baseFeePerGas");

        let block: RpcBlock = parse_response("eth_getBlockByNumber", serde_json::json!({ "result": json })).unwrap();
        let block: RawBlock = block.into();
        assert_eq!(block.base_fee_per_gas, None);
        assert!(matches!(block.transactions, BlockTransactions::Hashes(ref h) if h.len() == 1));
    }

    #[test]
    fn test_parse_receipt_status() {
        let failed: RpcReceipt = parse_response(
            "eth_getTransactionReceipt",
            serde_json::json!({ "result": { "status": "0x0", "gasUsed": "0x5208", "contractAddress": null } }),
        )
        .unwrap();
        let failed: RawReceipt = failed.into();
        assert!(!failed.status);
        assert_eq!(failed.gas_used, U256::from(21_000));

        let created: RpcReceipt = parse_response(
            "eth_getTransactionReceipt",
            serde_json::json!({ "result": {
                "status": "0x1",
                "gasUsed": "0x5208",
                "contractAddress": "0x3333333333333333333333333333333333333333"
            } }),
        )
        .unwrap();
        let created: RawReceipt = created.into();
        assert!(created.status);
        assert_eq!(created.contract_address, Some(Address::repeat_byte(0x33)));
    }

    #[test]
    fn test_parse_errors() {
        let response = serde_json::json!({ "error": { "code": -32005, "message": "rate limited" } });
        let err = parse_response::<U64>("eth_blockNumber", response);
        assert!(err.unwrap_err().to_string().contains("rate limited"));

        let err = parse_response::<RpcReceipt>("eth_getTransactionReceipt", serde_json::json!({ "result": null }));
        assert!(err.unwrap_err().to_string().contains("null"));

        let err = parse_response::<U64>("eth_blockNumber", serde_json::json!({ "id": 1 }));
        assert!(err.is_err());
    }

    #[test]
    fn test_from_settings_requires_url() {
        let settings = ChainSettings::for_chain(Chain::Optimism);
        let err = JsonRpcChainClient::from_settings(&settings).unwrap_err();
        assert!(matches!(err, WindowError::ChainUnavailable { chain: Chain::Optimism, .. }));

        let mut settings = settings;
        settings.rpc_http_url = Some("https://optimism.example.org".to_string());
        let client = JsonRpcChainClient::from_settings(&settings).unwrap();
        assert_eq!(client.rpc_url(), "https://optimism.example.org");
    }
}
