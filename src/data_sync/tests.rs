/// Integration tests for the data synchronization layer
///
/// These tests drive complete multi-chain runs against in-memory chains,
/// from range resolution through fetching and aggregation to the exporters.

#[cfg(test)]
mod integration_tests {
    use super::super::*;
    use crate::error::WindowError;
    use crate::logic::{MultiChainRunnerBuilder, WindowSummary};
    use crate::reporting::{CsvExporter, JsonExporter, ReportExporter};
    use crate::utils::{ConfigLoader, parse_config};
    use alloy_primitives::{Address, B256, Bytes, U256};
    use async_trait::async_trait;
    use num_bigint::BigUint;
    use std::sync::{Arc, Mutex};

    const GENESIS: u64 = 1_700_000_000;
    const CREATED: u8 = 0xcc;
    const RECIPIENT: u8 = 0xee;

    /// Ten 12-second blocks with two 1000 wei transfers each. The second
    /// transaction of block 4 is a failed contract creation.
    fn scenario_chain() -> MockChain {
        (0..10u64).fold(MockChain::regular(10, GENESIS, 12), |chain, n| {
            let txs = (0..2u64)
                .map(|i| {
                    let creation = n == 4 && i == 1;
                    let tx = RawTransaction {
                        hash: B256::left_padding_from(&(n * 2 + i + 1).to_be_bytes()),
                        from: Some(Address::with_last_byte(i as u8 + 1)),
                        to: (!creation).then(|| Address::repeat_byte(RECIPIENT)),
                        value: U256::from(1_000u64),
                        input: if creation { Bytes::from_static(&[0x60, 0x80]) } else { Bytes::new() },
                    };
                    let receipt = RawReceipt {
                        status: !creation,
                        contract_address: creation.then(|| Address::repeat_byte(CREATED)),
                        gas_used: U256::from(21_000u64),
                    };
                    (tx, receipt)
                })
                .collect();
            chain.with_gas(n, 15_000_000, 30_000_000).with_transactions(n, txs)
        })
    }

    fn config(chains: Vec<ChainConfig>) -> AnalyticsConfig {
        AnalyticsConfig { inter_batch_delay_ms: 0, batch_size: 4, chains, ..AnalyticsConfig::default() }
    }

    /// The real client validates settings; the mock answers the calls
    fn mock_port(settings: &ChainSettings) -> Result<Arc<dyn ChainDataPort>, WindowError> {
        JsonRpcChainClient::from_settings(settings)?;
        Ok(Arc::new(scenario_chain()))
    }

    #[derive(Clone, Default)]
    struct RecordingExporter {
        seen: Arc<Mutex<Vec<WindowSummary>>>,
    }

    #[async_trait]
    impl ReportExporter for RecordingExporter {
        fn name(&self) -> &str {
            "recording"
        }

        async fn export(&self, summary: &WindowSummary) -> eyre::Result<()> {
            self.seen.lock().unwrap().push(summary.clone());
            Ok(())
        }
    }

    struct FailingExporter;

    #[async_trait]
    impl ReportExporter for FailingExporter {
        fn name(&self) -> &str {
            "failing"
        }

        async fn export(&self, _summary: &WindowSummary) -> eyre::Result<()> {
            Err(eyre::eyre!("disk full"))
        }
    }

    #[tokio::test]
    async fn test_concrete_scenario_end_to_end() {
        let recorder = RecordingExporter::default();
        let runner = MultiChainRunnerBuilder::new()
            .with_config(config(vec![ChainConfig::new(Chain::Ethereum).with_rpc_url("http://localhost:8545")]))
            .with_port_factory(mock_port)
            .add_exporter(recorder.clone())
            .build()
            .unwrap();

        let runs = runner.run_all().await;
        assert_eq!(runs.len(), 1);

        let outcome = runs[0].result.as_ref().unwrap();
        assert!(outcome.range().partial);
        assert!(outcome.failures().is_empty());

        let summary = outcome.summary().unwrap();
        assert_eq!(summary.blocks.analyzed, 10);
        assert_eq!(summary.transactions.total, 20);
        assert_eq!(summary.transactions.failed, 1);
        assert_eq!(summary.transactions.successful, 19);
        assert_eq!(summary.contracts.total_creations, 1);
        assert_eq!(summary.contracts.unique_contracts, 1);
        assert_eq!(summary.value.total, BigUint::from(20_000u32));
        assert_eq!(summary.value.total_formatted, "0.00000000000002");
        // two senders, the shared recipient and the created contract
        assert_eq!(summary.addresses.unique, 4);
        assert_eq!(summary.data.total_bytes, 2);
        assert_eq!(summary.gas.utilization_rate, 50.0);

        let exported = recorder.seen.lock().unwrap();
        assert_eq!(exported.len(), 1);
        assert_eq!(&exported[0], summary);
    }

    #[tokio::test]
    async fn test_missing_rpc_url_does_not_stop_other_chains() {
        let recorder = RecordingExporter::default();
        let runner = MultiChainRunnerBuilder::new()
            .with_config(config(vec![
                ChainConfig::new(Chain::Ethereum).with_rpc_url("http://localhost:8545"),
                ChainConfig::new(Chain::Polygon),
                ChainConfig::new(Chain::Base).with_rpc_url("http://localhost:9545"),
            ]))
            .with_port_factory(mock_port)
            .add_exporter(recorder.clone())
            .build()
            .unwrap();

        let runs = runner.run_all().await;
        let chains: Vec<Chain> = runs.iter().map(|r| r.chain).collect();
        assert_eq!(chains, vec![Chain::Ethereum, Chain::Polygon, Chain::Base]);

        assert!(runs[0].result.is_ok());
        match &runs[1].result {
            Err(WindowError::ChainUnavailable { chain, reason }) => {
                assert_eq!(*chain, Chain::Polygon);
                assert!(reason.contains("no RPC URL configured"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(runs[2].result.is_ok());

        let exported: Vec<Chain> = recorder.seen.lock().unwrap().iter().map(|s| s.chain).collect();
        assert_eq!(exported, vec![Chain::Ethereum, Chain::Base]);
    }

    #[tokio::test]
    async fn test_default_port_reports_unconfigured_chain() {
        // no factory override: the JSON-RPC client is built and fails before any request
        let runner =
            MultiChainRunnerBuilder::new().with_config(config(vec![ChainConfig::new(Chain::Mantle)])).build().unwrap();
        let runs = runner.run_all().await;
        assert!(matches!(runs[0].result, Err(WindowError::ChainUnavailable { chain: Chain::Mantle, .. })));
    }

    #[tokio::test]
    async fn test_exporter_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = RecordingExporter::default();
        let runner = MultiChainRunnerBuilder::new()
            .with_config(config(vec![
                ChainConfig::new(Chain::Ethereum).with_rpc_url("http://localhost:8545"),
                ChainConfig::new(Chain::Optimism).with_rpc_url("http://localhost:9545"),
            ]))
            .with_port_factory(mock_port)
            .add_exporter(FailingExporter)
            .add_exporter(CsvExporter::new(dir.path().join("windows.csv")))
            .add_exporter(JsonExporter::new(dir.path()))
            .add_exporter(recorder.clone())
            .build()
            .unwrap();

        let runs = runner.run_all().await;
        assert!(runs.iter().all(|r| r.result.is_ok()));
        assert_eq!(recorder.seen.lock().unwrap().len(), 2);

        let csv = std::fs::read_to_string(dir.path().join("windows.csv")).unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(dir.path().join("ethereum_window.json").exists());
        assert!(dir.path().join("optimism_window.json").exists());
    }

    #[tokio::test]
    async fn test_dropped_blocks_are_reported_not_fatal() {
        let factory = |settings: &ChainSettings| -> Result<Arc<dyn ChainDataPort>, WindowError> {
            JsonRpcChainClient::from_settings(settings)?;
            let first_tx = B256::left_padding_from(&1u64.to_be_bytes());
            Ok(Arc::new(scenario_chain().failing_full_block(3).failing_receipt(first_tx)))
        };
        let runner = MultiChainRunnerBuilder::new()
            .with_config(config(vec![ChainConfig::new(Chain::Arbitrum).with_rpc_url("http://localhost:8545")]))
            .with_port_factory(factory)
            .build()
            .unwrap();

        let runs = runner.run_all().await;
        let outcome = runs[0].result.as_ref().unwrap();
        assert_eq!(outcome.failures().len(), 2);

        let summary = outcome.summary().unwrap();
        assert_eq!(summary.blocks.analyzed, 9);
        assert_eq!(summary.blocks.in_range, 10);
        assert_eq!(summary.dropped_blocks(), 1);
        assert_eq!(summary.transactions.total, 18);
        assert_eq!(summary.transactions.analyzed, 17);
        assert_eq!(summary.transactions.without_receipt, 1);
        assert_eq!(summary.value.total, BigUint::from(17_000u32));
    }

    #[tokio::test]
    async fn test_per_chain_overrides_from_toml() {
        let raw = r#"
            days = 0.001
            max_blocks = 500
            inter_batch_delay_ms = 0

            [[chains]]
            chain = "ethereum"
            rpc_http_url = "http://localhost:8545"
            max_blocks = 3

            [[chains]]
            chain = "bsc"
            rpc_http_url = "http://localhost:8546"
            batch_size = 2
        "#;
        let config: AnalyticsConfig = parse_config(raw).unwrap();
        config.validate().unwrap();

        let runner = MultiChainRunnerBuilder::new().with_config(config).with_port_factory(mock_port).build().unwrap();
        let runs = runner.run_all().await;

        let eth = runs[0].result.as_ref().unwrap();
        assert!(eth.range().capped);
        assert_eq!(eth.range().block_count(), 3);
        assert_eq!(eth.summary().unwrap().blocks.first_block, 7);

        // 86.4 seconds back from block 9 reaches block 2
        let bsc = runs[1].result.as_ref().unwrap();
        assert!(!bsc.range().capped);
        assert!(!bsc.range().partial);
        assert_eq!(bsc.range().start_block, 2);
        assert_eq!(bsc.summary().unwrap().blocks.analyzed, 8);
    }
}
