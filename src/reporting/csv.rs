use super::ReportExporter;
use crate::logic::types::WindowSummary;
use async_trait::async_trait;
use eyre::Result;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::info;

const HEADER: &str = "chain,first_block,last_block,blocks_analyzed,blocks_in_range,first_timestamp,last_timestamp,\
time_span_secs,tx_total,tx_failed,tx_without_receipt,tx_max_per_block,tx_avg_per_block,tx_per_second,\
gas_used,gas_limit,gas_utilization_percent,value_wei,value_native,avg_value_per_tx_wei,contract_creations,\
unique_contracts,unique_addresses,data_bytes,base_fee_blocks,base_fee_avg_wei,base_fee_min_wei,base_fee_max_wei\n";

/// Appends one row per summary to a CSV file
pub struct CsvExporter {
    path: PathBuf,
}

impl CsvExporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_header(&self) -> Result<()> {
        if tokio::fs::try_exists(&self.path).await? {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new().create(true).write(true).truncate(true).open(&self.path).await?;
        file.write_all(HEADER.as_bytes()).await?;
        file.flush().await?;

        info!("Created window summary file {}", self.path.display());
        Ok(())
    }
}

fn csv_row(s: &WindowSummary) -> String {
    let opt = |v: &Option<num_bigint::BigUint>| v.as_ref().map(|v| v.to_string()).unwrap_or_default();
    format!(
        "{},{},{},{},{},{},{},{},{},{},{},{},{},{:.4},{},{},{:.2},{},{},{},{},{},{},{},{},{},{},{}\n",
        s.chain,
        s.blocks.first_block,
        s.blocks.last_block,
        s.blocks.analyzed,
        s.blocks.in_range,
        s.blocks.first_timestamp,
        s.blocks.last_timestamp,
        s.blocks.time_span_secs,
        s.transactions.total,
        s.transactions.failed,
        s.transactions.without_receipt,
        s.transactions.max_per_block,
        s.transactions.average_per_block,
        s.transactions.per_second,
        s.gas.total_used,
        s.gas.total_limit,
        s.gas.utilization_rate,
        s.value.total,
        s.value.total_formatted,
        s.value.average_per_tx,
        s.contracts.total_creations,
        s.contracts.unique_contracts,
        s.addresses.unique,
        s.data.total_bytes,
        s.base_fee.blocks_reporting,
        s.base_fee.average,
        opt(&s.base_fee.min),
        opt(&s.base_fee.max),
    )
}

#[async_trait]
impl ReportExporter for CsvExporter {
    fn name(&self) -> &str {
        "csv"
    }

    async fn export(&self, summary: &WindowSummary) -> Result<()> {
        self.ensure_header().await?;

        let mut file = OpenOptions::new().append(true).open(&self.path).await?;
        file.write_all(csv_row(summary).as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
