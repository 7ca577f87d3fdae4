use super::ReportExporter;
use crate::logic::types::WindowSummary;
use async_trait::async_trait;
use eyre::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes `<dir>/<chain>_window.json`, replacing the previous file of that chain
pub struct JsonExporter {
    output_dir: PathBuf,
}

impl JsonExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into() }
    }

    pub fn file_for(&self, summary: &WindowSummary) -> PathBuf {
        self.output_dir.join(format!("{}_window.json", summary.chain))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[async_trait]
impl ReportExporter for JsonExporter {
    fn name(&self) -> &str {
        "json"
    }

    async fn export(&self, summary: &WindowSummary) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.file_for(summary);
        let json = serde_json::to_string_pretty(summary)?;
        tokio::fs::write(&path, json).await?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_sync::config::Chain;
    use crate::reporting::test_support::sample_summary;

    #[tokio::test]
    async fn test_writes_one_file_per_chain() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = JsonExporter::new(dir.path());

        let summary = sample_summary(Chain::Arbitrum);
        exporter.export(&summary).await.unwrap();
        exporter.export(&summary).await.unwrap();

        let path = dir.path().join("arbitrum_window.json");
        let value: serde_json::Value = serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(value["chain"], "arbitrum");
        assert_eq!(value["value"]["total"], "1000000000000000000");
        assert_eq!(value["value"]["total_formatted"], "1");
        assert_eq!(value["blocks"]["in_range"], 5);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
