//! Summarize recent activity on every configured chain.
//!
//! Reads `<CHAIN>_RPC_URL` and friends from the environment (and `.env`), or
//! a TOML file passed as the first argument:
//!
//! ```text
//! ETHEREUM_RPC_URL=https://eth.example LOOKBACK_DAYS=0.5 cargo run --example window_report
//! cargo run --example window_report -- window.toml
//! ```
//!
//! Set `REPORT_DIR` to also write CSV and JSON reports.
use chain_window::{AnalyticsConfig, ConfigLoader, ConsoleExporter, CsvExporter, JsonExporter, MultiChainRunnerBuilder};
use eyre::Result;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match std::env::args().nth(1) {
        Some(path) => AnalyticsConfig::load_from_file(&path).await?,
        None => AnalyticsConfig::from_env()?,
    };
    info!("Analyzing the last {} days on {} chains", config.days, config.chains.len());

    let mut builder = MultiChainRunnerBuilder::new().with_config(config).add_exporter(ConsoleExporter::new());
    if let Ok(dir) = std::env::var("REPORT_DIR") {
        let dir = PathBuf::from(dir);
        builder = builder
            .add_exporter(CsvExporter::new(dir.join("window_summaries.csv")))
            .add_exporter(JsonExporter::new(dir));
    }
    let runner = builder.build()?;

    let runs = runner.run_all().await;
    let failed = runs.iter().filter(|r| r.result.is_err()).count();
    for run in &runs {
        if let Err(e) = &run.result {
            error!("{}: {}", run.chain, e);
        }
    }

    if failed == runs.len() && !runs.is_empty() {
        eyre::bail!("every chain failed");
    }
    Ok(())
}
