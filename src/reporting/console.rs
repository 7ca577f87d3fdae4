use super::ReportExporter;
use crate::logic::types::WindowSummary;
use crate::utils::format_units;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt::Write;

const BOLD: &str = "\x1b[1m";
const CYAN: &str = "\x1b[36m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Prints a summary table to stdout
#[derive(Debug, Clone)]
pub struct ConsoleExporter {
    colored: bool,
}

impl ConsoleExporter {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn plain() -> Self {
        Self { colored: false }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.colored { format!("{}{}{}", color, text, RESET) } else { text.to_string() }
    }

    pub fn render(&self, summary: &WindowSummary) -> String {
        let symbol = summary.chain.native_symbol();
        let decimals = crate::constants::NATIVE_DECIMALS;
        let mut out = String::new();

        let title = format!("{} (chain id {}) window summary", summary.chain, summary.chain.chain_id());
        let _ = writeln!(out, "{}", self.paint(BOLD, &title));
        let _ = writeln!(out, "{}", "-".repeat(48));

        let mut row = |label: &str, value: String| {
            let _ = writeln!(out, "  {:<26}{}", self.paint(CYAN, label), value);
        };

        let b = &summary.blocks;
        row(
            "blocks",
            format!("{}..={} ({} analyzed, {} in range)", b.first_block, b.last_block, b.analyzed, b.in_range),
        );
        row("from", format_timestamp(b.first_timestamp));
        row("to", format_timestamp(b.last_timestamp));

        let t = &summary.transactions;
        row("transactions", format!("{} ({} failed, {} without receipt)", t.total, t.failed, t.without_receipt));
        row("tx per block", format!("avg {} / max {}", t.average_per_block, t.max_per_block));
        row("tx per second", format!("{:.2}", t.per_second));

        let g = &summary.gas;
        row("gas used", format!("{} of {}", g.total_used, g.total_limit));
        row("gas utilization", format!("{:.2}%", g.utilization_rate));

        row("value transferred", format!("{} {}", summary.value.total_formatted, symbol));
        row("average value per tx", format!("{} {}", format_units(&summary.value.average_per_tx, decimals), symbol));

        row(
            "contracts",
            format!("{} created ({} unique)", summary.contracts.total_creations, summary.contracts.unique_contracts),
        );
        row("unique addresses", summary.addresses.unique.to_string());
        let data = &summary.data;
        row("calldata", format!("{} bytes (avg {} per block)", data.total_bytes, data.average_per_block));

        let fee = &summary.base_fee;
        if fee.blocks_reporting > 0 {
            row("base fee (wei)", format!("avg {}", fee.average));
            if let (Some(min), Some(max)) = (&fee.min, &fee.max) {
                row("base fee range (wei)", format!("{}..={}", min, max));
            }
        }

        let dropped = summary.dropped_blocks();
        if dropped > 0 {
            let note = format!("{} blocks could not be fetched", dropped);
            let _ = writeln!(out, "  {}", self.paint(YELLOW, &note));
        }
        out
    }
}

impl Default for ConsoleExporter {
    fn default() -> Self {
        Self::new()
    }
}

fn format_timestamp(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

#[async_trait]
impl ReportExporter for ConsoleExporter {
    fn name(&self) -> &str {
        "console"
    }

    async fn export(&self, summary: &WindowSummary) -> eyre::Result<()> {
        println!("{}", self.render(summary));
        Ok(())
    }
}
