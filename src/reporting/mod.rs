/// Reporting Layer
///
/// Renders finished window summaries. Exporters only read a
/// [`WindowSummary`]; every number they print comes from its exact integer
/// totals.
pub mod console;
pub mod csv;
pub mod json;

use crate::logic::types::WindowSummary;
use async_trait::async_trait;

pub use console::ConsoleExporter;
pub use csv::CsvExporter;
pub use json::JsonExporter;

#[async_trait]
pub trait ReportExporter: Send + Sync {
    fn name(&self) -> &str;

    async fn export(&self, summary: &WindowSummary) -> eyre::Result<()>;
}
