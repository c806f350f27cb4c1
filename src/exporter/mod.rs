// file: src/exporter/mod.rs
// description: report writers for summarization results
// reference: internal module structure

pub mod json;
pub mod text;

pub use json::{JsonExporter, SummaryReport};
pub use text::{render, write_report};

use crate::error::Result;
use crate::models::SummaryResult;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    /// `.json` outputs get the JSON report, everything else plain text.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ReportFormat::Json,
            _ => ReportFormat::Text,
        }
    }
}

pub async fn write_results(results: &[SummaryResult], root: &Path, output: &Path) -> Result<()> {
    match ReportFormat::for_path(output) {
        ReportFormat::Json => JsonExporter::default().export(results, root, output).await,
        ReportFormat::Text => write_report(results, output).await,
    }
}
