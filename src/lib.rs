// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod config;
pub mod error;
pub mod exporter;
pub mod mcp;
pub mod models;
pub mod pipeline;
pub mod repository;
pub mod summarizer;
pub mod utils;

pub use config::{Config, ConfigStore, ConfigUpdate, ModelConfig, PipelineConfig, ServerConfig};
pub use error::{PipelineError, RemoteError, RemoteErrorKind, Result};
pub use exporter::{JsonExporter, ReportFormat, render, write_report, write_results};
pub use mcp::CodeSummarizerMcp;
pub use models::{DetailLevel, LanguageTag, SummaryOptions, SummaryOutcome, SummaryResult};
pub use pipeline::{BatchSummarizer, PipelineOrchestrator, PipelineStats, ProgressTracker, RunReport};
pub use repository::{FileScanner, IgnoreFilter, find_files};
pub use summarizer::{CodeSummarizer, CompletionTransport, GeminiTransport, RetryPolicy};
pub use utils::Validator;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(SummaryOptions::default().detail_level, DetailLevel::Medium);
        let _scanner = FileScanner::new();
    }
}
