// file: src/pipeline/orchestrator.rs
// description: coordinates directory discovery, batch summarization and report writing
// reference: orchestrates the asynchronous summarization workflow

use crate::config::Config;
use crate::error::Result;
use crate::exporter::write_results;
use crate::models::{SummaryOptions, SummaryResult};
use crate::pipeline::batch::BatchSummarizer;
use crate::pipeline::progress::{PipelineStats, ProgressTracker};
use crate::repository::find_files;
use crate::summarizer::CodeSummarizer;
use crate::utils::validation::Validator;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RunReport {
    pub root: PathBuf,
    pub results: Vec<SummaryResult>,
    pub stats: PipelineStats,
    pub output: Option<PathBuf>,
}

pub struct PipelineOrchestrator {
    config: Config,
    batcher: BatchSummarizer,
    show_progress: bool,
}

impl PipelineOrchestrator {
    pub fn new(config: Config) -> Result<Self> {
        let summarizer = CodeSummarizer::from_config(&config)?;
        Ok(Self::with_summarizer(config, summarizer))
    }

    pub fn with_summarizer(config: Config, summarizer: CodeSummarizer) -> Self {
        let batcher = BatchSummarizer::from_config(summarizer, &config.pipeline);
        Self {
            config,
            batcher,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Summarize every eligible file under `root`, writing the report to
    /// `output` when one is given and at least one file was found.
    pub async fn summarize_directory(
        &self,
        root: &Path,
        output: Option<&Path>,
        options: SummaryOptions,
    ) -> Result<RunReport> {
        Validator::validate_directory(root)?;
        options.validate()?;
        let root = std::path::absolute(root)?;

        info!("Starting summarization of {}", root.display());

        let files = find_files(&root).await?;
        if files.is_empty() {
            warn!("No code files found in {}", root.display());
            return Ok(RunReport {
                root,
                results: Vec::new(),
                stats: PipelineStats::new(),
                output: None,
            });
        }

        info!(
            "Summarizing {} files in batches of {}",
            files.len(),
            self.config.pipeline.batch_size
        );

        let progress = if self.show_progress {
            ProgressTracker::new(files.len())
        } else {
            ProgressTracker::hidden(files.len())
        };

        let results = self
            .batcher
            .summarize_all_tracked(
                &files,
                &root,
                options,
                self.config.pipeline.batch_size,
                &progress,
            )
            .await;

        let stats = progress.get_stats();
        progress.finish();

        if let Some(output) = output {
            write_results(&results, &root, output).await?;
        }

        self.log_final_stats(&stats);

        Ok(RunReport {
            root,
            results,
            stats,
            output: output.map(Path::to_path_buf),
        })
    }

    fn log_final_stats(&self, stats: &PipelineStats) {
        info!("=== Summarization Summary ===");
        info!("Duration: {} seconds", stats.duration_secs);
        info!("Files summarized: {}", stats.files_summarized);
        info!("Files degraded: {}", stats.files_degraded);
        info!("Files skipped before sending: {}", stats.files_skipped);
        info!("Success rate: {:.2}%", stats.success_rate());
        info!(
            "Processing speed: {:.2} files/sec",
            stats.files_per_second()
        );
        info!("=============================");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PipelineError, RemoteError};
    use crate::summarizer::{CompletionTransport, RetryPolicy};
    use async_trait::async_trait;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct FixedTransport;

    #[async_trait]
    impl CompletionTransport for FixedTransport {
        async fn complete(&self, _prompt: &str) -> std::result::Result<String, RemoteError> {
            Ok("mock summary".to_string())
        }
    }

    fn orchestrator() -> PipelineOrchestrator {
        let mut config = Config::default();
        config.pipeline.batch_pause_ms = 0;
        let summarizer = CodeSummarizer::new(Arc::new(FixedTransport), RetryPolicy::default());
        PipelineOrchestrator::with_summarizer(config, summarizer)
    }

    #[test]
    fn test_new_requires_api_key() {
        assert!(PipelineOrchestrator::new(Config::default()).is_err());
    }

    #[tokio::test]
    async fn test_summarize_directory_writes_report() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.js"), "let a = 1;").unwrap();
        std::fs::create_dir(temp.path().join("lib")).unwrap();
        std::fs::write(temp.path().join("lib").join("b.py"), "b = 2").unwrap();
        std::fs::write(temp.path().join("notes.md"), "# notes").unwrap();
        let output = temp.path().join("summary.txt");

        let report = orchestrator()
            .summarize_directory(temp.path(), Some(&output), SummaryOptions::default())
            .await
            .unwrap();

        assert_eq!(report.results.len(), 2);
        assert_eq!(report.stats.files_summarized, 2);

        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.contains("a.js\nmock summary\n"));
        assert!(written.contains("lib/b.py\nmock summary\n"));
    }

    #[tokio::test]
    async fn test_empty_directory_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("summary.txt");

        let report = orchestrator()
            .summarize_directory(temp.path(), Some(&output), SummaryOptions::default())
            .await
            .unwrap();

        assert!(report.results.is_empty());
        assert!(report.output.is_none());
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_missing_root_is_structural_error() {
        let temp = TempDir::new().unwrap();
        let result = orchestrator()
            .summarize_directory(&temp.path().join("missing"), None, SummaryOptions::default())
            .await;

        assert!(matches!(result, Err(PipelineError::Validation(_))));
    }
}
