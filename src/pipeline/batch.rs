// file: src/pipeline/batch.rs
// description: fixed-size batch execution of per-file summarization
// reference: https://docs.rs/futures/latest/futures/future/fn.join_all.html

use crate::config::PipelineConfig;
use crate::models::{LanguageTag, SummaryOptions, SummaryOutcome, SummaryResult, relative_display};
use crate::pipeline::progress::ProgressTracker;
use crate::summarizer::CodeSummarizer;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, warn};

/// Runs groups of files concurrently, one group at a time.
///
/// Every input path yields exactly one result, in input order. Per-file
/// failures never abort the batch; they become placeholder results.
#[derive(Debug, Clone)]
pub struct BatchSummarizer {
    summarizer: CodeSummarizer,
    max_file_size_bytes: u64,
    batch_pause: Duration,
}

impl BatchSummarizer {
    pub fn new(summarizer: CodeSummarizer) -> Self {
        Self::from_config(summarizer, &PipelineConfig::default())
    }

    pub fn from_config(summarizer: CodeSummarizer, config: &PipelineConfig) -> Self {
        Self {
            summarizer,
            max_file_size_bytes: config.max_file_size_bytes,
            batch_pause: Duration::from_millis(config.batch_pause_ms),
        }
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size_bytes = bytes;
        self
    }

    pub fn with_batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = pause;
        self
    }

    pub async fn summarize_one(
        &self,
        path: &Path,
        root: &Path,
        options: SummaryOptions,
    ) -> SummaryResult {
        self.summarize_file(path, root, options).await.0
    }

    pub async fn summarize_all(
        &self,
        paths: &[PathBuf],
        root: &Path,
        options: SummaryOptions,
        batch_size: usize,
    ) -> Vec<SummaryResult> {
        let progress = ProgressTracker::hidden(paths.len());
        self.summarize_all_tracked(paths, root, options, batch_size, &progress)
            .await
    }

    pub async fn summarize_all_tracked(
        &self,
        paths: &[PathBuf],
        root: &Path,
        options: SummaryOptions,
        batch_size: usize,
        progress: &ProgressTracker,
    ) -> Vec<SummaryResult> {
        let batch_size = batch_size.max(1);
        let batch_count = paths.len().div_ceil(batch_size);
        let mut results = Vec::with_capacity(paths.len());

        for (index, batch) in paths.chunks(batch_size).enumerate() {
            debug!(
                "Processing batch {}/{} ({} files)",
                index + 1,
                batch_count,
                batch.len()
            );

            let outcomes = join_all(
                batch
                    .iter()
                    .map(|path| self.summarize_file(path, root, options)),
            )
            .await;

            for (result, bytes) in outcomes {
                progress.record(result.outcome);
                progress.add_bytes_processed(bytes);
                results.push(result);
            }

            if index + 1 < batch_count && !self.batch_pause.is_zero() {
                tokio::time::sleep(self.batch_pause).await;
            }
        }

        results
    }

    async fn summarize_file(
        &self,
        path: &Path,
        root: &Path,
        options: SummaryOptions,
    ) -> (SummaryResult, u64) {
        let relative = relative_display(path, root);
        let language = LanguageTag::from_path(path);

        let size = match fs::metadata(path).await {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                warn!("Failed to stat {}: {}", relative, e);
                return (
                    SummaryResult::degraded(relative, language, SummaryOutcome::Failed),
                    0,
                );
            }
        };

        if size > self.max_file_size_bytes {
            info!(
                "Skipping {} ({} bytes > {} byte limit)",
                relative, size, self.max_file_size_bytes
            );
            return (
                SummaryResult::degraded(relative, language, SummaryOutcome::TooLarge),
                0,
            );
        }

        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read {}: {}", relative, e);
                return (
                    SummaryResult::degraded(relative, language, SummaryOutcome::Failed),
                    0,
                );
            }
        };

        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(_) => {
                warn!("Skipping {}: not valid UTF-8", relative);
                return (
                    SummaryResult::degraded(relative, language, SummaryOutcome::Unreadable),
                    0,
                );
            }
        };

        match self.summarizer.summarize(&content, &language, options).await {
            Ok(summary) => {
                debug!("Summarized {}", relative);
                (SummaryResult::summarized(relative, language, summary), size)
            }
            Err(err) => {
                warn!("Failed to summarize {}: {}", relative, err);
                let outcome = SummaryOutcome::from_remote_kind(err.kind);
                (SummaryResult::degraded(relative, language, outcome), size)
            }
        }
    }
}
