// file: src/pipeline/progress.rs
// description: progress tracking and statistics reporting for summarization runs
// reference: uses indicatif for progress bars and tracks per-outcome counts

use crate::models::SummaryOutcome;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineStats {
    pub files_summarized: usize,
    pub files_degraded: usize,
    pub files_skipped: usize,
    pub total_bytes_processed: u64,
    pub duration_secs: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_files(&self) -> usize {
        self.files_summarized + self.files_degraded
    }

    pub fn files_per_second(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        self.total_files() as f64 / self.duration_secs as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.total_files();
        if total == 0 {
            return 0.0;
        }
        (self.files_summarized as f64 / total as f64) * 100.0
    }
}

pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    files_summarized: Arc<AtomicUsize>,
    files_degraded: Arc<AtomicUsize>,
    files_skipped: Arc<AtomicUsize>,
    bytes_processed: Arc<AtomicU64>,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(total_files: usize) -> Self {
        Self::with_color(total_files, true)
    }

    pub fn with_color(total_files: usize, colored: bool) -> Self {
        let multi_progress = MultiProgress::new();

        let main_bar = create_progress_bar(&multi_progress, total_files as u64, colored);
        let detail_bar = create_detail_bar(&multi_progress);

        Self::from_bars(main_bar, detail_bar)
    }

    /// Tracks counts without drawing anything. Used where stdout or stderr
    /// belong to someone else.
    pub fn hidden(total_files: usize) -> Self {
        let main_bar = ProgressBar::hidden();
        main_bar.set_length(total_files as u64);
        Self::from_bars(main_bar, ProgressBar::hidden())
    }

    fn from_bars(main_bar: ProgressBar, detail_bar: ProgressBar) -> Self {
        Self {
            main_bar,
            detail_bar,
            files_summarized: Arc::new(AtomicUsize::new(0)),
            files_degraded: Arc::new(AtomicUsize::new(0)),
            files_skipped: Arc::new(AtomicUsize::new(0)),
            bytes_processed: Arc::new(AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn record(&self, outcome: SummaryOutcome) {
        match outcome {
            SummaryOutcome::Summarized => {
                self.files_summarized.fetch_add(1, Ordering::SeqCst);
            }
            SummaryOutcome::TooLarge | SummaryOutcome::Unreadable => {
                self.files_skipped.fetch_add(1, Ordering::SeqCst);
                self.files_degraded.fetch_add(1, Ordering::SeqCst);
            }
            _ => {
                self.files_degraded.fetch_add(1, Ordering::SeqCst);
            }
        }
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn add_bytes_processed(&self, bytes: u64) {
        self.bytes_processed.fetch_add(bytes, Ordering::SeqCst);
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Summarization complete");
        self.detail_bar.finish_and_clear();
    }

    pub fn get_stats(&self) -> PipelineStats {
        let duration = self.start_time.elapsed().as_secs();

        PipelineStats {
            files_summarized: self.files_summarized.load(Ordering::SeqCst),
            files_degraded: self.files_degraded.load(Ordering::SeqCst),
            files_skipped: self.files_skipped.load(Ordering::SeqCst),
            total_bytes_processed: self.bytes_processed.load(Ordering::SeqCst),
            duration_secs: duration,
        }
    }

    fn update_detail_bar(&self) {
        let summarized = self.files_summarized.load(Ordering::SeqCst);
        let degraded = self.files_degraded.load(Ordering::SeqCst);

        let message = format!("Summarized: {} | Degraded: {}", summarized, degraded);

        self.detail_bar.set_message(message);
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    if colored {
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
                )
                .expect("Failed to create progress bar template")
                .progress_chars("█▓▒░"),
        );
    } else {
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({eta}) {msg}")
                .expect("Failed to create progress bar template")
                .progress_chars("=>-"),
        );
    }
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    let style = ProgressStyle::default_bar()
        .template("{msg}")
        .expect("Failed to create detail bar template");
    bar.set_style(style);
    bar
}
