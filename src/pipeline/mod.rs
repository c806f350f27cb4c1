// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

pub mod batch;
pub mod orchestrator;
pub mod progress;

pub use batch::BatchSummarizer;
pub use orchestrator::{PipelineOrchestrator, RunReport};
pub use progress::{PipelineStats, ProgressTracker};
