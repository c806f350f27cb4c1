// file: src/summarizer/mod.rs
// description: remote summarization module exports
// reference: internal module structure

pub mod classify;
pub mod client;
pub mod prompt;
pub mod retry;
pub mod transport;

pub use client::{CodeSummarizer, EMPTY_SUMMARY_SENTINEL};
pub use retry::{RetryPolicy, with_retry};
pub use transport::{CompletionTransport, GeminiTransport};
