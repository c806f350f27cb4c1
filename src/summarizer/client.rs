// file: src/summarizer/client.rs
// description: resilient code summarization over a completion transport
// reference: https://ai.google.dev/gemini-api/docs/text-generation

use crate::config::Config;
use crate::error::{RemoteError, Result};
use crate::models::{LanguageTag, SummaryOptions, SummaryRequest};
use crate::summarizer::prompt::{build_prompt, estimate_tokens};
use crate::summarizer::retry::{RetryPolicy, with_retry};
use crate::summarizer::transport::{CompletionTransport, GeminiTransport};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Returned in place of a summary when the model answers with nothing.
pub const EMPTY_SUMMARY_SENTINEL: &str = "Failed to generate summary.";

pub const DEFAULT_MAX_PROMPT_TOKENS: usize = 30_000;

#[derive(Clone)]
pub struct CodeSummarizer {
    transport: Arc<dyn CompletionTransport>,
    retry: RetryPolicy,
    max_prompt_tokens: usize,
}

impl CodeSummarizer {
    pub fn new(transport: Arc<dyn CompletionTransport>, retry: RetryPolicy) -> Self {
        Self {
            transport,
            retry,
            max_prompt_tokens: DEFAULT_MAX_PROMPT_TOKENS,
        }
    }

    pub fn with_max_prompt_tokens(mut self, max_prompt_tokens: usize) -> Self {
        self.max_prompt_tokens = max_prompt_tokens;
        self
    }

    /// Build a Gemini-backed summarizer. Fails when no API key is configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        let transport = GeminiTransport::new(
            api_key,
            &config.model,
            config.retry.retryable_statuses.clone(),
        )?;

        Ok(Self::new(Arc::new(transport), config.retry.clone())
            .with_max_prompt_tokens(config.model.max_prompt_tokens))
    }

    pub async fn summarize(
        &self,
        content: &str,
        language: &LanguageTag,
        options: SummaryOptions,
    ) -> std::result::Result<String, RemoteError> {
        let request_id = Uuid::new_v4().to_string();
        let request = SummaryRequest {
            content,
            language,
            options,
        };
        let prompt = build_prompt(&request);

        let estimated_tokens = estimate_tokens(&prompt);
        info!(
            request_id = %request_id,
            "Summarizing {} code, ~{} tokens",
            language,
            estimated_tokens
        );
        if estimated_tokens > self.max_prompt_tokens {
            warn!(
                request_id = %request_id,
                "Prompt of ~{} tokens is above the {} token guardrail",
                estimated_tokens,
                self.max_prompt_tokens
            );
        }

        let transport = &self.transport;
        let prompt = prompt.as_str();
        let text = with_retry(&self.retry, &request_id, || transport.complete(prompt)).await?;

        if text.trim().is_empty() {
            warn!(request_id = %request_id, "Model returned an empty summary");
            return Ok(EMPTY_SUMMARY_SENTINEL.to_string());
        }

        debug!(request_id = %request_id, "Received {} chars", text.len());
        Ok(text)
    }
}

impl std::fmt::Debug for CodeSummarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodeSummarizer")
            .field("retry", &self.retry)
            .field("max_prompt_tokens", &self.max_prompt_tokens)
            .finish_non_exhaustive()
    }
}
