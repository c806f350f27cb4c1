// file: src/summarizer/transport.rs
// description: completion transport trait and the Gemini generateContent client
// reference: https://ai.google.dev/api/generate-content

use crate::config::ModelConfig;
use crate::error::{PipelineError, RemoteError, RemoteErrorKind, Result};
use crate::summarizer::classify::classify;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// One prompt in, one completion out. Failures come back already classified.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn complete(&self, prompt: &str) -> std::result::Result<String, RemoteError>;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct GeminiTransport {
    client: Client,
    api_key: String,
    endpoint: String,
    retryable_statuses: Vec<u16>,
}

impl GeminiTransport {
    pub fn new(api_key: String, model: &ModelConfig, retryable_statuses: Vec<u16>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(model.request_timeout_secs))
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let endpoint = format!(
            "{}/models/{}:generateContent",
            model.base_url.trim_end_matches('/'),
            model.model
        );

        Ok(Self {
            client,
            api_key,
            endpoint,
            retryable_statuses,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn send_error(&self, err: reqwest::Error) -> RemoteError {
        let message = format!("Failed to send request: {}", err);
        if err.is_timeout() || err.is_connect() || err.is_request() {
            return RemoteError::network(message);
        }
        RemoteError::new(classify(None, &message, &self.retryable_statuses), message)
    }
}

#[async_trait]
impl CompletionTransport for GeminiTransport {
    async fn complete(&self, prompt: &str) -> std::result::Result<String, RemoteError> {
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        debug!("Sending {} chars to {}", prompt.len(), self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|envelope| envelope.error.message)
                .unwrap_or(body);
            let kind = classify(Some(status.as_u16()), &message, &self.retryable_statuses);

            return Err(RemoteError::new(
                kind,
                format!("Gemini request failed with status {}: {}", status, message),
            )
            .with_status(status.as_u16()));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            RemoteError::unclassified(format!("Failed to parse Gemini response: {}", e))
        })?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty()
            && let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason)
        {
            return Err(RemoteError::new(
                RemoteErrorKind::Unclassified,
                format!("Content blocked: {}", reason),
            ));
        }

        Ok(text)
    }
}
