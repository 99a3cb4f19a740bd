// crates/core/src/llm/openai.rs
//! OpenAI provider - hosted chat completions with bearer auth.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::provider::CompletionProvider;
use super::types::{truncate_body, ChatMessage, ProviderError};

const PROVIDER_NAME: &str = "openai";

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

const COMPLETION_TIMEOUT: Duration = Duration::from_secs(120);

/// Request body for `POST /v1/chat/completions`.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

/// Response: the completion text lives at `choices[0].message.content`.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Completion backend for the hosted OpenAI-compatible API.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAiProvider {
    /// Create a provider for the API at `base_url`. `api_key` is optional at
    /// construction so the server can start without one configured; the
    /// availability check reports the missing key instead.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        let key = self.api_key.as_deref().ok_or(ProviderError::Unavailable {
            provider: PROVIDER_NAME,
            reason: "no API key configured (set OPENAI_API_KEY)".to_string(),
        })?;

        let body = ChatCompletionRequest { model, messages };

        let t0 = std::time::Instant::now();
        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .timeout(COMPLETION_TIMEOUT)
            .header("Authorization", format!("Bearer {key}"))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, model, "openai: request failed");
                ProviderError::Request {
                    provider: PROVIDER_NAME,
                    reason: e.to_string(),
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| ProviderError::Request {
            provider: PROVIDER_NAME,
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), body = %truncate_body(&text, 500), "openai: non-success response");
            return Err(ProviderError::Api {
                provider: PROVIDER_NAME,
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::ParseFailed {
                provider: PROVIDER_NAME,
                reason: e.to_string(),
            })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse {
                provider: PROVIDER_NAME,
            })?;

        let content = choice.message.content.unwrap_or_default();
        tracing::debug!(
            model,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            content_len = content.len(),
            "openai: completion received"
        );
        Ok(content)
    }

    /// Availability means an API key is configured. No network probe: the
    /// hosted endpoint being down surfaces as a request error with full
    /// detail, and probing it on every job would cost a round trip.
    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.api_key.is_some() {
            Ok(())
        } else {
            Err(ProviderError::Unavailable {
                provider: PROVIDER_NAME,
                reason: "no API key configured (set OPENAI_API_KEY)".to_string(),
            })
        }
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
