// crates/core/src/llm/ollama.rs
//! Ollama provider - chat completions against a local daemon.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::provider::CompletionProvider;
use super::types::{truncate_body, ChatMessage, ProviderError};

const PROVIDER_NAME: &str = "ollama";

/// How long to wait for a completion before giving up. Local generation on
/// modest hardware can be slow, so this is deliberately generous.
const COMPLETION_TIMEOUT: Duration = Duration::from_secs(300);

/// How long the availability probe may take. The daemon is on localhost, so
/// anything slower than this means it is not usable.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

/// Request body for `POST /api/chat` (non-streaming).
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// Response: the assistant message lives at `message.content`.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

/// Completion backend that talks to a local Ollama daemon.
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaProvider {
    /// Create a provider for the daemon at `base_url`
    /// (e.g. "http://127.0.0.1:11434").
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CompletionProvider for OllamaProvider {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        let body = OllamaChatRequest {
            model,
            messages,
            stream: false,
        };

        let t0 = std::time::Instant::now();
        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .timeout(COMPLETION_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, model, "ollama: request failed");
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
            tracing::error!(status = status.as_u16(), body = %truncate_body(&text, 500), "ollama: non-success response");
            return Err(ProviderError::Api {
                provider: PROVIDER_NAME,
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: OllamaChatResponse =
            serde_json::from_str(&text).map_err(|e| ProviderError::ParseFailed {
                provider: PROVIDER_NAME,
                reason: e.to_string(),
            })?;

        tracing::debug!(
            model,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            content_len = parsed.message.content.len(),
            "ollama: completion received"
        );
        Ok(parsed.message.content)
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable {
                provider: PROVIDER_NAME,
                reason: format!("daemon not reachable at {}: {}", self.base_url, e),
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::Unavailable {
                provider: PROVIDER_NAME,
                reason: format!("version probe returned HTTP {}", response.status().as_u16()),
            })
        }
    }

    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
