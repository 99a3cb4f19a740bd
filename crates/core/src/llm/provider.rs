// crates/core/src/llm/provider.rs
//! CompletionProvider trait defining the interface for completion backends.

use async_trait::async_trait;

use super::types::{ChatMessage, ProviderError};

/// A backend that can turn a chat conversation into completion text.
///
/// Implementations:
/// - `OllamaProvider` - local daemon speaking the Ollama chat API
/// - `OpenAiProvider` - hosted OpenAI-compatible chat completions API
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Run a chat completion against the given model and return the
    /// assistant's text.
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError>;

    /// Check whether the backend can currently serve requests (daemon
    /// reachable, API key configured, ...). Called before dispatching so a
    /// dead backend fails fast instead of tying up a worker.
    async fn health_check(&self) -> Result<(), ProviderError>;

    /// Backend name for logging and error messages (e.g. "ollama").
    fn name(&self) -> &'static str;
}
