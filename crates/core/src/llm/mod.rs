// crates/core/src/llm/mod.rs
//! LLM provider abstraction for summarization.
//!
//! Two backends implement [`CompletionProvider`]: [`OllamaProvider`] talks to
//! a local Ollama daemon, [`OpenAiProvider`] talks to the hosted
//! chat-completions API. [`ProviderRouter`] picks between them from the
//! model identifier (`ollama:`-prefixed ids go local).

pub mod ollama;
pub mod openai;
pub mod provider;
pub mod router;
pub mod types;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use provider::CompletionProvider;
pub use router::{ProviderRouter, ProviderSpec, SummarizeParams, LOCAL_MODEL_PREFIX};
pub use types::{ChatMessage, ProviderError, Role};
