// crates/core/src/lib.rs
//! Engine integrations: the external transcriber process and the
//! summarization LLM providers. No HTTP or persistence concerns live here.

pub mod llm;
pub mod transcriber;

pub use llm::{
    ChatMessage, CompletionProvider, OllamaProvider, OpenAiProvider, ProviderError,
    ProviderRouter, ProviderSpec, SummarizeParams,
};
pub use transcriber::{
    read_artifact, ArtifactError, ProgressFn, TranscribeBackend, TranscribeOutcome,
    TranscribeParams, Transcriber, TranscriberError,
};
