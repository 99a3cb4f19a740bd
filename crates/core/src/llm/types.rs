// crates/core/src/llm/types.rs
//! Message and error types shared by the completion backends.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role of a chat message, serialized in the lowercase form both backends
/// expect on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One message in a chat-completion conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Truncate a response body for logging without splitting a UTF-8 character.
pub(crate) fn truncate_body(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Errors that can occur during completion calls.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} is not available: {reason}")]
    Unavailable {
        provider: &'static str,
        reason: String,
    },

    #[error("request to {provider} failed: {reason}")]
    Request {
        provider: &'static str,
        reason: String,
    },

    #[error("{provider} returned HTTP {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("failed to parse {provider} response: {reason}")]
    ParseFailed {
        provider: &'static str,
        reason: String,
    },

    #[error("{provider} response contained no completion")]
    EmptyResponse { provider: &'static str },
}
