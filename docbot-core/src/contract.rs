//! # contract: the chat service seam
//!
//! This module defines the single trait ([`ChatService`]) through which docbot talks to a
//! language model, together with the plain data types that cross that seam.
//!
//! ## Interface & Extensibility
//! - Implement [`ChatService`] to add a new backend (see [`crate::ollama::OllamaClient`]).
//! - A call returns a [`ChatReply`], which is a tagged union: either one complete
//!   [`ChatResponse`] or a [`ChatStream`] of [`ChatResponsePart`]s. The backend picks the
//!   variant once, from the request's `stream` flag; consumers branch on the variant.
//! - Errors are uniform: every backend failure is a [`ChatError`].
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`, so tests get a `MockChatService`.

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use mockall::automock;
use serde::{Deserialize, Serialize};

/// A single chat message sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// The request body sent to the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub stream: bool,
    pub messages: Vec<ChatMessage>,
}

/// Prompt/completion token counts reported by the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl TokenUsage {
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// A complete, non-streamed completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatResponse {
    pub content: String,
    pub usage: TokenUsage,
}

/// One increment of a streamed completion.
///
/// Only the terminal part (`done == true`) carries token counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatResponsePart {
    pub content: String,
    pub done: bool,
    pub usage: Option<TokenUsage>,
}

/// Ordered, finite sequence of streamed parts.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<ChatResponsePart, ChatError>> + Send>>;

/// What a [`ChatService`] hands back for a request.
pub enum ChatReply {
    Complete(ChatResponse),
    Streamed(ChatStream),
}

impl fmt::Debug for ChatReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatReply::Complete(response) => f.debug_tuple("Complete").field(response).finish(),
            ChatReply::Streamed(_) => f.write_str("Streamed(..)"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("chat endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode chat response: {0}")]
    Decode(String),
    #[error("chat endpoint reported an error: {0}")]
    Upstream(String),
}

/// Trait for sending a chat request to a language model.
/// Implemented by real clients and by test mocks.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Send `request` and return either the full response or a stream of parts,
    /// matching `request.stream`.
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, ChatError>;
}
