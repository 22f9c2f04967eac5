//! [`ChatService`] backed by an Ollama server's `/api/chat` endpoint.
//!
//! Buffered requests get one JSON object back. Streamed requests get newline-delimited
//! JSON, one object per part; the last part has `done: true` and carries the token counts.

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::contract::{
    ChatError, ChatReply, ChatRequest, ChatResponse, ChatResponsePart, ChatService, ChatStream,
    TokenUsage,
};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: String,
}

/// Shape shared by the buffered response and every streamed line.
#[derive(Debug, Deserialize)]
struct WireChatResponse {
    #[serde(default)]
    message: Option<WireMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

impl WireChatResponse {
    fn content(&self) -> String {
        self.message
            .as_ref()
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }

    fn usage(&self) -> Option<TokenUsage> {
        if self.prompt_eval_count.is_none() && self.eval_count.is_none() {
            return None;
        }
        Some(TokenUsage {
            prompt_tokens: self.prompt_eval_count.unwrap_or(0),
            completion_tokens: self.eval_count.unwrap_or(0),
        })
    }
}

pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        info!(base_url = %base_url, "Initialized Ollama client");
        Self {
            client: Client::new(),
            base_url,
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl ChatService for OllamaClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        let url = self.chat_url();
        debug!(url = %url, model = %request.model, stream = request.stream, "POST chat request");

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "Chat endpoint returned an error status");
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        if request.stream {
            let bytes = Box::pin(response.bytes_stream().map_err(ChatError::from));
            return Ok(ChatReply::Streamed(decode_parts(bytes)));
        }

        let body = response.bytes().await?;
        let wire: WireChatResponse =
            serde_json::from_slice(&body).map_err(|e| ChatError::Decode(e.to_string()))?;
        if let Some(message) = &wire.error {
            return Err(ChatError::Upstream(message.clone()));
        }
        let usage = wire.usage().unwrap_or_default();
        info!(
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "Received complete chat response"
        );
        Ok(ChatReply::Complete(ChatResponse {
            content: wire.content(),
            usage,
        }))
    }
}

struct LineDecoder<S> {
    chunks: S,
    buffer: Vec<u8>,
    exhausted: bool,
}

/// Splits a byte stream into newline-delimited JSON parts.
///
/// Lines may span chunk boundaries. A malformed line yields [`ChatError::Decode`] and
/// decoding continues with the next line; a transport error ends the stream.
pub fn decode_parts<S, B>(chunks: S) -> ChatStream
where
    S: Stream<Item = Result<B, ChatError>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let decoder = LineDecoder {
        chunks,
        buffer: Vec::new(),
        exhausted: false,
    };

    Box::pin(stream::unfold(decoder, |mut decoder| async move {
        loop {
            if let Some(pos) = decoder.buffer.iter().position(|b| *b == b'\n') {
                let line: Vec<u8> = decoder.buffer.drain(..=pos).collect();
                if line.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
                return Some((parse_part(&line), decoder));
            }

            if decoder.exhausted {
                if decoder.buffer.iter().all(u8::is_ascii_whitespace) {
                    return None;
                }
                let rest = std::mem::take(&mut decoder.buffer);
                return Some((parse_part(&rest), decoder));
            }

            match decoder.chunks.next().await {
                Some(Ok(chunk)) => decoder.buffer.extend_from_slice(chunk.as_ref()),
                Some(Err(e)) => {
                    decoder.exhausted = true;
                    decoder.buffer.clear();
                    return Some((Err(e), decoder));
                }
                None => decoder.exhausted = true,
            }
        }
    }))
}

fn parse_part(line: &[u8]) -> Result<ChatResponsePart, ChatError> {
    let wire: WireChatResponse =
        serde_json::from_slice(line).map_err(|e| ChatError::Decode(e.to_string()))?;
    if let Some(message) = &wire.error {
        return Err(ChatError::Upstream(message.clone()));
    }
    Ok(ChatResponsePart {
        content: wire.content(),
        done: wire.done,
        usage: if wire.done { wire.usage() } else { None },
    })
}
