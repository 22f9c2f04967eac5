//! Turns an aggregated document into a documentation request.

use tracing::info;

use crate::contract::{ChatError, ChatMessage, ChatReply, ChatRequest, ChatService};

/// Instruction placed in front of the aggregated document.
pub const DOCUMENT_PROMPT: &str = "Document the following code using JSDoc:\n ";

/// Builds the single user message sent to the model.
pub fn build_request(stream: bool, model: &str, contents: &str) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        stream,
        messages: vec![ChatMessage::user(format!("{DOCUMENT_PROMPT}{contents}"))],
    }
}

pub struct Chat<S> {
    service: S,
}

impl<S: ChatService> Chat<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    /// Asks the model to document `contents`.
    pub async fn talk(
        &self,
        stream: bool,
        model: &str,
        contents: &str,
    ) -> Result<ChatReply, ChatError> {
        info!(model, stream, chars = contents.len(), "Sending documentation request");
        self.service
            .chat(build_request(stream, model, contents))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{ChatResponse, MockChatService, TokenUsage};

    #[tokio::test]
    async fn talk_sends_prompt_prefixed_user_message() {
        let mut service = MockChatService::new();
        service
            .expect_chat()
            .withf(|req: &ChatRequest| {
                req.model == "testModel"
                    && req.stream
                    && req.messages
                        == vec![ChatMessage {
                            role: "user".to_string(),
                            content: "Document the following code using JSDoc:\n function example() {}"
                                .to_string(),
                        }]
            })
            .times(1)
            .returning(|_| {
                Ok(ChatReply::Complete(ChatResponse {
                    content: "documented".to_string(),
                    usage: TokenUsage::default(),
                }))
            });

        let chat = Chat::new(service);
        let reply = chat
            .talk(true, "testModel", "function example() {}")
            .await
            .expect("talk should succeed");

        match reply {
            ChatReply::Complete(response) => assert_eq!(response.content, "documented"),
            ChatReply::Streamed(_) => panic!("expected a complete reply"),
        }
    }

    #[tokio::test]
    async fn talk_propagates_service_errors() {
        let mut service = MockChatService::new();
        service
            .expect_chat()
            .returning(|_| Err(ChatError::Upstream("Chat failed".to_string())));

        let chat = Chat::new(service);
        let err = chat
            .talk(false, "testModel", "function example() {}")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Chat failed"), "got: {err}");
    }
}
