use std::time::Duration;

use docbot_core::chat::{build_request, Chat};
use docbot_core::contract::{ChatError, ChatReply, ChatService, TokenUsage};
use docbot_core::ollama::OllamaClient;
use futures::StreamExt;
use mockito::Matcher;
use serde_json::json;

#[tokio::test]
async fn buffered_request_returns_complete_response_with_usage() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/chat")
        .match_body(Matcher::Json(json!({
            "model": "gemma2:2b",
            "stream": false,
            "messages": [{
                "role": "user",
                "content": "Document the following code using JSDoc:\n const a=1;"
            }]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "model": "gemma2:2b",
                "message": {"role": "assistant", "content": "/** a */"},
                "done": true,
                "prompt_eval_count": 21,
                "eval_count": 8
            })
            .to_string(),
        )
        .create_async()
        .await;

    let chat = Chat::new(OllamaClient::new(server.url()));
    let reply = chat.talk(false, "gemma2:2b", "const a=1;").await.unwrap();

    mock.assert_async().await;
    match reply {
        ChatReply::Complete(response) => {
            assert_eq!(response.content, "/** a */");
            assert_eq!(
                response.usage,
                TokenUsage {
                    prompt_tokens: 21,
                    completion_tokens: 8
                }
            );
            assert_eq!(response.usage.total_tokens(), 29);
        }
        ChatReply::Streamed(_) => panic!("expected a complete reply"),
    }
}

#[tokio::test]
async fn streamed_request_yields_parts_in_order() {
    let mut server = mockito::Server::new_async().await;
    let body = [
        json!({"message": {"role": "assistant", "content": "/**"}, "done": false}),
        json!({"message": {"role": "assistant", "content": " a"}, "done": false}),
        json!({"message": {"role": "assistant", "content": " */"}, "done": true,
               "prompt_eval_count": 4, "eval_count": 3}),
    ]
    .iter()
    .map(|v| v.to_string() + "\n")
    .collect::<String>();
    let mock = server
        .mock("POST", "/api/chat")
        .match_body(Matcher::PartialJson(json!({"stream": true})))
        .with_status(200)
        .with_header("content-type", "application/x-ndjson")
        .with_body(body)
        .create_async()
        .await;

    let client = OllamaClient::new(server.url());
    let reply = client
        .chat(build_request(true, "gemma2:2b", "const a=1;"))
        .await
        .unwrap();

    mock.assert_async().await;
    let ChatReply::Streamed(stream) = reply else {
        panic!("expected a streamed reply");
    };
    let parts: Vec<_> = stream.map(|p| p.expect("valid part")).collect().await;
    let text: String = parts.iter().map(|p| p.content.as_str()).collect();
    assert_eq!(text, "/** a */");
    assert_eq!(parts.iter().filter(|p| p.done).count(), 1);
    assert!(parts.last().unwrap().done);
    assert_eq!(
        parts.last().unwrap().usage,
        Some(TokenUsage {
            prompt_tokens: 4,
            completion_tokens: 3
        })
    );
}

#[tokio::test]
async fn error_status_is_reported_with_body() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/chat")
        .with_status(404)
        .with_body(r#"{"error":"model 'nope' not found"}"#)
        .create_async()
        .await;

    let client = OllamaClient::new(server.url());
    let err = client
        .chat(build_request(false, "nope", "x"))
        .await
        .unwrap_err();

    match err {
        ChatError::Status { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("not found"));
        }
        other => panic!("expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let client = OllamaClient::new("http://127.0.0.1:1");
    let err = client
        .chat(build_request(false, "gemma2:2b", "x"))
        .await
        .unwrap_err();

    assert!(matches!(err, ChatError::Transport(_)), "got {err:?}");
}

/// There is no client-side timeout: a server that accepts the connection and never
/// answers keeps the request pending. This documents the gap rather than closing it.
#[tokio::test]
async fn stalled_server_keeps_request_pending() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let holder = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(socket);
    });

    let client = OllamaClient::new(format!("http://{addr}"));
    let pending = tokio::time::timeout(
        Duration::from_millis(300),
        client.chat(build_request(false, "gemma2:2b", "x")),
    )
    .await;

    assert!(pending.is_err(), "request should still be pending");
    holder.abort();
}
