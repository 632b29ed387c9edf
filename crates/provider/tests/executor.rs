//! Tests for the request executor against a local mock provider.

use futures_util::StreamExt;
use mockito::Matcher;
use qcore::{ChatMessage, Completion, Delta, Error, ErrorKind, ModelConfig};
use quill_provider::{Client, Executor};
use serde_json::json;
use std::time::Duration;

const PATH: &str = "/v1/chat/completions";

fn config(endpoint: &str) -> ModelConfig {
    ModelConfig::new("m1", "deepseek", endpoint, "sk-test")
}

fn hello() -> Vec<ChatMessage> {
    vec![ChatMessage::user("Hello")]
}

fn executor() -> Executor {
    Executor::new(Client::new())
}

#[tokio::test]
async fn complete_success() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJson(json!({
            "model": "deepseek",
            "messages": [{ "role": "user", "content": "Hello" }],
            "max_tokens": 4096,
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[{"message":{"content":"Hi there"}}]}"#)
        .create_async()
        .await;

    let completion = executor()
        .complete(&config(&server.url()), &hello())
        .await
        .unwrap();
    assert_eq!(completion, Completion::new("Hi there"));
    mock.assert_async().await;
}

#[tokio::test]
async fn complete_classifies_status() {
    let cases = [
        (401, ErrorKind::Authentication),
        (403, ErrorKind::Authentication),
        (429, ErrorKind::RateLimit),
        (500, ErrorKind::Server),
        (503, ErrorKind::Server),
        (400, ErrorKind::ApiCall),
    ];
    for (status, kind) in cases {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", PATH)
            .with_status(status)
            .with_body(r#"{"error":{"message":"provider says no"}}"#)
            .create_async()
            .await;

        let err = executor()
            .complete(&config(&server.url()), &hello())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), kind, "status: {status}");
        assert!(err.to_string().contains("provider says no"), "status: {status}");
    }
}

#[tokio::test]
async fn complete_falls_back_to_status_text() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", PATH)
        .with_status(502)
        .with_body("<html>bad gateway</html>")
        .create_async()
        .await;

    let err = executor()
        .complete(&config(&server.url()), &hello())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Server { status: 502, ref message } if message == "Bad Gateway"));
}

#[tokio::test]
async fn complete_rejects_missing_choices() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", PATH)
        .with_status(200)
        .with_body(r#"{"choices":[]}"#)
        .create_async()
        .await;

    let err = executor()
        .complete(&config(&server.url()), &hello())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidResponse);
}

#[tokio::test]
async fn empty_messages_fail_before_io() {
    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("POST", PATH).expect(0).create_async().await;

    let err = executor()
        .complete(&config(&server.url()), &[])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    mock.assert_async().await;
}

#[tokio::test]
async fn unknown_model_fails_before_io() {
    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("POST", PATH).expect(0).create_async().await;

    let mut config = config(&server.url());
    config.model = "unknown-model".into();
    let err = executor().complete(&config, &hello()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    mock.assert_async().await;
}

#[tokio::test]
async fn complete_times_out() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hold = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let executor = executor().with_timeout(Duration::from_millis(200));
    let err = executor
        .complete(&config(&format!("http://{addr}")), &hello())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout(d) if d == Duration::from_millis(200)));
    assert!(err.is_retryable());
    hold.abort();
}

#[tokio::test]
async fn connection_refused_is_network() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = executor()
        .complete(&config(&format!("http://{addr}")), &hello())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}

#[tokio::test]
async fn stream_yields_deltas() {
    let mut server = mockito::Server::new_async().await;
    let body = concat!(
        "data: {\"choices\":[{\"delta\":{\"reasoning_content\":\"hmm\"}}]}\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"He\"}}]}\n\n",
        "data: not-json\n\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"llo\"}}]}\n\n",
        "data: [DONE]\n\n",
    );
    let mock = server
        .mock("POST", PATH)
        .match_body(Matcher::PartialJson(json!({ "stream": true })))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let stream = executor()
        .stream(&config(&server.url()), &hello())
        .await
        .unwrap();
    let deltas: Vec<Delta> = stream.map(Result::unwrap).collect().await;
    assert_eq!(deltas.len(), 3);
    assert_eq!(deltas[0].reasoning, "hmm");
    let text: String = deltas.iter().map(|d| d.content.as_str()).collect();
    assert_eq!(text, "Hello");
    mock.assert_async().await;
}

#[tokio::test]
async fn stream_checks_status_before_reading() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", PATH)
        .with_status(429)
        .with_body(r#"{"error":{"message":"slow down"}}"#)
        .create_async()
        .await;

    let err = match executor().stream(&config(&server.url()), &hello()).await {
        Ok(_) => panic!("expected rate limit"),
        Err(err) => err,
    };
    assert_eq!(err.kind(), ErrorKind::RateLimit);
}
