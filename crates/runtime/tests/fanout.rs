//! Tests for multi-model fan-out.

use compact_str::CompactString;
use provider::{Client, Executor};
use qcore::{ApiFormat, ErrorKind, MemoryStorage, ModelConfig, ResponseStatus};
use quill_runtime::{MultiModelRetry, Runtime, RuntimeConfig, Settings, SingleModelRetry};
use session::SessionHandle;
use std::{io::Write, time::Duration};

fn custom(id: &str, endpoint: &str, path: &str) -> ModelConfig {
    let mut config = ModelConfig::new(id, "deepseek", endpoint, "sk-test");
    config.api_format = ApiFormat::Custom;
    config.api_path = Some(path.into());
    config
}

fn runtime(models: Vec<ModelConfig>) -> Runtime<Settings, MemoryStorage> {
    let settings = Settings {
        default_model: None,
        models,
        runtime: RuntimeConfig::default(),
    };
    let single = SingleModelRetry {
        max_attempts: 3,
        base_delay_ms: 1,
        max_delay_ms: 4,
    };
    let multi = MultiModelRetry {
        retries: 1,
        delay_ms: 1,
    };
    Runtime::new(
        settings,
        MemoryStorage::new(),
        SessionHandle::new(),
        Executor::new(Client::new()),
    )
    .with_retry(single, multi)
}

#[tokio::test]
async fn every_branch_settles() {
    let mut server = mockito::Server::new_async().await;
    let good = server
        .mock("POST", "/good")
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"content":"fine"}}]}"#)
        .expect(1)
        .create_async()
        .await;
    let bad = server
        .mock("POST", "/bad")
        .with_status(500)
        .with_body(r#"{"error":{"message":"melted"}}"#)
        .expect(2)
        .create_async()
        .await;

    let url = server.url();
    let rt = runtime(vec![custom("good", &url, "/good"), custom("bad", &url, "/bad")]);
    let ids: Vec<CompactString> = vec!["good".into(), "ghost".into(), "bad".into()];
    let session = rt.multi_chat("Compare", &ids).await.unwrap();
    good.assert_async().await;
    bad.assert_async().await;

    assert_eq!(session.selected_models, ids);
    assert_eq!(session.question.text(), "Compare");
    let responses = &session.model_responses;
    assert_eq!(responses.len(), 3);

    assert_eq!(responses[0].model_id, "good");
    assert_eq!(responses[0].status, ResponseStatus::Success);
    assert_eq!(responses[0].response.text(), "fine");
    assert!(responses[0].error.is_none());

    assert_eq!(responses[1].model_id, "ghost");
    assert_eq!(responses[1].status, ResponseStatus::Error);
    assert_eq!(responses[1].error.as_deref(), Some("model not found"));

    assert_eq!(responses[2].model_id, "bad");
    assert_eq!(responses[2].status, ResponseStatus::Error);
    assert!(responses[2].error.as_deref().unwrap().contains("melted"));

    let saved = rt.history().get(&session.session_id).await.unwrap();
    assert_eq!(saved, session);
    assert!(rt.sessions().current().is_none());
}

#[tokio::test]
async fn history_tracks_branches_as_they_settle() {
    let mut fast_server = mockito::Server::new_async().await;
    fast_server
        .mock("POST", "/fast")
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"content":"quick"}}]}"#)
        .create_async()
        .await;
    let mut slow_server = mockito::Server::new_async().await;
    slow_server
        .mock("POST", "/slow")
        .with_status(200)
        .with_chunked_body(|w| {
            std::thread::sleep(Duration::from_millis(1500));
            w.write_all(br#"{"choices":[{"message":{"content":"late"}}]}"#)
        })
        .create_async()
        .await;

    let mut slow = custom("slow", &slow_server.url(), "/slow");
    slow.name = "Slow model".into();
    let rt = runtime(vec![
        custom("fast", &fast_server.url(), "/fast"),
        slow,
    ]);
    let ids: Vec<CompactString> = vec!["fast".into(), "slow".into()];
    let peek = async {
        tokio::time::sleep(Duration::from_millis(700)).await;
        rt.history().list().await.unwrap()
    };
    let (session, midway) = tokio::join!(rt.multi_chat("Race", &ids), peek);
    let session = session.unwrap();

    assert_eq!(midway.len(), 1);
    let partial = &midway[0];
    assert_eq!(partial.session_id, session.session_id);
    assert_eq!(partial.model_responses.len(), 2);
    assert_eq!(partial.model_responses[0].status, ResponseStatus::Success);
    assert_eq!(partial.model_responses[0].response.text(), "quick");
    assert_eq!(partial.model_responses[1].status, ResponseStatus::Pending);
    assert_eq!(partial.model_responses[1].model_name, "Slow model");

    let saved = rt.history().get(&session.session_id).await.unwrap();
    assert_eq!(saved.model_responses[1].status, ResponseStatus::Success);
    assert_eq!(saved.model_responses[1].response.text(), "late");
    assert_eq!(rt.history().list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_branch_config_fails_without_a_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("POST", "/keyless").expect(0).create_async().await;

    let mut keyless = custom("keyless", &server.url(), "/keyless");
    keyless.api_key.clear();
    let rt = runtime(vec![keyless]);
    let session = rt.multi_chat("Hi", &[CompactString::from("keyless")]).await.unwrap();
    mock.assert_async().await;

    let response = &session.model_responses[0];
    assert_eq!(response.status, ResponseStatus::Error);
    assert!(response.error.as_deref().unwrap().contains("API key"));
}

#[tokio::test]
async fn rejects_empty_requests() {
    let rt = runtime(Vec::new());
    let err = rt.multi_chat("Hi", &[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    let err = rt.multi_chat("  ", &[CompactString::from("m1")]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(rt.history().list().await.unwrap().is_empty());
}
