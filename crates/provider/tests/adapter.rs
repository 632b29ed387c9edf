//! Tests for provider resolution and request construction.

use qcore::{ChatMessage, ErrorKind, ModelConfig, RequestConfig};
use quill_provider::{Adapter, Provider};
use serde_json::json;

fn openai(model: &str) -> ModelConfig {
    ModelConfig::new("m1", model, "https://api.example.com", "sk-test")
}

fn azure(model: &str) -> ModelConfig {
    ModelConfig::new("m1", model, "https://res.openai.azure.com", "az-key")
        .azure("gpt4o-deploy", "2024-06-01")
}

fn messages() -> Vec<ChatMessage> {
    vec![ChatMessage::system("be brief"), ChatMessage::user("Hello")]
}

// --- resolution ---

#[test]
fn resolve_known_keys() {
    assert!(matches!(Provider::resolve("gpt-4o").unwrap(), Provider::Gpt(_)));
    assert!(matches!(Provider::resolve("o1-mini").unwrap(), Provider::O1(_)));
    assert!(matches!(Provider::resolve("claude").unwrap(), Provider::Claude(_)));
    for key in ["deepseek", "llama3", "qwen2", "custom", "DeepSeek-R1"] {
        assert!(
            matches!(Provider::resolve(key).unwrap(), Provider::Compatible(_)),
            "key: {key}"
        );
    }
}

#[test]
fn resolve_unknown_key() {
    let err = Provider::resolve("palm-2").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(err.to_string(), "unsupported model type: palm-2");
}

// --- url ---

#[test]
fn azure_url() {
    let config = azure("gpt-4o");
    let url = Provider::resolve("gpt-4o").unwrap().build_url(&config).unwrap();
    assert_eq!(
        url,
        "https://res.openai.azure.com/openai/deployments/gpt4o-deploy/chat/completions?api-version=2024-06-01"
    );
}

#[test]
fn openai_url_and_params() {
    let mut config = openai("deepseek");
    config.endpoint = "https://api.deepseek.com/".into();
    config.request_config = Some(RequestConfig {
        params: [("trace".to_owned(), "1".to_owned())].into(),
        ..Default::default()
    });
    let url = Provider::resolve("deepseek").unwrap().build_url(&config).unwrap();
    assert_eq!(url, "https://api.deepseek.com/v1/chat/completions?trace=1");
}

// --- headers ---

#[test]
fn azure_headers_use_api_key() {
    let headers = Provider::resolve("gpt-4o")
        .unwrap()
        .build_headers(&azure("gpt-4o"))
        .unwrap();
    assert_eq!(headers["content-type"], "application/json");
    assert_eq!(headers["api-key"], "az-key");
    assert!(headers.get("authorization").is_none());
}

#[test]
fn claude_headers_add_version() {
    let headers = Provider::resolve("claude")
        .unwrap()
        .build_headers(&openai("claude"))
        .unwrap();
    assert_eq!(headers["authorization"], "Bearer sk-test");
    assert_eq!(headers["anthropic-version"], "2023-06-01");
}

#[test]
fn header_overrides_win() {
    let mut config = openai("claude");
    config.request_config = Some(RequestConfig {
        headers: [
            ("anthropic-version".to_owned(), "2024-01-01".to_owned()),
            ("x-extra".to_owned(), "yes".to_owned()),
        ]
        .into(),
        ..Default::default()
    });
    let headers = Provider::resolve("claude").unwrap().build_headers(&config).unwrap();
    assert_eq!(headers["anthropic-version"], "2024-01-01");
    assert_eq!(headers["x-extra"], "yes");
}

// --- body ---

#[test]
fn body_defaults() {
    let body = Provider::resolve("gpt-4o")
        .unwrap()
        .build_body(&messages(), &openai("gpt-4o"));
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["max_tokens"], 4096);
    assert_eq!(body["temperature"], 0.7);
    assert_eq!(body["top_p"], 0.95);
    assert_eq!(body["frequency_penalty"], 0.0);
    assert_eq!(body["presence_penalty"], 0.0);
    assert_eq!(body["messages"][1], json!({ "role": "user", "content": "Hello" }));
    assert!(body.get("stream").is_none());
    assert!(body.get("stop").is_none());
}

#[test]
fn azure_body_has_no_model() {
    let body = Provider::resolve("gpt-4o")
        .unwrap()
        .build_body(&messages(), &azure("gpt-4o"));
    assert!(body.get("model").is_none());
}

#[test]
fn configured_values_replace_defaults() {
    let mut config = openai("qwen2");
    config.upstream_model = Some("qwen2-72b-instruct".into());
    config.temperature = Some(0.2);
    config.max_tokens = Some(512);
    config.stop = vec!["###".into()];
    let body = Provider::resolve("qwen2").unwrap().build_body(&messages(), &config);
    assert_eq!(body["model"], "qwen2-72b-instruct");
    assert_eq!(body["temperature"], 0.2);
    assert_eq!(body["max_tokens"], 512);
    assert_eq!(body["stop"], json!(["###"]));
}

#[test]
fn o1_forces_temperature() {
    let mut config = openai("o1-mini");
    config.temperature = Some(0.3);
    config.max_tokens = Some(1000);
    let body = Provider::resolve("o1-mini").unwrap().build_body(&messages(), &config);
    assert_eq!(body["temperature"], 1.0);
    assert_eq!(body["max_completion_tokens"], 1000);
    assert!(body.get("max_tokens").is_none());
    assert!(body.get("top_p").is_none());
}

#[test]
fn body_template_overrides_defaults() {
    let mut config = openai("gpt-4o");
    config.request_config = Some(RequestConfig {
        body_template: json!({ "max_tokens": 10, "user": "u1" })
            .as_object()
            .unwrap()
            .clone(),
        ..Default::default()
    });
    let body = Provider::resolve("gpt-4o").unwrap().build_body(&messages(), &config);
    assert_eq!(body["max_tokens"], 10);
    assert_eq!(body["user"], "u1");
}

#[test]
fn body_template_cannot_clobber_reserved_keys() {
    let mut config = openai("gpt-4o");
    config.request_config = Some(RequestConfig {
        body_template: json!({ "messages": [], "stream": true })
            .as_object()
            .unwrap()
            .clone(),
        ..Default::default()
    });
    let body = Provider::resolve("gpt-4o").unwrap().build_body(&messages(), &config);
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    assert!(body.get("stream").is_none());
}

#[test]
fn build_is_pure() {
    let mut config = azure("o1-preview");
    config.request_config = Some(RequestConfig {
        headers: [("x-a".to_owned(), "1".to_owned())].into(),
        params: [("p".to_owned(), "2".to_owned())].into(),
        body_template: json!({ "seed": 7 }).as_object().unwrap().clone(),
    });
    for key in ["gpt-4o", "o1-preview", "deepseek", "claude"] {
        let provider = Provider::resolve(key).unwrap();
        let first = (
            provider.build_url(&config).unwrap(),
            provider.build_headers(&config).unwrap(),
            serde_json::to_vec(&provider.build_body(&messages(), &config)).unwrap(),
        );
        let second = (
            provider.build_url(&config).unwrap(),
            provider.build_headers(&config).unwrap(),
            serde_json::to_vec(&provider.build_body(&messages(), &config)).unwrap(),
        );
        assert_eq!(first, second, "key: {key}");
    }
}
