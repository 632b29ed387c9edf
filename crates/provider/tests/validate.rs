//! Tests for model configuration validation.

use qcore::{ApiFormat, ErrorKind, ModelConfig};
use quill_provider::{Provider, validate};

#[test]
fn azure_requires_deployment() {
    let mut config = ModelConfig::new("m1", "gpt-4o", "https://res.openai.azure.com", "k");
    config.api_format = ApiFormat::Azure;
    config.deployment_name = Some(String::new());
    let err = validate(&config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);

    config.deployment_name = None;
    assert!(validate(&config).is_err());

    config.deployment_name = Some("gpt4o".into());
    assert!(matches!(validate(&config).unwrap(), Provider::Gpt(_)));
}

#[test]
fn blank_credentials() {
    let config = ModelConfig::new("m1", "deepseek", "https://api.deepseek.com", "  ");
    let err = validate(&config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("API key"));

    let config = ModelConfig::new("m1", "deepseek", "", "k");
    let err = validate(&config).unwrap_err();
    assert!(err.to_string().contains("endpoint"));
}

#[test]
fn unknown_kind_fails_first() {
    let config = ModelConfig::new("m1", "mystery", "", "");
    let err = validate(&config).unwrap_err();
    assert_eq!(err.to_string(), "unsupported model type: mystery");
}

#[test]
fn claude_rejects_azure_format() {
    let mut config = ModelConfig::new("c1", "claude-3-5-sonnet", "https://api.anthropic.com", "k");
    config.api_format = ApiFormat::Azure;
    config.deployment_name = Some("claude".into());
    let err = validate(&config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("Azure"));

    config.api_format = ApiFormat::OpenAI;
    assert!(matches!(validate(&config).unwrap(), Provider::Claude(_)));
}
