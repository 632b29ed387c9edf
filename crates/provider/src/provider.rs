//! Provider registry.
//!
//! Unified `Provider` enum with enum dispatch over the concrete adapters.
//! [`Provider::resolve`] maps the `model` key of a config to a variant;
//! adding a provider means adding one variant here and one adapter.

use crate::{
    adapter::Adapter,
    claude::Claude,
    openai::{Compatible, Gpt, O1},
};
use qcore::{ApiFormat, ChatMessage, Error, ModelConfig, Result};
use reqwest::header::HeaderMap;
use serde_json::{Map, Value};

/// Model keys served by OpenAI-compatible backends.
const COMPATIBLE_KEYS: [&str; 4] = ["deepseek", "llama3", "qwen2", "custom"];

/// Unified provider adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// GPT-4o class models.
    Gpt(Gpt),
    /// o1 reasoning models.
    O1(O1),
    /// OpenAI-compatible backends.
    Compatible(Compatible),
    /// Claude models.
    Claude(Claude),
}

impl Provider {
    /// Resolve the adapter for a provider/model key.
    ///
    /// Fails with a configuration error for unknown keys, before any
    /// network I/O.
    pub fn resolve(key: &str) -> Result<Self> {
        let normalized = key.trim().to_ascii_lowercase();
        let k = normalized.as_str();
        let provider = if k.starts_with("o1") {
            Self::O1(O1)
        } else if k.starts_with("gpt-4") || k.starts_with("gpt-3.5") || k.starts_with("gpt-35") {
            Self::Gpt(Gpt)
        } else if k.starts_with("claude") {
            Self::Claude(Claude)
        } else if COMPATIBLE_KEYS.iter().any(|p| k.starts_with(p)) {
            Self::Compatible(Compatible)
        } else {
            return Err(Error::config(format!("unsupported model type: {key}")));
        };
        Ok(provider)
    }

    /// Short name of the adapter, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gpt(_) => "gpt",
            Self::O1(_) => "o1",
            Self::Compatible(_) => "openai-compatible",
            Self::Claude(_) => "claude",
        }
    }
}

impl Adapter for Provider {
    fn generation_params(&self, config: &ModelConfig) -> Map<String, Value> {
        match self {
            Self::Gpt(p) => p.generation_params(config),
            Self::O1(p) => p.generation_params(config),
            Self::Compatible(p) => p.generation_params(config),
            Self::Claude(p) => p.generation_params(config),
        }
    }

    fn provider_headers(&self, config: &ModelConfig, headers: &mut HeaderMap) -> Result<()> {
        match self {
            Self::Gpt(p) => p.provider_headers(config, headers),
            Self::O1(p) => p.provider_headers(config, headers),
            Self::Compatible(p) => p.provider_headers(config, headers),
            Self::Claude(p) => p.provider_headers(config, headers),
        }
    }

    fn build_url(&self, config: &ModelConfig) -> Result<String> {
        match self {
            Self::Gpt(p) => p.build_url(config),
            Self::O1(p) => p.build_url(config),
            Self::Compatible(p) => p.build_url(config),
            Self::Claude(p) => p.build_url(config),
        }
    }

    fn build_headers(&self, config: &ModelConfig) -> Result<HeaderMap> {
        match self {
            Self::Gpt(p) => p.build_headers(config),
            Self::O1(p) => p.build_headers(config),
            Self::Compatible(p) => p.build_headers(config),
            Self::Claude(p) => p.build_headers(config),
        }
    }

    fn build_body(&self, messages: &[ChatMessage], config: &ModelConfig) -> Map<String, Value> {
        match self {
            Self::Gpt(p) => p.build_body(messages, config),
            Self::O1(p) => p.build_body(messages, config),
            Self::Compatible(p) => p.build_body(messages, config),
            Self::Claude(p) => p.build_body(messages, config),
        }
    }
}

/// Validate a config before its first use and resolve its adapter.
///
/// Fails with a configuration error if the model kind is unknown, the API
/// key or endpoint is blank, an Azure config has no deployment name, or a
/// Claude config asks for the Azure format.
pub fn validate(config: &ModelConfig) -> Result<Provider> {
    let provider = Provider::resolve(&config.model)?;
    let name = config.display_name();
    if config.api_key.trim().is_empty() {
        return Err(Error::config(format!("API key is not set for model '{name}'")));
    }
    if config.endpoint.trim().is_empty() {
        return Err(Error::config(format!("endpoint is not set for model '{name}'")));
    }
    if config.api_format == ApiFormat::Azure
        && config
            .deployment_name
            .as_deref()
            .is_none_or(|d| d.trim().is_empty())
    {
        return Err(Error::config(format!(
            "deployment name is required for Azure model '{name}'"
        )));
    }
    if matches!(provider, Provider::Claude(_)) && config.api_format == ApiFormat::Azure {
        return Err(Error::config(format!(
            "Claude model '{name}' does not support the Azure API format"
        )));
    }
    Ok(provider)
}
