//! Model configuration and the configuration store interface.
//!
//! A [`ModelConfig`] is created and edited by the user in the settings UI,
//! persisted in synced configuration storage, and read-only to the core at
//! request time. Field names serialize as camelCase so stored blobs written
//! by the extension deserialize directly.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{collections::BTreeMap, future::Future};

/// Wire convention of the backend endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiFormat {
    /// Azure OpenAI deployments (`api-key` header, deployment path).
    Azure,
    /// OpenAI-style `/v1/chat/completions` with bearer auth.
    #[default]
    #[serde(rename = "openai")]
    OpenAI,
    /// OpenAI-style body on a user-supplied path.
    Custom,
}

/// User-supplied overrides applied after the provider defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestConfig {
    /// Extra headers; later-wins over the provider headers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Extra query parameters appended to the request URL.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
    /// Shallow merge patch applied on top of the built body.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub body_template: Map<String, Value>,
}

/// One configured backend.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelConfig {
    /// Unique id.
    pub id: CompactString,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Provider/model kind key, e.g. `gpt-4o`, `o1-mini`, `claude`, `deepseek`.
    pub model: CompactString,
    /// Endpoint convention.
    #[serde(default)]
    pub api_format: ApiFormat,
    /// API key.
    #[serde(default)]
    pub api_key: String,
    /// Base endpoint, without the completions path.
    #[serde(default)]
    pub endpoint: String,
    /// Azure deployment name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_name: Option<String>,
    /// Azure API version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    /// Completions path for `custom` endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_path: Option<String>,
    /// Model name sent in the body for non-Azure endpoints. Falls back to
    /// the deployment name, then to `model`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_model: Option<String>,
    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Completion token limit.
    #[serde(
        default,
        alias = "max_tokens",
        alias = "maxCompletionTokens",
        alias = "max_completion_tokens",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_tokens: Option<u32>,
    /// Nucleus sampling.
    #[serde(
        default,
        alias = "top_p",
        skip_serializing_if = "Option::is_none"
    )]
    pub top_p: Option<f64>,
    /// Frequency penalty.
    #[serde(
        default,
        alias = "frequency_penalty",
        skip_serializing_if = "Option::is_none"
    )]
    pub frequency_penalty: Option<f64>,
    /// Presence penalty.
    #[serde(
        default,
        alias = "presence_penalty",
        skip_serializing_if = "Option::is_none"
    )]
    pub presence_penalty: Option<f64>,
    /// Stop sequences.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
    /// Whether streamed chat turns read the answer incrementally. When off,
    /// the answer is fetched whole and posted as one chunk.
    #[serde(default = "default_stream")]
    pub stream: bool,
    /// Optional overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_config: Option<RequestConfig>,
}

impl ModelConfig {
    /// Create a config with the required identity and credentials; every
    /// optional field is unset.
    pub fn new(
        id: impl Into<CompactString>,
        model: impl Into<CompactString>,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            model: model.into(),
            api_format: ApiFormat::default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            deployment_name: None,
            api_version: None,
            api_path: None,
            upstream_model: None,
            temperature: None,
            max_tokens: None,
            top_p: None,
            frequency_penalty: None,
            presence_penalty: None,
            stop: Vec::new(),
            stream: true,
            request_config: None,
        }
    }

    /// Switch the config to an Azure deployment.
    pub fn azure(mut self, deployment: impl Into<String>, api_version: impl Into<String>) -> Self {
        self.api_format = ApiFormat::Azure;
        self.deployment_name = Some(deployment.into());
        self.api_version = Some(api_version.into());
        self
    }

    /// The model name to put in request bodies.
    pub fn upstream_model(&self) -> &str {
        self.upstream_model
            .as_deref()
            .or(self.deployment_name.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.model)
    }

    /// Human-readable name, falling back to the id.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

fn default_stream() -> bool {
    true
}

/// Source of configured models.
///
/// "Not configured" is an empty list or `None`, never an error, so callers
/// can produce their own configuration messages.
pub trait ConfigStore: Send + Sync {
    /// All configured models.
    fn models(&self) -> impl Future<Output = anyhow::Result<Vec<ModelConfig>>> + Send;

    /// The id of the default model, if one is selected.
    fn default_model_id(&self) -> impl Future<Output = anyhow::Result<Option<CompactString>>> + Send;
}
