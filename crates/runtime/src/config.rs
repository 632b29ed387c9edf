//! Runtime configuration.
//!
//! [`Settings`] is loaded from TOML with `${ENV_VAR}` expansion and doubles
//! as a [`ConfigStore`]. [`SyncedSettings`] reads the same model list from
//! the synced storage area the settings UI writes to.

use crate::retry::{MultiModelRetry, SingleModelRetry};
use anyhow::Context;
use compact_str::CompactString;
use qcore::{ConfigStore, ModelConfig, Storage};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{path::Path, time::Duration};

/// Synced storage key of the model list.
pub const MODELS_KEY: &str = "models";

/// Synced storage key of the default model id.
pub const DEFAULT_MODEL_KEY: &str = "defaultModelId";

/// Top-level settings.
///
/// ```toml
/// default_model = "gpt4o"
///
/// [[models]]
/// id = "gpt4o"
/// model = "gpt-4o"
/// apiFormat = "azure"
/// apiKey = "${AZURE_OPENAI_KEY}"
/// endpoint = "https://example.openai.azure.com"
/// deploymentName = "gpt-4o"
///
/// [runtime]
/// request_timeout_secs = 30
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Id of the model used for single-model turns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<CompactString>,
    /// Configured models (`[[models]]` array).
    #[serde(default)]
    pub models: Vec<ModelConfig>,
    /// Timeouts and retry policies.
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Timeouts and retry policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Budget for one provider call.
    pub request_timeout_secs: u64,
    /// Single-model turn policy.
    pub single: SingleModelRetry,
    /// Multi-model branch policy.
    pub multi: MultiModelRetry,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            single: SingleModelRetry::default(),
            multi: MultiModelRetry::default(),
        }
    }
}

impl RuntimeConfig {
    /// The request budget as a duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Settings {
    /// Parse a TOML string, expanding `${ENV_VAR}` references first.
    pub fn from_toml(toml_str: &str) -> anyhow::Result<Self> {
        let expanded = expand_env_vars(toml_str);
        let settings: Self = toml::from_str(&expanded)?;
        Ok(settings)
    }

    /// Load settings from a file path.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Look up a model by id.
    pub fn model(&self, id: &str) -> Option<&ModelConfig> {
        self.models.iter().find(|m| m.id == id)
    }
}

impl ConfigStore for Settings {
    async fn models(&self) -> anyhow::Result<Vec<ModelConfig>> {
        Ok(self.models.clone())
    }

    async fn default_model_id(&self) -> anyhow::Result<Option<CompactString>> {
        Ok(self.default_model.clone())
    }
}

/// Model settings stored in the synced storage area.
#[derive(Debug, Clone)]
pub struct SyncedSettings<S: Storage> {
    storage: S,
}

impl<S: Storage> SyncedSettings<S> {
    /// Read settings from `storage`.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }
}

impl<S: Storage> ConfigStore for SyncedSettings<S> {
    async fn models(&self) -> anyhow::Result<Vec<ModelConfig>> {
        let mut items = self.storage.get(&[MODELS_KEY]).await?;
        match items.remove(MODELS_KEY) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value).context("invalid stored model list"),
        }
    }

    async fn default_model_id(&self) -> anyhow::Result<Option<CompactString>> {
        let mut items = self.storage.get(&[DEFAULT_MODEL_KEY]).await?;
        Ok(match items.remove(DEFAULT_MODEL_KEY) {
            Some(Value::String(id)) if !id.is_empty() => Some(id.into()),
            _ => None,
        })
    }
}

/// Substitute `${NAME}` references in settings text with values from the
/// process environment.
///
/// Unset variables become the empty string. A `${` with no closing brace is
/// kept as written.
pub fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(open) = rest.find("${") {
        let Some(len) = rest[open + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..open]);
        let name = &rest[open + 2..open + 2 + len];
        out.push_str(&std::env::var(name).unwrap_or_default());
        rest = &rest[open + 3 + len..];
    }
    out.push_str(rest);
    out
}
