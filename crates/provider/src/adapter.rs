//! The adapter capability set and the request pieces every adapter shares.
//!
//! An adapter turns a [`ModelConfig`] and a message list into the three
//! parts of an HTTP request: URL, headers and JSON body. All three are pure.
//! The same inputs always produce the same output, with no network or
//! storage access.

use qcore::{ApiFormat, ChatMessage, ContentPart, Error, ModelConfig, Result};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};
use url::Url;

/// Azure API version used when the config leaves it blank.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-15-preview";

/// Completions path for OpenAI-style endpoints.
pub const COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Body keys a `bodyTemplate` is not allowed to overwrite.
pub const RESERVED_BODY_KEYS: [&str; 2] = ["messages", "stream"];

/// Default `max_tokens` / `max_completion_tokens`.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Default nucleus sampling.
pub const DEFAULT_TOP_P: f64 = 0.95;

/// Provider-specific request construction.
///
/// Implementors supply the generation parameters; URL, headers and body
/// assembly default to the shared OpenAI-style conventions and can be
/// overridden per provider.
pub trait Adapter {
    /// Provider-specific generation parameters, with defaults filled in.
    fn generation_params(&self, config: &ModelConfig) -> Map<String, Value>;

    /// Provider-specific headers, added after authentication and before
    /// the user's header overrides.
    fn provider_headers(&self, _config: &ModelConfig, _headers: &mut HeaderMap) -> Result<()> {
        Ok(())
    }

    /// The full request URL, including query parameters.
    fn build_url(&self, config: &ModelConfig) -> Result<String> {
        endpoint_url(config)
    }

    /// The request headers.
    fn build_headers(&self, config: &ModelConfig) -> Result<HeaderMap> {
        let mut headers = auth_headers(config)?;
        self.provider_headers(config, &mut headers)?;
        if let Some(overrides) = &config.request_config {
            for (name, value) in &overrides.headers {
                headers.insert(header_name(name)?, header_value(name, value)?);
            }
        }
        Ok(headers)
    }

    /// The JSON request body, without the `stream` flag.
    fn build_body(&self, messages: &[ChatMessage], config: &ModelConfig) -> Map<String, Value> {
        let mut body = Map::new();
        if config.api_format != ApiFormat::Azure {
            body.insert("model".into(), config.upstream_model().into());
        }
        body.insert(
            "messages".into(),
            Value::Array(messages.iter().map(wire_message).collect()),
        );
        body.extend(self.generation_params(config));
        if !config.stop.is_empty() {
            body.insert("stop".into(), config.stop.clone().into());
        }
        apply_body_template(&mut body, config);
        body
    }
}

/// Compose the endpoint URL for the config's API format and append the
/// user's extra query parameters.
pub fn endpoint_url(config: &ModelConfig) -> Result<String> {
    let base = config.endpoint.trim().trim_end_matches('/');
    let mut query = Vec::new();
    let raw = match config.api_format {
        ApiFormat::Azure => {
            let deployment = config.deployment_name.as_deref().unwrap_or_default();
            let version = config
                .api_version
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(DEFAULT_AZURE_API_VERSION);
            query.push(("api-version", version));
            format!("{base}/openai/deployments/{deployment}/chat/completions")
        }
        ApiFormat::OpenAI => format!("{base}{COMPLETIONS_PATH}"),
        ApiFormat::Custom => {
            let path = config
                .api_path
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .unwrap_or(COMPLETIONS_PATH);
            if path.starts_with('/') {
                format!("{base}{path}")
            } else {
                format!("{base}/{path}")
            }
        }
    };

    if let Some(overrides) = &config.request_config {
        query.extend(overrides.params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }

    let mut url = Url::parse(&raw)
        .map_err(|e| Error::config(format!("invalid endpoint '{}': {e}", config.endpoint)))?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url.into())
}

/// Content type plus the authentication header for the API format.
pub fn auth_headers(config: &ModelConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    match config.api_format {
        ApiFormat::Azure => {
            headers.insert("api-key", header_value("api-key", config.api_key.trim())?);
        }
        ApiFormat::OpenAI | ApiFormat::Custom => {
            let bearer = format!("Bearer {}", config.api_key.trim());
            headers.insert(header::AUTHORIZATION, header_value("authorization", &bearer)?);
        }
    }
    Ok(headers)
}

/// Shallow-merge `requestConfig.bodyTemplate` onto the body, later-wins,
/// except for [`RESERVED_BODY_KEYS`].
pub fn apply_body_template(body: &mut Map<String, Value>, config: &ModelConfig) {
    let Some(overrides) = &config.request_config else {
        return;
    };
    for (key, value) in &overrides.body_template {
        if RESERVED_BODY_KEYS.contains(&key.as_str()) {
            tracing::warn!(model = %config.id, key = %key, "ignoring reserved body template key");
            continue;
        }
        body.insert(key.clone(), value.clone());
    }
}

/// The OpenAI wire form of a message. A lone text part is sent as a plain
/// string, anything else as a list of typed parts.
pub fn wire_message(message: &ChatMessage) -> Value {
    let content = match message.content.as_slice() {
        [ContentPart::Text { text }] => Value::String(text.clone()),
        parts => Value::Array(parts.iter().map(wire_part).collect()),
    };
    let mut wire = Map::new();
    wire.insert("role".into(), role_str(message).into());
    wire.insert("content".into(), content);
    Value::Object(wire)
}

fn wire_part(part: &ContentPart) -> Value {
    let mut wire = Map::new();
    match part {
        ContentPart::Text { text } => {
            wire.insert("type".into(), "text".into());
            wire.insert("text".into(), text.clone().into());
        }
        ContentPart::ImageUrl { image_url } => {
            wire.insert("type".into(), "image_url".into());
            wire.insert("image_url".into(), attachment(&image_url.url, &image_url.detail));
        }
        ContentPart::File { file } => {
            wire.insert("type".into(), "file".into());
            wire.insert("file".into(), attachment(&file.url, &file.detail));
        }
    }
    Value::Object(wire)
}

fn attachment(url: &str, detail: &Option<String>) -> Value {
    let mut wire = Map::new();
    wire.insert("url".into(), url.into());
    if let Some(detail) = detail {
        wire.insert("detail".into(), detail.clone().into());
    }
    Value::Object(wire)
}

fn role_str(message: &ChatMessage) -> &'static str {
    match message.role {
        qcore::Role::User => "user",
        qcore::Role::Assistant => "assistant",
        qcore::Role::System => "system",
    }
}

fn header_name(name: &str) -> Result<HeaderName> {
    name.parse::<HeaderName>()
        .map_err(|e| Error::config(format!("invalid header name '{name}': {e}")))
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    value
        .parse::<HeaderValue>()
        .map_err(|e| Error::config(format!("invalid value for header '{name}': {e}")))
}
