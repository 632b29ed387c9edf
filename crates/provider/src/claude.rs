//! Claude through its OpenAI-compatible chat completions endpoint.

use crate::{adapter::Adapter, openai::sampling_params};
use qcore::ModelConfig;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{Map, Value};

/// The Anthropic API version header value.
const API_VERSION: &str = "2023-06-01";

/// Claude models.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Claude;

impl Adapter for Claude {
    fn generation_params(&self, config: &ModelConfig) -> Map<String, Value> {
        sampling_params(config)
    }

    fn provider_headers(&self, _config: &ModelConfig, headers: &mut HeaderMap) -> qcore::Result<()> {
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        Ok(())
    }
}
