//! OpenAI-style adapters: the GPT-4o class, the o1 reasoning class, and
//! OpenAI-compatible backends (DeepSeek, Llama 3, Qwen 2, custom servers).

use crate::adapter::{Adapter, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, DEFAULT_TOP_P};
use qcore::ModelConfig;
use serde_json::{Map, Value};

/// GPT-4o class chat models.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Gpt;

impl Adapter for Gpt {
    fn generation_params(&self, config: &ModelConfig) -> Map<String, Value> {
        sampling_params(config)
    }
}

/// OpenAI-compatible servers speaking the chat completions protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Compatible;

impl Adapter for Compatible {
    fn generation_params(&self, config: &ModelConfig) -> Map<String, Value> {
        sampling_params(config)
    }
}

/// o1 reasoning models.
///
/// These take `max_completion_tokens` instead of `max_tokens`, only accept
/// the default temperature of 1.0, and reject the other sampling knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct O1;

impl Adapter for O1 {
    fn generation_params(&self, config: &ModelConfig) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert(
            "max_completion_tokens".into(),
            config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS).into(),
        );
        params.insert("temperature".into(), 1.0_f64.into());
        params
    }
}

/// `max_tokens`, temperature, top_p and penalties with defaults filled in.
pub(crate) fn sampling_params(config: &ModelConfig) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert(
        "max_tokens".into(),
        config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS).into(),
    );
    params.insert(
        "temperature".into(),
        config.temperature.unwrap_or(DEFAULT_TEMPERATURE).into(),
    );
    params.insert("top_p".into(), config.top_p.unwrap_or(DEFAULT_TOP_P).into());
    params.insert(
        "frequency_penalty".into(),
        config.frequency_penalty.unwrap_or_default().into(),
    );
    params.insert(
        "presence_penalty".into(),
        config.presence_penalty.unwrap_or_default().into(),
    );
    params
}
