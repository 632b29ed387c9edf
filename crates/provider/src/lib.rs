//! Provider adapters and the request executor.
//!
//! [`Provider`] resolves a model key to an [`Adapter`], which builds the URL,
//! headers and body of a chat completion request. [`Executor`] performs the
//! call under a fixed budget and classifies the outcome into
//! [`qcore::Error`]. Streamed bodies are decoded by [`sse`].

pub use {
    adapter::{
        Adapter, COMPLETIONS_PATH, DEFAULT_AZURE_API_VERSION, DEFAULT_MAX_TOKENS,
        DEFAULT_TEMPERATURE, DEFAULT_TOP_P, RESERVED_BODY_KEYS,
    },
    claude::Claude,
    executor::{DEFAULT_TIMEOUT, DeltaStream, Executor, parse_completion},
    openai::{Compatible, Gpt, O1},
    provider::{Provider, validate},
    reqwest::Client,
};

mod adapter;
mod claude;
mod executor;
mod openai;
mod provider;
pub mod sse;
