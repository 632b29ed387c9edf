//! Request executor.
//!
//! Executes exactly one chat completion call for one [`ModelConfig`]: one
//! call in, one classified outcome out. Retries belong to the caller. The
//! request timer and the response body are dropped on every exit path.

use crate::{adapter::Adapter, provider::validate, sse};
use futures_core::Stream;
use qcore::{ChatMessage, Completion, Delta, Error, ModelConfig, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::{pin::Pin, time::Duration};

/// Request budget applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A boxed stream of normalized deltas.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<Delta>> + Send>>;

/// HTTP executor shared by every provider.
#[derive(Clone, Debug)]
pub struct Executor {
    client: Client,
    timeout: Duration,
}

impl Executor {
    /// Create an executor with the default 30s budget.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the request budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The request budget.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run a blocking completion.
    ///
    /// The budget covers the whole call, from connect to the last body byte.
    pub async fn complete(&self, config: &ModelConfig, messages: &[ChatMessage]) -> Result<Completion> {
        let request = self.prepare(config, messages, false)?;
        let raw = tokio::time::timeout(self.timeout, async {
            let response = request.send().await.map_err(|e| self.transport(e))?;
            let response = check_status(response).await?;
            response.bytes().await.map_err(|e| self.transport(e))
        })
        .await
        .map_err(|_| Error::Timeout(self.timeout))??;

        tracing::trace!("response: {}", String::from_utf8_lossy(&raw));
        parse_completion(&raw)
    }

    /// Open a streamed completion.
    ///
    /// The budget covers the request until the response headers arrive; the
    /// returned stream then runs until `[DONE]`, the end of the body, or the
    /// caller drops it.
    pub async fn stream(&self, config: &ModelConfig, messages: &[ChatMessage]) -> Result<DeltaStream> {
        let request = self.prepare(config, messages, true)?;
        let response = tokio::time::timeout(self.timeout, async {
            let response = request.send().await.map_err(|e| self.transport(e))?;
            check_status(response).await
        })
        .await
        .map_err(|_| Error::Timeout(self.timeout))??;

        Ok(Box::pin(sse::deltas(response.bytes_stream())))
    }

    fn prepare(&self, config: &ModelConfig, messages: &[ChatMessage], stream: bool) -> Result<RequestBuilder> {
        if messages.is_empty() {
            return Err(Error::invalid_input("messages must not be empty"));
        }
        let provider = validate(config)?;
        let url = provider.build_url(config)?;
        let headers = provider.build_headers(config)?;
        let mut body = provider.build_body(messages, config);
        if stream {
            body.insert("stream".into(), Value::Bool(true));
        }

        tracing::debug!(model = %config.id, provider = provider.name(), stream, "sending request");
        if let Ok(text) = serde_json::to_string(&body) {
            tracing::trace!("request: {text}");
        }
        Ok(self.client.post(url).headers(headers).json(&body))
    }

    fn transport(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout(self.timeout)
        } else if e.is_decode() {
            Error::InvalidResponse(e.to_string())
        } else {
            Error::Network(e.to_string())
        }
    }
}

/// Classify a non-2xx response, passing successful ones through.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let message = error_message(&text).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_owned()
    });
    tracing::debug!(status = status.as_u16(), %message, "provider returned an error");
    Err(Error::from_status(status.as_u16(), message))
}

/// The provider message from a JSON error envelope, if the body has one.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let message = match value.get("error") {
        Some(Value::String(message)) => message.as_str(),
        Some(error) => error.get("message")?.as_str()?,
        None => value.get("message")?.as_str()?,
    };
    Some(message.to_owned())
}

/// Extract the answer from a blocking completion body.
///
/// `choices` must be a non-empty array whose first entry has a string
/// `message.content`. `message.reasoning_content` is returned when present.
pub fn parse_completion(raw: &[u8]) -> Result<Completion> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|e| Error::InvalidResponse(format!("response is not JSON: {e}")))?;
    let choices = value
        .get("choices")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::InvalidResponse("response has no choices array".into()))?;
    let message = choices
        .first()
        .ok_or_else(|| Error::InvalidResponse("response choices are empty".into()))?
        .get("message");
    let content = message
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidResponse("choices[0].message.content is not a string".into()))?;
    let reasoning = message
        .and_then(|m| m.get("reasoning_content"))
        .and_then(Value::as_str)
        .filter(|r| !r.is_empty())
        .map(ToOwned::to_owned);
    Ok(Completion {
        content: content.to_owned(),
        reasoning,
    })
}
