//! The typed UI entry point.
//!
//! Every UI request is `{type, operate, ...}` and every answer is either
//! `{data}` or `{error}`. This is the only place internal errors become
//! display strings; the error kind is kept for the log line.

use crate::{Operation, Runtime};
use compact_str::CompactString;
use qcore::{ConfigStore, Error, Result, Storage};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// `send` (single model) or `multi` (fan-out).
    Chat,
    /// Session management.
    Session,
    /// Quick text operations.
    Content,
}

/// Session arguments of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionArgs {
    /// Target session id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CompactString>,
    /// New title, for `rename`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A request from the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiRequest {
    /// Request family.
    #[serde(rename = "type")]
    pub kind: RequestKind,
    /// Operation within the family.
    pub operate: CompactString,
    /// Message or selected text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Session arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionArgs>,
    /// Target model ids for `multi`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<CompactString>,
    /// Target language for `translate`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl UiRequest {
    /// A request without arguments.
    pub fn new(kind: RequestKind, operate: impl Into<CompactString>) -> Self {
        Self {
            kind,
            operate: operate.into(),
            content: None,
            session: None,
            models: Vec::new(),
            language: None,
        }
    }

    /// Attach content.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Attach a session id.
    pub fn session_id(mut self, id: impl Into<CompactString>) -> Self {
        self.session.get_or_insert_with(SessionArgs::default).id = Some(id.into());
        self
    }

    /// Attach a session title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.session.get_or_insert_with(SessionArgs::default).title = Some(title.into());
        self
    }

    /// Attach target model ids.
    pub fn models(mut self, models: impl IntoIterator<Item = impl Into<CompactString>>) -> Self {
        self.models = models.into_iter().map(Into::into).collect();
        self
    }

    fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    fn id(&self) -> &str {
        self.session
            .as_ref()
            .and_then(|s| s.id.as_deref())
            .unwrap_or_default()
    }

    fn new_title(&self) -> &str {
        self.session
            .as_ref()
            .and_then(|s| s.title.as_deref())
            .unwrap_or_default()
    }
}

/// The answer to a [`UiRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UiResponse {
    /// Success payload.
    Data { data: Value },
    /// Single-line, human-readable failure.
    Error { error: String },
}

impl UiResponse {
    /// The payload, if the request succeeded.
    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Data { data } => Some(data),
            Self::Error { .. } => None,
        }
    }

    /// The error message, if the request failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Data { .. } => None,
            Self::Error { error } => Some(error),
        }
    }
}

/// A message received on a streaming port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRequest {
    /// The user's input.
    pub content: String,
}

impl<C: ConfigStore, S: Storage> Runtime<C, S> {
    /// Handle one UI request.
    pub async fn handle(&self, request: UiRequest) -> UiResponse {
        match self.dispatch(&request).await {
            Ok(data) => UiResponse::Data { data },
            Err(e) => {
                tracing::warn!(
                    kind = ?e.kind(),
                    request = ?request.kind,
                    operate = %request.operate,
                    "request failed: {e}"
                );
                UiResponse::Error {
                    error: e.user_message(),
                }
            }
        }
    }

    async fn dispatch(&self, request: &UiRequest) -> Result<Value> {
        let sessions = self.sessions();
        match (request.kind, request.operate.as_str()) {
            (RequestKind::Chat, "send") => encode(self.chat(request.text()).await?),
            (RequestKind::Chat, "multi") => {
                encode(self.multi_chat(request.text(), &request.models).await?)
            }
            (RequestKind::Session, "create") => encode(sessions.create().await?),
            (RequestKind::Session, "list") => encode(sessions.list().await?),
            (RequestKind::Session, "get") => encode(sessions.get(request.id()).await?),
            (RequestKind::Session, "messages") => encode(sessions.messages(request.id()).await?),
            (RequestKind::Session, "delete") => {
                sessions.delete(request.id()).await?;
                Ok(Value::Null)
            }
            (RequestKind::Session, "pin") => encode(sessions.toggle_pin(request.id()).await?),
            (RequestKind::Session, "rename") => {
                encode(sessions.rename(request.id(), request.new_title()).await?)
            }
            (RequestKind::Session, "switch") => encode(sessions.set_current(request.id()).await?),
            (RequestKind::Session, "current") => encode(sessions.current()),
            (RequestKind::Session, "clear") => {
                sessions.clear().await?;
                Ok(Value::Null)
            }
            (RequestKind::Content, name) => {
                let operation = Operation::parse(name)
                    .ok_or_else(|| Error::invalid_input(format!("unknown operation: {name}")))?;
                let answer = self
                    .quick(operation, request.text(), request.language.as_deref())
                    .await?;
                encode(answer)
            }
            (_, name) => Err(Error::invalid_input(format!("unknown operation: {name}"))),
        }
    }
}

fn encode<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::storage("encodeResponse", e))
}
