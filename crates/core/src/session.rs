//! Conversation records: single-model sessions and multi-model fan-out
//! sessions.

use crate::{Message, Role};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Title given to sessions the user has not renamed.
pub const DEFAULT_SESSION_TITLE: &str = "新会话";

/// A persisted conversation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique, time-derived id.
    pub id: CompactString,
    /// User-editable title.
    pub title: String,
    /// Ordered messages.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Preview of the most recent message.
    #[serde(default)]
    pub last_message: String,
    /// Last update, unix milliseconds.
    pub timestamp: i64,
    /// Number of messages.
    #[serde(default)]
    pub messages_count: usize,
    /// Pinned sessions sort first.
    #[serde(default)]
    pub is_pinned: bool,
}

impl Session {
    /// Create an empty session with a fresh id.
    pub fn new() -> Self {
        Self {
            id: crate::new_id(),
            title: DEFAULT_SESSION_TITLE.to_owned(),
            messages: Vec::new(),
            last_message: String::new(),
            timestamp: crate::now_millis(),
            messages_count: 0,
            is_pinned: false,
        }
    }

    /// Append a message and refresh the preview, count and timestamp.
    pub fn push(&mut self, message: Message) {
        self.last_message = message.text().to_owned();
        self.messages.push(message);
        self.messages_count = self.messages.len();
        self.timestamp = crate::now_millis().max(self.timestamp);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Settlement state of one fan-out branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// Still in flight.
    Pending,
    /// Settled with a response.
    Success,
    /// Settled with an error.
    Error,
}

/// One model's answer within a multi-model session.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelResponse {
    /// The configured model id this branch targeted.
    pub model_id: CompactString,
    /// Display name of the model, or the id when unknown.
    pub model_name: String,
    /// The assistant message; empty until the branch succeeds.
    pub response: Message,
    /// Settlement state.
    pub status: ResponseStatus,
    /// Failure message when `status` is `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Last state change, unix milliseconds.
    pub timestamp: i64,
}

impl ModelResponse {
    /// A branch that has not settled yet.
    pub fn pending(model_id: impl Into<CompactString>, model_name: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            model_name: model_name.into(),
            response: Message::assistant("", None),
            status: ResponseStatus::Pending,
            error: None,
            timestamp: crate::now_millis(),
        }
    }

    /// Settle the branch with a response.
    pub fn succeed(&mut self, response: Message) {
        self.response = response;
        self.status = ResponseStatus::Success;
        self.error = None;
        self.timestamp = crate::now_millis();
    }

    /// Settle the branch with an error.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = ResponseStatus::Error;
        self.error = Some(error.into());
        self.timestamp = crate::now_millis();
    }
}

/// A question fanned out to several models.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiModelSession {
    /// Unique id.
    pub session_id: CompactString,
    /// The user's question.
    pub question: Message,
    /// One entry per selected model.
    pub model_responses: Vec<ModelResponse>,
    /// Creation time, unix milliseconds.
    pub timestamp: i64,
    /// The model ids the question was sent to.
    pub selected_models: Vec<CompactString>,
}

impl MultiModelSession {
    /// Start a fan-out session with one pending response per selected
    /// model, named after its id until the branch settles.
    pub fn new(question: Message, selected_models: Vec<CompactString>) -> Self {
        debug_assert_eq!(question.role(), Role::User);
        let model_responses = selected_models
            .iter()
            .map(|id| ModelResponse::pending(id.clone(), id.as_str()))
            .collect();
        Self {
            session_id: crate::new_id(),
            question,
            model_responses,
            timestamp: crate::now_millis(),
            selected_models,
        }
    }

    /// Branches that settled successfully.
    pub fn succeeded(&self) -> impl Iterator<Item = &ModelResponse> {
        self.model_responses
            .iter()
            .filter(|r| r.status == ResponseStatus::Success)
    }

    /// Branches that settled with an error.
    pub fn failed(&self) -> impl Iterator<Item = &ModelResponse> {
        self.model_responses
            .iter()
            .filter(|r| r.status == ResponseStatus::Error)
    }
}
