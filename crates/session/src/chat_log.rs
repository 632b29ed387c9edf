//! Flat chat log of recent single-model turns.

use crate::persist;
use qcore::{Result, Storage};
use serde::{Deserialize, Serialize};

/// Storage key of the log.
pub const CHAT_LOG_KEY: &str = "chatHistory";

/// Number of entries kept.
pub const CHAT_LOG_LIMIT: usize = 30;

/// One question/answer pair.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatLogEntry {
    /// What the user asked.
    pub question: String,
    /// What the model answered.
    pub answer: String,
    /// When the turn finished, unix milliseconds.
    pub timestamp: i64,
}

/// The last [`CHAT_LOG_LIMIT`] turns, oldest first.
#[derive(Clone)]
pub struct ChatLog<S: Storage> {
    storage: S,
}

impl<S: Storage> ChatLog<S> {
    /// Create a log over `storage`.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Append a turn, dropping the oldest entries past the limit.
    pub async fn append(&self, question: &str, answer: &str) -> Result<()> {
        let mut entries: Vec<ChatLogEntry> =
            persist::load(&self.storage, CHAT_LOG_KEY, "getChatHistory").await?;
        entries.push(ChatLogEntry {
            question: question.to_owned(),
            answer: answer.to_owned(),
            timestamp: qcore::now_millis(),
        });
        let excess = entries.len().saturating_sub(CHAT_LOG_LIMIT);
        entries.drain(..excess);
        persist::save(&self.storage, CHAT_LOG_KEY, &entries, "saveChatHistory").await
    }

    /// Every kept entry, oldest first.
    pub async fn entries(&self) -> Result<Vec<ChatLogEntry>> {
        persist::load(&self.storage, CHAT_LOG_KEY, "getChatHistory").await
    }

    /// Drop the whole log.
    pub async fn clear(&self) -> Result<()> {
        persist::remove(&self.storage, CHAT_LOG_KEY, "clearChatHistory").await
    }
}
