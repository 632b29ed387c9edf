//! Core types for the quill chat backend.
//!
//! Holds the data model shared by every other crate (`ModelConfig`,
//! `ChatMessage`, `Message`, `Session`, multi-model records), the error
//! taxonomy, and the collaborator traits the core consumes: [`Storage`],
//! [`ConfigStore`] and [`Port`].

pub use {
    completion::{Completion, CompletionBuilder, Delta},
    config::{ApiFormat, ConfigStore, ModelConfig, RequestConfig},
    error::{Error, ErrorKind, Result},
    message::{Attachment, ChatMessage, ContentPart, Message, Role},
    port::{ChannelPort, Port, PortClosed, PortReceiver, StreamEvent, channel},
    session::{
        DEFAULT_SESSION_TITLE, ModelResponse, MultiModelSession, ResponseStatus, Session,
    },
    storage::{FileStorage, MemoryStorage, Storage},
};

mod completion;
mod config;
mod error;
mod message;
mod port;
mod session;
mod storage;

/// Current unix time in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a new unique, time-ordered identifier.
pub fn new_id() -> compact_str::CompactString {
    compact_str::CompactString::new(ulid::Ulid::new().to_string())
}
