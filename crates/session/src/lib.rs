//! Session and history persistence.
//!
//! [`SessionStore`] owns the session list and writes the current-session
//! pointer through an explicit [`SessionHandle`]. [`ChatLog`] and
//! [`MultiModelHistory`] keep the bounded side histories. All of them sit
//! on a [`qcore::Storage`] backend and wrap its failures into
//! [`qcore::Error::Storage`]; domain errors pass through untouched.

pub use {
    chat_log::{CHAT_LOG_KEY, CHAT_LOG_LIMIT, ChatLog, ChatLogEntry},
    handle::SessionHandle,
    multi::{MULTI_HISTORY_KEY, MULTI_HISTORY_LIMIT, MULTI_HISTORY_TTL, MultiModelHistory},
    store::{MAX_SESSIONS, SESSIONS_KEY, SessionStore},
};

mod chat_log;
mod handle;
mod multi;
mod persist;
mod store;
