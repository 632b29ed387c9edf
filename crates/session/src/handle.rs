//! The current-session pointer.

use parking_lot::Mutex;
use qcore::Session;
use std::sync::Arc;

/// Shared handle to the session the user is currently chatting in.
///
/// Exactly one session is current at a time. Clones share the same slot.
/// Only the session store writes through it; everything else reads.
#[derive(Clone, Debug, Default)]
pub struct SessionHandle {
    slot: Arc<Mutex<Option<Session>>>,
}

impl SessionHandle {
    /// Create an empty handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current session.
    pub fn get(&self) -> Option<Session> {
        self.slot.lock().clone()
    }

    /// Id of the current session.
    pub fn id(&self) -> Option<compact_str::CompactString> {
        self.slot.lock().as_ref().map(|s| s.id.clone())
    }

    /// Whether `id` is the current session.
    pub fn is_current(&self, id: &str) -> bool {
        self.slot.lock().as_ref().is_some_and(|s| s.id == id)
    }

    /// Make `session` current.
    pub fn set(&self, session: Session) {
        *self.slot.lock() = Some(session);
    }

    /// Replace the current session only if it still has the same id.
    pub(crate) fn refresh(&self, session: &Session) {
        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|s| s.id == session.id) {
            *slot = Some(session.clone());
        }
    }

    /// Drop the current pointer.
    pub fn clear(&self) {
        *self.slot.lock() = None;
    }
}
