//! History of multi-model fan-out sessions.
//!
//! Entries expire after seven days and at most [`MULTI_HISTORY_LIMIT`] are
//! kept. Both rules are applied on every write, never on read.

use crate::persist;
use qcore::{Error, MultiModelSession, Result, Storage};
use std::time::Duration;

/// Storage key of the history.
pub const MULTI_HISTORY_KEY: &str = "multiModelHistory";

/// Maximum number of kept entries.
pub const MULTI_HISTORY_LIMIT: usize = 30;

/// Age after which an entry is pruned.
pub const MULTI_HISTORY_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const GET: &str = "getMultiModelHistory";
const SAVE: &str = "saveMultiModelHistory";

/// Persisted multi-model sessions, newest first.
#[derive(Clone)]
pub struct MultiModelHistory<S: Storage> {
    storage: S,
}

impl<S: Storage> MultiModelHistory<S> {
    /// Create a history over `storage`.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Insert or replace a session, then prune.
    pub async fn save(&self, session: &MultiModelSession) -> Result<()> {
        let mut entries = self.list().await?;
        entries.retain(|e| e.session_id != session.session_id);
        entries.push(session.clone());
        prune(&mut entries, qcore::now_millis());
        persist::save(&self.storage, MULTI_HISTORY_KEY, &entries, SAVE).await
    }

    /// Every stored session, newest first.
    pub async fn list(&self) -> Result<Vec<MultiModelSession>> {
        let mut entries: Vec<MultiModelSession> =
            persist::load(&self.storage, MULTI_HISTORY_KEY, GET).await?;
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }

    /// One session by id.
    pub async fn get(&self, session_id: &str) -> Result<MultiModelSession> {
        self.list()
            .await?
            .into_iter()
            .find(|e| e.session_id == session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_owned()))
    }

    /// Delete one session, then prune.
    pub async fn delete(&self, session_id: &str) -> Result<()> {
        let mut entries = self.list().await?;
        let before = entries.len();
        entries.retain(|e| e.session_id != session_id);
        if entries.len() == before {
            return Err(Error::SessionNotFound(session_id.to_owned()));
        }
        prune(&mut entries, qcore::now_millis());
        persist::save(&self.storage, MULTI_HISTORY_KEY, &entries, SAVE).await
    }

    /// Drop the whole history.
    pub async fn clear(&self) -> Result<()> {
        persist::remove(&self.storage, MULTI_HISTORY_KEY, "clearMultiModelHistory").await
    }
}

/// Drop expired entries and keep the newest [`MULTI_HISTORY_LIMIT`].
fn prune(entries: &mut Vec<MultiModelSession>, now: i64) {
    let cutoff = now - MULTI_HISTORY_TTL.as_millis() as i64;
    let before = entries.len();
    entries.retain(|e| e.timestamp >= cutoff);
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    entries.truncate(MULTI_HISTORY_LIMIT);
    if entries.len() < before {
        tracing::debug!(pruned = before - entries.len(), "multi-model history pruned");
    }
}
