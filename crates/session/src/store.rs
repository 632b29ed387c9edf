//! Persistent session list.
//!
//! Sessions live as one JSON list under [`SESSIONS_KEY`] in local storage.
//! Every mutation is a read-modify-write of that list; writes from this
//! store are serialized, writes from elsewhere are last-writer-wins.

use crate::{SessionHandle, persist};
use qcore::{Error, Message, Result, Session, Storage};
use std::{cmp::Ordering, sync::Arc};
use tokio::sync::Mutex;

/// Storage key of the session list.
pub const SESSIONS_KEY: &str = "chatSessions";

/// Maximum number of persisted sessions.
pub const MAX_SESSIONS: usize = 100;

const GET: &str = "getSessions";
const SAVE: &str = "saveSessions";
const CLEAR: &str = "clearSessions";

/// Session CRUD over a [`Storage`] backend.
#[derive(Clone)]
pub struct SessionStore<S: Storage> {
    storage: S,
    current: SessionHandle,
    write: Arc<Mutex<()>>,
}

impl<S: Storage> SessionStore<S> {
    /// Create a store writing through `current` for the current pointer.
    pub fn new(storage: S, current: SessionHandle) -> Self {
        Self {
            storage,
            current,
            write: Arc::new(Mutex::new(())),
        }
    }

    /// The current-session handle.
    pub fn handle(&self) -> &SessionHandle {
        &self.current
    }

    /// Create an empty session and make it current.
    ///
    /// Fails with [`Error::SessionLimitExceeded`] when the list is full.
    pub async fn create(&self) -> Result<Session> {
        let _guard = self.write.lock().await;
        let mut sessions = self.load().await?;
        if sessions.len() >= MAX_SESSIONS {
            return Err(Error::SessionLimitExceeded(MAX_SESSIONS));
        }
        let session = Session::new();
        sessions.insert(0, session.clone());
        self.save(&sessions).await?;
        self.current.set(session.clone());
        tracing::debug!(id = %session.id, "session created");
        Ok(session)
    }

    /// Return the current session, creating one if there is none.
    pub async fn ensure_current(&self) -> Result<Session> {
        match self.current.get() {
            Some(session) => Ok(session),
            None => self.create().await,
        }
    }

    /// Append a message to a session.
    ///
    /// A current session that is not persisted yet is inserted, subject to
    /// [`MAX_SESSIONS`]. Any other unknown id fails with
    /// [`Error::SessionNotFound`].
    pub async fn update(&self, id: &str, message: Message) -> Result<Session> {
        require(id, "session id")?;
        let _guard = self.write.lock().await;
        let mut sessions = self.load().await?;
        let session = match sessions.iter_mut().find(|s| s.id == id) {
            Some(session) => {
                session.push(message);
                session.clone()
            }
            None => {
                let Some(mut session) = self.current.get().filter(|s| s.id == id) else {
                    return Err(Error::SessionNotFound(id.to_owned()));
                };
                if sessions.len() >= MAX_SESSIONS {
                    return Err(Error::SessionLimitExceeded(MAX_SESSIONS));
                }
                tracing::debug!(id, "persisting untracked current session");
                session.push(message);
                sessions.insert(0, session.clone());
                session
            }
        };
        self.save(&sessions).await?;
        self.current.refresh(&session);
        Ok(session)
    }

    /// All sessions, pinned first, then most recently updated first.
    pub async fn list(&self) -> Result<Vec<Session>> {
        let mut sessions = self.load().await?;
        sessions.sort_by(order);
        Ok(sessions)
    }

    /// One session by id.
    pub async fn get(&self, id: &str) -> Result<Session> {
        require(id, "session id")?;
        self.load()
            .await?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::SessionNotFound(id.to_owned()))
    }

    /// The messages of one session.
    pub async fn messages(&self, id: &str) -> Result<Vec<Message>> {
        Ok(self.get(id).await?.messages)
    }

    /// Delete a session. Clears the current pointer if it pointed there.
    pub async fn delete(&self, id: &str) -> Result<()> {
        require(id, "session id")?;
        let _guard = self.write.lock().await;
        let mut sessions = self.load().await?;
        let before = sessions.len();
        sessions.retain(|s| s.id != id);
        if sessions.len() == before {
            return Err(Error::SessionNotFound(id.to_owned()));
        }
        self.save(&sessions).await?;
        if self.current.is_current(id) {
            self.current.clear();
        }
        tracing::debug!(id, "session deleted");
        Ok(())
    }

    /// Flip the pinned flag of a session.
    pub async fn toggle_pin(&self, id: &str) -> Result<Session> {
        require(id, "session id")?;
        self.modify(id, |session| session.is_pinned = !session.is_pinned)
            .await
    }

    /// Rename a session.
    pub async fn rename(&self, id: &str, title: &str) -> Result<Session> {
        require(id, "session id")?;
        let title = require(title, "session title")?.to_owned();
        self.modify(id, move |session| session.title = title).await
    }

    /// Make a persisted session current.
    pub async fn set_current(&self, id: &str) -> Result<Session> {
        let session = self.get(id).await?;
        self.current.set(session.clone());
        Ok(session)
    }

    /// The current session, if any.
    pub fn current(&self) -> Option<Session> {
        self.current.get()
    }

    /// Wipe every session and the current pointer.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write.lock().await;
        persist::remove(&self.storage, SESSIONS_KEY, CLEAR).await?;
        self.current.clear();
        tracing::debug!("sessions cleared");
        Ok(())
    }

    async fn modify(&self, id: &str, f: impl FnOnce(&mut Session)) -> Result<Session> {
        let _guard = self.write.lock().await;
        let mut sessions = self.load().await?;
        let session = sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::SessionNotFound(id.to_owned()))?;
        f(session);
        let session = session.clone();
        self.save(&sessions).await?;
        self.current.refresh(&session);
        Ok(session)
    }

    async fn load(&self) -> Result<Vec<Session>> {
        persist::load(&self.storage, SESSIONS_KEY, GET).await
    }

    async fn save(&self, sessions: &[Session]) -> Result<()> {
        persist::save(&self.storage, SESSIONS_KEY, sessions, SAVE).await
    }
}

fn require<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidSessionData(format!("{what} must not be empty")));
    }
    Ok(trimmed)
}

/// Pinned first, newest first, id as the tiebreak so the order is total.
fn order(a: &Session, b: &Session) -> Ordering {
    b.is_pinned
        .cmp(&a.is_pinned)
        .then_with(|| b.timestamp.cmp(&a.timestamp))
        .then_with(|| b.id.cmp(&a.id))
}
