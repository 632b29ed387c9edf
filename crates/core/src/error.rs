//! Error taxonomy shared by the adapter registry, executor, orchestration
//! and session store.

use std::time::Duration;
use thiserror::Error;

/// Result alias used across the quill crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the core can surface.
///
/// Display strings are the human-readable messages shown at the UI
/// boundary, so they describe the root cause rather than the variant.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid model setup. User-fixable.
    #[error("{0}")]
    Configuration(String),

    /// Empty messages, ids or content. A caller bug.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// 401/403 from the provider.
    #[error("API key invalid or unauthorized ({status}): {message}")]
    Authentication { status: u16, message: String },

    /// 429 from the provider.
    #[error("rate limited by the provider, please retry later: {message}")]
    RateLimit { message: String },

    /// 5xx from the provider.
    #[error("provider server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The request exceeded its time budget.
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The provider answered 2xx with a payload we cannot use.
    #[error("provider returned an invalid response: {0}")]
    InvalidResponse(String),

    /// Any other non-2xx status.
    #[error("API request failed ({status}): {message}")]
    ApiCall { status: u16, message: String },

    /// The request never produced a status (DNS, connect, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The consumer went away before the request finished.
    #[error("request cancelled: {0}")]
    Cancelled(String),

    /// No session with the given id.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// The persisted session list is full.
    #[error("session limit exceeded: at most {0} sessions can be kept")]
    SessionLimitExceeded(usize),

    /// Empty id or title passed to the session store.
    #[error("invalid session data: {0}")]
    InvalidSessionData(String),

    /// Unexpected persistence failure.
    #[error("storage operation '{operation}' failed: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

/// Fieldless error classification for logging and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    InvalidInput,
    Authentication,
    RateLimit,
    Server,
    Timeout,
    InvalidResponse,
    ApiCall,
    Network,
    Cancelled,
    SessionNotFound,
    SessionLimitExceeded,
    InvalidSessionData,
    Storage,
}

impl Error {
    /// Shorthand for a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Shorthand for an invalid-input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Wrap an unexpected persistence failure.
    pub fn storage(operation: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Storage {
            operation,
            source: source.into(),
        }
    }

    /// Classify an HTTP failure status with the provider's message.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Authentication { status, message },
            429 => Self::RateLimit { message },
            500..=599 => Self::Server { status, message },
            _ => Self::ApiCall { status, message },
        }
    }

    /// The classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::RateLimit { .. } => ErrorKind::RateLimit,
            Self::Server { .. } => ErrorKind::Server,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::InvalidResponse(_) => ErrorKind::InvalidResponse,
            Self::ApiCall { .. } => ErrorKind::ApiCall,
            Self::Network(_) => ErrorKind::Network,
            Self::Cancelled(_) => ErrorKind::Cancelled,
            Self::SessionNotFound(_) => ErrorKind::SessionNotFound,
            Self::SessionLimitExceeded(_) => ErrorKind::SessionLimitExceeded,
            Self::InvalidSessionData(_) => ErrorKind::InvalidSessionData,
            Self::Storage { .. } => ErrorKind::Storage,
        }
    }

    /// Whether the orchestration layer may retry the call that failed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::RateLimit
                | ErrorKind::Server
                | ErrorKind::Timeout
                | ErrorKind::InvalidResponse
                | ErrorKind::Network
        )
    }

    /// Single-line message for the UI boundary.
    pub fn user_message(&self) -> String {
        self.to_string()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}
