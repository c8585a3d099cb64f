//! Error types for sessions.

use security_core::SessionId;
use thiserror::Error;

/// Session failures. `Stopped` and `Expired` both mean the session is no
/// longer usable; they are kept apart for diagnostics.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session {0} has been stopped")]
    Stopped(SessionId),

    #[error("session {0} has expired")]
    Expired(SessionId),

    #[error("no session with id {0}")]
    Unknown(SessionId),

    /// The session store failed.
    #[error("session storage failure: {0}")]
    Storage(String),
}

impl SessionError {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Stopped(_) => "stopped_session",
            Self::Expired(_) => "expired_session",
            Self::Unknown(_) => "unknown_session",
            Self::Storage(_) => "storage",
        }
    }

    /// Stopped or expired: the session exists but can no longer be used.
    #[must_use]
    pub fn is_invalid_session(&self) -> bool {
        matches!(self, Self::Stopped(_) | Self::Expired(_))
    }
}
