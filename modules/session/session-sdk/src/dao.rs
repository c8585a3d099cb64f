//! Session storage SPI.

use async_trait::async_trait;
use security_core::SessionId;

use crate::error::SessionError;
use crate::session::Session;

/// Persistence for sessions. The manager never drops a session from memory on
/// its own; removal always goes through [`SessionDao::delete`].
#[async_trait]
pub trait SessionDao: Send + Sync {
    /// # Errors
    ///
    /// `Storage` when the store rejects the write.
    async fn create(&self, session: &Session) -> Result<(), SessionError>;

    /// # Errors
    ///
    /// `Storage` when the store cannot be read.
    async fn read(&self, id: SessionId) -> Result<Option<Session>, SessionError>;

    /// # Errors
    ///
    /// `Unknown` if the session is not stored, `Storage` on store failure.
    async fn update(&self, session: &Session) -> Result<(), SessionError>;

    /// Remove a session. Deleting an absent session is not an error.
    ///
    /// # Errors
    ///
    /// `Storage` on store failure.
    async fn delete(&self, id: SessionId) -> Result<(), SessionError>;

    /// Every stored session the validation sweep should look at.
    ///
    /// # Errors
    ///
    /// `Storage` when the store cannot be read.
    async fn active_sessions(&self) -> Result<Vec<Session>, SessionError>;
}
