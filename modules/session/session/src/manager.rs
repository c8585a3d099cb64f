//! Session lifecycle.
//!
//! The manager owns every state transition: it loads a session from the DAO,
//! validates it against the clock, applies the change and writes it back.
//! Expiry found on access is persisted before the error is returned, so the
//! stored record keeps reporting `Expired` on later calls.

use std::sync::Arc;
use std::time::Duration;

use event_bus::EventBus;
use session_sdk::{Session, SessionDao, SessionError, SessionEvent, SessionId};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{DEFAULT_GLOBAL_TIMEOUT, SessionConfig};
use crate::store::MemorySessionDao;

/// Outcome of one validation sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Sessions loaded from the store.
    pub checked: usize,
    /// Sessions found stopped or expired.
    pub invalid: usize,
    /// Invalid sessions removed from the store.
    pub deleted: usize,
}

pub struct SessionManager {
    dao: Arc<dyn SessionDao>,
    clock: Arc<dyn Clock>,
    events: Option<Arc<EventBus>>,
    global_timeout: Duration,
    delete_invalid_sessions: bool,
}

impl SessionManager {
    #[must_use]
    pub fn builder() -> SessionManagerBuilder {
        SessionManagerBuilder::default()
    }

    #[must_use]
    pub fn global_timeout(&self) -> Duration {
        self.global_timeout
    }

    #[must_use]
    pub fn dao(&self) -> &Arc<dyn SessionDao> {
        &self.dao
    }

    /// Create and store a new active session.
    ///
    /// # Errors
    ///
    /// `Storage` if the DAO rejects the session.
    #[tracing::instrument(skip_all, fields(host = host.unwrap_or("-")))]
    pub async fn start(&self, host: Option<&str>) -> Result<Session, SessionError> {
        let session = Session::new(
            SessionId::generate(),
            host,
            self.global_timeout,
            self.clock.now(),
        );
        self.dao.create(&session).await?;

        info!(session_id = %session.id(), "Session started");
        self.publish(&SessionEvent::Started {
            id: session.id(),
            host: session.host().map(ToOwned::to_owned),
        });
        Ok(session)
    }

    /// Load a session that is still valid. Does not count as an access.
    ///
    /// # Errors
    ///
    /// `Unknown`, `Stopped`, `Expired` or `Storage`.
    pub async fn get_session(&self, id: SessionId) -> Result<Session, SessionError> {
        self.load_valid(id).await
    }

    /// Record an access, extending the session's idle window.
    ///
    /// # Errors
    ///
    /// `Stopped` or `Expired` for a terminal session. A session that timed
    /// out is expired and persisted before `Expired` is returned.
    pub async fn touch(&self, id: SessionId) -> Result<(), SessionError> {
        let mut session = self.load_valid(id).await?;
        session.touch(self.clock.now());
        self.dao.update(&session).await
    }

    /// Stop a session. Stopping a stopped or expired session is a no-op. A
    /// session that already timed out is recorded as expired, not stopped.
    ///
    /// # Errors
    ///
    /// `Unknown` if no such session exists, `Storage` on DAO failure.
    pub async fn stop(&self, id: SessionId) -> Result<(), SessionError> {
        let mut session = self.load(id).await?;
        if !session.is_active() {
            debug!(session_id = %id, state = ?session.state(), "Session already ended");
            return Ok(());
        }
        let now = self.clock.now();
        if session.validate(now).is_err() {
            return self.on_expiration(&session).await;
        }
        session.stop(now);
        self.dao.update(&session).await?;

        info!(session_id = %id, "Session stopped");
        self.publish(&SessionEvent::Stopped { id });
        Ok(())
    }

    /// # Errors
    ///
    /// As [`Self::get_session`].
    pub async fn attribute(
        &self,
        id: SessionId,
        key: &str,
    ) -> Result<Option<serde_json::Value>, SessionError> {
        let session = self.load_valid(id).await?;
        Ok(session.attribute(key).cloned())
    }

    /// Store an attribute, returning the value it replaced.
    ///
    /// # Errors
    ///
    /// As [`Self::get_session`], plus `Storage` on write failure.
    pub async fn set_attribute(
        &self,
        id: SessionId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<Option<serde_json::Value>, SessionError> {
        let mut session = self.load_valid(id).await?;
        let previous = session.set_attribute(key, value);
        self.dao.update(&session).await?;
        Ok(previous)
    }

    /// # Errors
    ///
    /// As [`Self::set_attribute`].
    pub async fn remove_attribute(
        &self,
        id: SessionId,
        key: &str,
    ) -> Result<Option<serde_json::Value>, SessionError> {
        let mut session = self.load_valid(id).await?;
        let removed = session.remove_attribute(key);
        if removed.is_some() {
            self.dao.update(&session).await?;
        }
        Ok(removed)
    }

    /// # Errors
    ///
    /// As [`Self::get_session`].
    pub async fn attribute_keys(&self, id: SessionId) -> Result<Vec<String>, SessionError> {
        Ok(self.load_valid(id).await?.attribute_keys())
    }

    /// Change the idle timeout of one session. Zero disables it.
    ///
    /// # Errors
    ///
    /// As [`Self::set_attribute`].
    pub async fn set_timeout(&self, id: SessionId, timeout: Duration) -> Result<(), SessionError> {
        let mut session = self.load_valid(id).await?;
        session.set_timeout(timeout);
        self.dao.update(&session).await
    }

    /// Check every stored session without extending any of them.
    ///
    /// Sessions that timed out are expired and persisted. Invalid sessions
    /// are deleted when the manager is configured to. A failure on one
    /// session is logged and the sweep moves on.
    ///
    /// # Errors
    ///
    /// `Storage` if the session list cannot be loaded.
    #[tracing::instrument(skip_all)]
    pub async fn validate_all_active_sessions(&self) -> Result<ValidationReport, SessionError> {
        let sessions = self.dao.active_sessions().await?;
        let now = self.clock.now();
        let mut report = ValidationReport {
            checked: sessions.len(),
            ..ValidationReport::default()
        };

        for mut session in sessions {
            let was_active = session.is_active();
            if session.validate(now).is_ok() {
                continue;
            }
            report.invalid += 1;
            let id = session.id();

            if was_active && let Err(e) = self.on_expiration(&session).await {
                warn!(session_id = %id, error = %e, "Failed to persist expired session");
            }
            if self.delete_invalid_sessions {
                match self.dao.delete(id).await {
                    Ok(()) => report.deleted += 1,
                    Err(e) => warn!(session_id = %id, error = %e, "Failed to delete invalid session"),
                }
            }
        }

        if report.invalid > 0 {
            info!(
                checked = report.checked,
                invalid = report.invalid,
                deleted = report.deleted,
                "Session validation found invalid sessions"
            );
        } else {
            debug!(checked = report.checked, "Session validation complete");
        }
        Ok(report)
    }

    async fn load(&self, id: SessionId) -> Result<Session, SessionError> {
        self.dao.read(id).await?.ok_or(SessionError::Unknown(id))
    }

    async fn load_valid(&self, id: SessionId) -> Result<Session, SessionError> {
        let mut session = self.load(id).await?;
        let was_active = session.is_active();
        if let Err(e) = session.validate(self.clock.now()) {
            if was_active {
                self.on_expiration(&session).await?;
            }
            return Err(e);
        }
        Ok(session)
    }

    async fn on_expiration(&self, session: &Session) -> Result<(), SessionError> {
        self.dao.update(session).await?;
        info!(session_id = %session.id(), "Session expired");
        self.publish(&SessionEvent::Expired { id: session.id() });
        Ok(())
    }

    fn publish(&self, event: &SessionEvent) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }
}

pub struct SessionManagerBuilder {
    dao: Option<Arc<dyn SessionDao>>,
    clock: Arc<dyn Clock>,
    events: Option<Arc<EventBus>>,
    global_timeout: Duration,
    delete_invalid_sessions: bool,
}

impl Default for SessionManagerBuilder {
    fn default() -> Self {
        Self {
            dao: None,
            clock: Arc::new(SystemClock),
            events: None,
            global_timeout: DEFAULT_GLOBAL_TIMEOUT,
            delete_invalid_sessions: true,
        }
    }
}

impl SessionManagerBuilder {
    /// Defaults to a fresh [`MemorySessionDao`].
    #[must_use]
    pub fn dao(mut self, dao: Arc<dyn SessionDao>) -> Self {
        self.dao = Some(dao);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    #[must_use]
    pub fn global_timeout(mut self, timeout: Duration) -> Self {
        self.global_timeout = timeout;
        self
    }

    #[must_use]
    pub fn delete_invalid_sessions(mut self, enabled: bool) -> Self {
        self.delete_invalid_sessions = enabled;
        self
    }

    /// Apply the timeout and deletion settings of `config`.
    #[must_use]
    pub fn config(self, config: &SessionConfig) -> Self {
        self.global_timeout(config.global_timeout)
            .delete_invalid_sessions(config.delete_invalid_sessions)
    }

    #[must_use]
    pub fn build(self) -> SessionManager {
        SessionManager {
            dao: self
                .dao
                .unwrap_or_else(|| Arc::new(MemorySessionDao::new())),
            clock: self.clock,
            events: self.events,
            global_timeout: self.global_timeout,
            delete_invalid_sessions: self.delete_invalid_sessions,
        }
    }
}
