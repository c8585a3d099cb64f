use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use session_sdk::{Session, SessionDao, SessionError, SessionId};

/// Process-local session store.
#[derive(Debug, Default)]
pub struct MemorySessionDao {
    sessions: DashMap<SessionId, Session>,
}

impl MemorySessionDao {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionDao for MemorySessionDao {
    async fn create(&self, session: &Session) -> Result<(), SessionError> {
        match self.sessions.entry(session.id()) {
            Entry::Occupied(_) => Err(SessionError::Storage(format!(
                "session {} already exists",
                session.id()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(session.clone());
                Ok(())
            }
        }
    }

    async fn read(&self, id: SessionId) -> Result<Option<Session>, SessionError> {
        Ok(self.sessions.get(&id).map(|s| s.value().clone()))
    }

    async fn update(&self, session: &Session) -> Result<(), SessionError> {
        let mut stored = self
            .sessions
            .get_mut(&session.id())
            .ok_or(SessionError::Unknown(session.id()))?;
        *stored = session.clone();
        Ok(())
    }

    async fn delete(&self, id: SessionId) -> Result<(), SessionError> {
        self.sessions.remove(&id);
        Ok(())
    }

    async fn active_sessions(&self) -> Result<Vec<Session>, SessionError> {
        Ok(self.sessions.iter().map(|s| s.value().clone()).collect())
    }
}
