use std::sync::Arc;

use async_trait::async_trait;
use identity_cache::{Cache, CacheManager};
use session_sdk::{Session, SessionDao, SessionError, SessionId};
use tracing::trace;

/// Cache name used for active sessions.
pub const ACTIVE_SESSION_CACHE: &str = "sessions:active";

/// Read-through, write-through cache in front of another [`SessionDao`].
///
/// Only active sessions are cached. The backing store stays the source of
/// truth, so a cache miss or an evicted entry never loses a session.
pub struct CachingSessionDao {
    inner: Arc<dyn SessionDao>,
    cache: Arc<dyn Cache<SessionId, Session>>,
}

impl CachingSessionDao {
    #[must_use]
    pub fn new(inner: Arc<dyn SessionDao>, caches: &dyn CacheManager<SessionId, Session>) -> Self {
        Self {
            inner,
            cache: caches.get_cache(ACTIVE_SESSION_CACHE),
        }
    }

    fn cache_or_evict(&self, session: &Session) {
        if session.is_active() {
            self.cache.put(session.id(), Arc::new(session.clone()));
        } else {
            self.cache.remove(&session.id());
        }
    }
}

#[async_trait]
impl SessionDao for CachingSessionDao {
    async fn create(&self, session: &Session) -> Result<(), SessionError> {
        self.inner.create(session).await?;
        self.cache_or_evict(session);
        Ok(())
    }

    async fn read(&self, id: SessionId) -> Result<Option<Session>, SessionError> {
        if let Some(hit) = self.cache.get(&id) {
            trace!(session_id = %id, "Session cache hit");
            return Ok(Some(Session::clone(&hit)));
        }
        let loaded = self.inner.read(id).await?;
        if let Some(session) = &loaded {
            self.cache_or_evict(session);
        }
        Ok(loaded)
    }

    async fn update(&self, session: &Session) -> Result<(), SessionError> {
        self.inner.update(session).await?;
        self.cache_or_evict(session);
        Ok(())
    }

    async fn delete(&self, id: SessionId) -> Result<(), SessionError> {
        self.cache.remove(&id);
        self.inner.delete(id).await
    }

    async fn active_sessions(&self) -> Result<Vec<Session>, SessionError> {
        self.inner.active_sessions().await
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use chrono::Utc;
    use identity_cache::BoundedCacheManager;

    use super::*;
    use crate::store::MemorySessionDao;

    #[derive(Default)]
    struct CountingDao {
        inner: MemorySessionDao,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl SessionDao for CountingDao {
        async fn create(&self, session: &Session) -> Result<(), SessionError> {
            self.inner.create(session).await
        }

        async fn read(&self, id: SessionId) -> Result<Option<Session>, SessionError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.read(id).await
        }

        async fn update(&self, session: &Session) -> Result<(), SessionError> {
            self.inner.update(session).await
        }

        async fn delete(&self, id: SessionId) -> Result<(), SessionError> {
            self.inner.delete(id).await
        }

        async fn active_sessions(&self) -> Result<Vec<Session>, SessionError> {
            self.inner.active_sessions().await
        }
    }

    fn setup() -> (Arc<CountingDao>, CachingSessionDao) {
        let backing = Arc::new(CountingDao::default());
        let caches = BoundedCacheManager::<SessionId, Session>::default();
        let dao = CachingSessionDao::new(backing.clone(), &caches);
        (backing, dao)
    }

    fn session() -> Session {
        Session::new(SessionId::generate(), None, Duration::from_secs(60), Utc::now())
    }

    #[tokio::test]
    async fn reads_hit_the_cache_after_create() {
        let (backing, dao) = setup();
        let s = session();
        dao.create(&s).await.unwrap();

        assert_eq!(dao.read(s.id()).await.unwrap(), Some(s.clone()));
        assert_eq!(dao.read(s.id()).await.unwrap(), Some(s));
        assert_eq!(backing.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn miss_reads_through() {
        let (backing, dao) = setup();
        let s = session();
        backing.create(&s).await.unwrap();

        assert_eq!(dao.read(s.id()).await.unwrap(), Some(s.clone()));
        assert_eq!(dao.read(s.id()).await.unwrap(), Some(s));
        assert_eq!(backing.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stopped_sessions_leave_the_cache() {
        let (backing, dao) = setup();
        let mut s = session();
        dao.create(&s).await.unwrap();

        s.stop(Utc::now());
        dao.update(&s).await.unwrap();

        let read = dao.read(s.id()).await.unwrap().unwrap();
        assert!(!read.is_active());
        assert_eq!(backing.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn delete_removes_everywhere() {
        let (backing, dao) = setup();
        let s = session();
        dao.create(&s).await.unwrap();
        dao.delete(s.id()).await.unwrap();

        assert!(dao.read(s.id()).await.unwrap().is_none());
        assert!(backing.inner.is_empty());
    }
}
