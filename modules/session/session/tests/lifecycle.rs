#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta};
use event_bus::EventBus;
use identity_cache::BoundedCacheManager;
use parking_lot::Mutex;
use session::{CachingSessionDao, ManualClock, MemorySessionDao, SessionManager};
use session_sdk::{Session, SessionDao, SessionError, SessionEvent, SessionId, SessionState};

const MINUTE: Duration = Duration::from_secs(60);

fn recording_bus() -> (Arc<EventBus>, Arc<Mutex<Vec<SessionEvent>>>) {
    let bus = Arc::new(EventBus::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    bus.subscribe(move |e: &SessionEvent| {
        sink.lock().push(e.clone());
        Ok(())
    });
    (bus, seen)
}

#[tokio::test]
async fn touch_within_timeout_then_expiry_after_it() {
    let t = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    let clock = Arc::new(ManualClock::new(t));
    let dao = Arc::new(MemorySessionDao::new());
    let manager = SessionManager::builder()
        .dao(dao.clone())
        .clock(clock.clone())
        .global_timeout(30 * MINUTE)
        .build();

    let id = manager.start(Some("192.0.2.7")).await.unwrap().id();

    clock.advance(10 * MINUTE);
    manager.touch(id).await.unwrap();
    let session = manager.get_session(id).await.unwrap();
    assert_eq!(session.last_access_time(), t + TimeDelta::minutes(10));
    assert_eq!(session.state(), SessionState::Active);

    clock.advance(35 * MINUTE);
    assert_eq!(manager.touch(id).await, Err(SessionError::Expired(id)));
    assert_eq!(stored(&dao, id).await.state(), SessionState::Expired);

    // every later call keeps failing the same way
    assert_eq!(manager.touch(id).await, Err(SessionError::Expired(id)));
}

#[tokio::test]
async fn lifecycle_events_are_published() {
    let (bus, seen) = recording_bus();
    let clock = Arc::new(ManualClock::default());
    let manager = SessionManager::builder()
        .clock(clock.clone())
        .event_bus(bus)
        .global_timeout(5 * MINUTE)
        .build();

    let stopped = manager.start(Some("h1")).await.unwrap().id();
    manager.stop(stopped).await.unwrap();
    manager.stop(stopped).await.unwrap();

    let expired = manager.start(None).await.unwrap().id();
    clock.advance(6 * MINUTE);
    assert!(manager.touch(expired).await.is_err());
    assert!(manager.touch(expired).await.is_err());

    assert_eq!(
        *seen.lock(),
        vec![
            SessionEvent::Started {
                id: stopped,
                host: Some("h1".to_owned())
            },
            SessionEvent::Stopped { id: stopped },
            SessionEvent::Started {
                id: expired,
                host: None
            },
            SessionEvent::Expired { id: expired },
        ]
    );
}

#[tokio::test]
async fn stopping_a_timed_out_session_expires_it() {
    let (bus, seen) = recording_bus();
    let clock = Arc::new(ManualClock::default());
    let dao = Arc::new(MemorySessionDao::new());
    let manager = SessionManager::builder()
        .dao(dao.clone())
        .clock(clock.clone())
        .event_bus(bus)
        .global_timeout(5 * MINUTE)
        .build();

    let id = manager.start(None).await.unwrap().id();
    clock.advance(6 * MINUTE);
    manager.stop(id).await.unwrap();
    manager.stop(id).await.unwrap();

    assert_eq!(stored(&dao, id).await.state(), SessionState::Expired);
    assert_eq!(manager.touch(id).await, Err(SessionError::Expired(id)));
    assert_eq!(
        *seen.lock(),
        vec![
            SessionEvent::Started { id, host: None },
            SessionEvent::Expired { id },
        ]
    );
}

#[tokio::test]
async fn failing_listener_does_not_break_session_start() {
    let bus = Arc::new(EventBus::new());
    bus.subscribe(|_: &SessionEvent| Err(anyhow::anyhow!("listener down")));
    let manager = SessionManager::builder().event_bus(bus).build();

    let session = manager.start(None).await.unwrap();
    manager.touch(session.id()).await.unwrap();
}

#[tokio::test]
async fn manager_over_caching_dao() {
    let clock = Arc::new(ManualClock::default());
    let backing = Arc::new(MemorySessionDao::new());
    let caches = BoundedCacheManager::<SessionId, Session>::default();
    let manager = SessionManager::builder()
        .dao(Arc::new(CachingSessionDao::new(backing.clone(), &caches)))
        .clock(clock.clone())
        .global_timeout(MINUTE)
        .build();

    let id = manager.start(None).await.unwrap().id();
    manager
        .set_attribute(id, "cart", serde_json::json!([1, 2, 3]))
        .await
        .unwrap();
    assert_eq!(
        stored(&backing, id).await.attribute("cart"),
        Some(&serde_json::json!([1, 2, 3]))
    );

    clock.advance(2 * MINUTE);
    let report = manager.validate_all_active_sessions().await.unwrap();
    assert_eq!(report.deleted, 1);
    assert_eq!(manager.get_session(id).await, Err(SessionError::Unknown(id)));
}

async fn stored(dao: &MemorySessionDao, id: SessionId) -> Session {
    dao.read(id).await.unwrap().expect("session stored")
}
