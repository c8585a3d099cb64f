//! The session record and its state machine.
//!
//! `Active -> Stopped` or `Active -> Expired`. Both end states are final.
//! Methods take the current time explicitly; the manager owns the clock.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use security_core::SessionId;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Active,
    Stopped,
    Expired,
}

/// Server-side trust window of one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    start_time: DateTime<Utc>,
    last_access_time: DateTime<Utc>,
    stop_time: Option<DateTime<Utc>>,
    /// Idle timeout. Zero means the session never times out.
    timeout: Duration,
    host: Option<String>,
    attributes: HashMap<String, serde_json::Value>,
    expired: bool,
}

impl Session {
    #[must_use]
    pub fn new(id: SessionId, host: Option<&str>, timeout: Duration, now: DateTime<Utc>) -> Self {
        Self {
            id,
            start_time: now,
            last_access_time: now,
            stop_time: None,
            timeout,
            host: host.map(ToOwned::to_owned),
            attributes: HashMap::new(),
            expired: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    #[must_use]
    pub fn last_access_time(&self) -> DateTime<Utc> {
        self.last_access_time
    }

    #[must_use]
    pub fn stop_time(&self) -> Option<DateTime<Utc>> {
        self.stop_time
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.expired {
            SessionState::Expired
        } else if self.stop_time.is_some() {
            SessionState::Stopped
        } else {
            SessionState::Active
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    /// Idle for longer than the timeout as of `now`. Says nothing about
    /// whether the session was stopped.
    #[must_use]
    pub fn is_timed_out(&self, now: DateTime<Utc>) -> bool {
        if self.timeout.is_zero() {
            return false;
        }
        let Ok(timeout) = TimeDelta::from_std(self.timeout) else {
            return false;
        };
        now.signed_duration_since(self.last_access_time) > timeout
    }

    /// Record an access. Callers validate first.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_access_time = now;
    }

    /// Move to `Stopped`. A session that already ended keeps its state.
    pub fn stop(&mut self, now: DateTime<Utc>) {
        if self.stop_time.is_none() {
            self.stop_time = Some(now);
        }
    }

    /// Move to `Expired`; the last access time is pinned to the stop time.
    pub fn expire(&mut self, now: DateTime<Utc>) {
        self.stop(now);
        self.expired = true;
        if let Some(stopped) = self.stop_time {
            self.last_access_time = stopped;
        }
    }

    /// Check that the session is still usable, expiring it if it timed out.
    ///
    /// # Errors
    ///
    /// `Expired` for an expired or timed-out session, `Stopped` for a
    /// stopped one.
    pub fn validate(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        match self.state() {
            SessionState::Expired => Err(SessionError::Expired(self.id)),
            SessionState::Stopped => Err(SessionError::Stopped(self.id)),
            SessionState::Active if self.is_timed_out(now) => {
                self.expire(now);
                Err(SessionError::Expired(self.id))
            }
            SessionState::Active => Ok(()),
        }
    }

    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }

    /// Store `value` under `key`, returning the previous value.
    pub fn set_attribute(
        &mut self,
        key: &str,
        value: serde_json::Value,
    ) -> Option<serde_json::Value> {
        self.attributes.insert(key.to_owned(), value)
    }

    pub fn remove_attribute(&mut self, key: &str) -> Option<serde_json::Value> {
        self.attributes.remove(key)
    }

    /// Attribute keys in sorted order.
    #[must_use]
    pub fn attribute_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.attributes.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    const MIN: i64 = 60;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn at(minutes: i64) -> DateTime<Utc> {
        t0() + TimeDelta::seconds(minutes * MIN)
    }

    fn session(timeout_min: u64) -> Session {
        Session::new(
            SessionId::generate(),
            Some("10.0.0.1"),
            Duration::from_secs(timeout_min * 60),
            t0(),
        )
    }

    #[test]
    fn new_session_is_active_with_equal_timestamps() {
        let s = session(30);
        assert_eq!(s.state(), SessionState::Active);
        assert_eq!(s.start_time(), s.last_access_time());
        assert_eq!(s.host(), Some("10.0.0.1"));
        assert!(s.stop_time().is_none());
    }

    #[test]
    fn timeout_is_measured_from_last_access() {
        let mut s = session(30);
        assert!(!s.is_timed_out(at(30)));
        assert!(s.is_timed_out(at(31)));

        s.touch(at(20));
        assert!(!s.is_timed_out(at(45)));
        assert!(s.is_timed_out(at(51)));
    }

    #[test]
    fn zero_timeout_never_times_out() {
        let s = session(0);
        assert!(!s.is_timed_out(at(60 * 24 * 365)));
    }

    #[test]
    fn validate_expires_timed_out_session() {
        let mut s = session(30);
        assert!(s.validate(at(10)).is_ok());

        let err = s.validate(at(45)).unwrap_err();
        assert_eq!(err, SessionError::Expired(s.id()));
        assert_eq!(s.state(), SessionState::Expired);
        assert_eq!(s.stop_time(), Some(at(45)));
        assert_eq!(s.last_access_time(), at(45));

        // terminal: later validation keeps reporting expiry
        assert_eq!(s.validate(at(46)).unwrap_err().kind(), "expired_session");
    }

    #[test]
    fn stopped_and_expired_are_distinct() {
        let mut stopped = session(30);
        stopped.stop(at(1));
        assert_eq!(stopped.state(), SessionState::Stopped);
        assert_eq!(stopped.validate(at(2)), Err(SessionError::Stopped(stopped.id())));

        stopped.stop(at(5));
        assert_eq!(stopped.stop_time(), Some(at(1)), "second stop keeps the first stop time");

        let mut expired = session(30);
        expired.expire(at(3));
        assert_eq!(expired.state(), SessionState::Expired);
        assert!(expired.validate(at(4)).unwrap_err().is_invalid_session());
    }

    #[test]
    fn attributes() {
        let mut s = session(30);
        assert!(s.set_attribute("theme", serde_json::json!("dark")).is_none());
        assert_eq!(
            s.set_attribute("theme", serde_json::json!("light")),
            Some(serde_json::json!("dark"))
        );
        s.set_attribute("cart", serde_json::json!([1, 2]));

        assert_eq!(s.attribute_keys(), vec!["cart", "theme"]);
        assert_eq!(s.remove_attribute("cart"), Some(serde_json::json!([1, 2])));
        assert!(s.attribute("cart").is_none());
    }

    #[test]
    fn serializes_with_state() {
        let mut s = session(30);
        s.set_attribute("k", serde_json::json!(1));
        let json = serde_json::to_value(&s).unwrap();
        let back: Session = serde_json::from_value(json).unwrap();
        assert_eq!(back, s);
    }
}
