use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::principals::PrincipalCollection;

/// Opaque session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Allocate a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `SecurityContext` is the subject view carried through a unit of work.
///
/// Built by the security manager on login and passed explicitly (or bound with
/// [`crate::scope`]) to whatever needs to make trust decisions. An anonymous
/// context has no principals and is not authenticated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityContext {
    /// Identity assembled by the authenticator. Empty for guests.
    principals: PrincipalCollection,
    /// Session that tracks this subject's trust window.
    session_id: Option<SessionId>,
    /// Whether the principals were proven during this session.
    authenticated: bool,
    /// Originating host, when known.
    host: Option<String>,
}

impl SecurityContext {
    #[must_use]
    pub fn builder() -> SecurityContextBuilder {
        SecurityContextBuilder::default()
    }

    /// Context with no identity, no session and no host.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn principals(&self) -> &PrincipalCollection {
        &self.principals
    }

    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// A known identity exists, either authenticated now or carried over.
    #[must_use]
    pub fn is_user(&self) -> bool {
        !self.principals.is_empty()
    }

    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }
}

#[derive(Default)]
pub struct SecurityContextBuilder {
    principals: PrincipalCollection,
    session_id: Option<SessionId>,
    authenticated: bool,
    host: Option<String>,
}

impl SecurityContextBuilder {
    #[must_use]
    pub fn principals(mut self, principals: PrincipalCollection) -> Self {
        self.principals = principals;
        self
    }

    #[must_use]
    pub fn session_id(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    #[must_use]
    pub fn authenticated(mut self, authenticated: bool) -> Self {
        self.authenticated = authenticated;
        self
    }

    #[must_use]
    pub fn host(mut self, host: &str) -> Self {
        self.host = Some(host.to_owned());
        self
    }

    #[must_use]
    pub fn build(self) -> SecurityContext {
        SecurityContext {
            principals: self.principals,
            session_id: self.session_id,
            authenticated: self.authenticated,
            host: self.host,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn builder_full() {
        let sid = SessionId::generate();
        let ctx = SecurityContext::builder()
            .principals(PrincipalCollection::single("db", "alice"))
            .session_id(sid)
            .authenticated(true)
            .host("10.0.0.1")
            .build();

        assert_eq!(ctx.principals().primary(), Some("alice"));
        assert_eq!(ctx.session_id(), Some(sid));
        assert!(ctx.is_authenticated());
        assert!(ctx.is_user());
        assert_eq!(ctx.host(), Some("10.0.0.1"));
    }

    #[test]
    fn anonymous_has_nothing() {
        let ctx = SecurityContext::anonymous();

        assert!(ctx.principals().is_empty());
        assert!(ctx.session_id().is_none());
        assert!(!ctx.is_authenticated());
        assert!(!ctx.is_user());
        assert!(ctx.host().is_none());
    }

    #[test]
    fn remembered_identity_is_user_but_not_authenticated() {
        let ctx = SecurityContext::builder()
            .principals(PrincipalCollection::single("db", "bob"))
            .build();

        assert!(ctx.is_user());
        assert!(!ctx.is_authenticated());
    }

    #[test]
    fn serialize_deserialize() {
        let original = SecurityContext::builder()
            .principals(PrincipalCollection::single("db", "alice"))
            .session_id(SessionId::generate())
            .authenticated(true)
            .build();

        let serialized = serde_json::to_string(&original).unwrap();
        let deserialized: SecurityContext = serde_json::from_str(&serialized).unwrap();

        assert_eq!(deserialized, original);
    }

    #[test]
    fn session_id_serializes_as_bare_uuid() {
        let id = SessionId::from_uuid(Uuid::nil());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }

    #[test]
    fn generated_session_ids_are_random_v4() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_uuid().get_version_num(), 4);
    }
}
