//! Error types for authorization.

use thiserror::Error;

/// Authorization failures.
///
/// Queries (`has_role`, `is_permitted`) never produce these; only the
/// `check_*` variants and guards do.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthZError {
    /// The subject lacks a role or permission.
    #[error("subject is not authorized to {action}")]
    Unauthorized { action: String },

    /// The request's origin is not allowed.
    #[error("host '{host}' is not authorized")]
    HostUnauthorized { host: String },

    /// An authenticated subject is required.
    #[error("subject is not authenticated")]
    Unauthenticated,

    #[error("invalid permission '{permission}': {reason}")]
    InvalidPermission { permission: String, reason: String },

    /// A realm failed to load authorization data.
    #[error("realm '{realm}' unavailable: {reason}")]
    RealmUnavailable { realm: String, reason: String },
}

impl AuthZError {
    #[must_use]
    pub fn unauthorized(action: impl Into<String>) -> Self {
        Self::Unauthorized {
            action: action.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized { .. } => "unauthorized",
            Self::HostUnauthorized { .. } => "host_unauthorized",
            Self::Unauthenticated => "unauthenticated",
            Self::InvalidPermission { .. } => "invalid_permission",
            Self::RealmUnavailable { .. } => "realm_unavailable",
        }
    }
}
