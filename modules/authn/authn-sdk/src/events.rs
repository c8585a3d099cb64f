//! Events published on the bus by the authenticator.

use security_core::PrincipalCollection;

/// Outcome of one `authenticate` call. Never carries the credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationEvent {
    Succeeded {
        principals: PrincipalCollection,
        token_type: String,
    },
    Failed {
        principal_hint: String,
        token_type: String,
        /// Error kind label, see `AuthNError::kind`.
        reason: String,
    },
}

/// A subject logged out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutEvent {
    pub principals: PrincipalCollection,
}
