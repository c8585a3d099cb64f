//! Error types for authentication.

use thiserror::Error;

/// Malformed stored credential data.
///
/// A credential that is well formed but wrong is not an error; matchers
/// report it as `Ok(false)`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("stored credential is malformed: {0}")]
    Malformed(String),

    #[error("unsupported hash algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    #[error("stored credential could not be decoded: {0}")]
    Encoding(String),

    #[error("public salt length {len} is below the minimum of {min} bytes")]
    SaltTooShort { len: usize, min: usize },
}

/// A realm's failure recorded during a multi-realm attempt.
#[derive(Debug, Clone)]
pub struct RealmFailure {
    pub realm: String,
    pub error: AuthNError,
}

/// Errors produced by realms and by the authenticator.
#[derive(Debug, Clone, Error)]
pub enum AuthNError {
    #[error("no account found for '{0}'")]
    UnknownAccount(String),

    #[error("submitted credentials for '{0}' did not match")]
    IncorrectCredentials(String),

    #[error("credentials for '{0}' have expired")]
    ExpiredCredentials(String),

    #[error("account '{0}' is disabled")]
    DisabledAccount(String),

    #[error("account '{0}' is locked")]
    LockedAccount(String),

    #[error("no realm supports token type '{token_type}'")]
    UnsupportedToken { token_type: String },

    #[error("authenticator misconfigured: {0}")]
    Configuration(String),

    #[error("{message}")]
    Aggregate {
        message: String,
        failures: Vec<RealmFailure>,
    },

    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    /// The realm could not be consulted (backing store down, etc.).
    #[error("realm '{realm}' unavailable: {reason}")]
    RealmUnavailable { realm: String, reason: String },
}

impl AuthNError {
    /// Stable, credential-free label for events and logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownAccount(_) => "unknown_account",
            Self::IncorrectCredentials(_) => "incorrect_credentials",
            Self::ExpiredCredentials(_) => "expired_credentials",
            Self::DisabledAccount(_) => "disabled_account",
            Self::LockedAccount(_) => "locked_account",
            Self::UnsupportedToken { .. } => "unsupported_token",
            Self::Configuration(_) => "configuration",
            Self::Aggregate { .. } => "aggregate",
            Self::Credentials(_) => "malformed_credentials",
            Self::RealmUnavailable { .. } => "realm_unavailable",
        }
    }

    /// The last recorded per-realm cause of an aggregate failure.
    #[must_use]
    pub fn last_cause(&self) -> Option<&AuthNError> {
        match self {
            Self::Aggregate { failures, .. } => failures.last().map(|f| &f.error),
            _ => None,
        }
    }
}
