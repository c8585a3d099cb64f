//! Facade error types.

use std::path::PathBuf;

use authn_sdk::{AuthNError, CredentialsError};
use authz_sdk::AuthZError;
use session::SchedulerError;
use session_sdk::SessionError;
use thiserror::Error;

/// Failures while loading configuration or assembling components.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("no {kind} registered under '{key}'")]
    UnknownComponent { kind: &'static str, key: String },

    /// A registered factory failed.
    #[error("failed to build {kind} '{key}': {reason}")]
    Component {
        kind: &'static str,
        key: String,
        reason: String,
    },

    #[error("invalid log filter '{directive}': {reason}")]
    LogFilter { directive: String, reason: String },
}

impl ConfigError {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingFile(_) => "missing_file",
            Self::Load(_) => "load",
            Self::UnknownComponent { .. } => "unknown_component",
            Self::Component { .. } => "component",
            Self::LogFilter { .. } => "log_filter",
        }
    }
}

/// Any error surfaced by [`crate::SecurityManager`].
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error(transparent)]
    AuthN(#[from] AuthNError),

    #[error(transparent)]
    AuthZ(#[from] AuthZError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

impl SecurityError {
    /// Stable label of the underlying error.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthN(e) => e.kind(),
            Self::AuthZ(e) => e.kind(),
            Self::Session(e) => e.kind(),
            Self::Credentials(_) => "credentials",
            Self::Config(e) => e.kind(),
            Self::Scheduler(_) => "scheduler",
        }
    }
}
