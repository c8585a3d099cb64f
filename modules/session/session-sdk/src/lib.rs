#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Session SDK
//!
//! - [`Session`] / [`SessionState`] - the session record and its state machine
//! - [`SessionDao`] - storage SPI
//! - [`SessionError`] - error type
//! - [`SessionEvent`] - lifecycle events

pub mod dao;
pub mod error;
pub mod events;
pub mod session;

pub use dao::SessionDao;
pub use error::SessionError;
pub use events::SessionEvent;
pub use security_core::SessionId;
pub use session::{Session, SessionState};
