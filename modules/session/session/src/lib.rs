#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Session lifecycle
//!
//! - [`SessionManager`] - start, touch, stop and expire sessions
//! - [`SessionValidationScheduler`] - periodic sweep for expired sessions
//! - [`MemorySessionDao`], [`CachingSessionDao`] - session stores
//! - [`Clock`] - injectable time source

pub mod clock;
pub mod config;
pub mod manager;
pub mod scheduler;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DEFAULT_GLOBAL_TIMEOUT, DEFAULT_VALIDATION_INTERVAL, SessionConfig};
pub use manager::{SessionManager, SessionManagerBuilder, ValidationReport};
pub use scheduler::{SchedulerError, SessionValidationScheduler};
pub use store::{ACTIVE_SESSION_CACHE, CachingSessionDao, MemorySessionDao};
