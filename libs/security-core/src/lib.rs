#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Core identity types shared by every gatekeep crate.

pub mod context;
pub mod principals;
pub mod scope;

pub use context::{SecurityContext, SecurityContextBuilder, SessionId};
pub use principals::{PrincipalCollection, RealmPrincipal};
pub use scope::{current, current_or_anonymous, spawn_with_current, sync_scope};
