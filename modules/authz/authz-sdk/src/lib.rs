#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Authorization SDK
//!
//! - [`Permission`], [`WildcardPermission`], [`AllPermission`] - what may be done
//! - [`PermissionResolver`] / [`RolePermissionResolver`] - strings and roles to permissions
//! - [`AuthorizationInfo`] - roles and permissions a realm grants
//! - [`AuthorizingRealm`] - realm SPI
//! - [`Requirement`] - preconditions for guarded work
//! - [`AuthZError`] - error type

pub mod error;
pub mod models;
pub mod permission;
pub mod realm;
pub mod requirement;
pub mod resolver;

pub use error::AuthZError;
pub use models::AuthorizationInfo;
pub use permission::{AllPermission, Permission, WildcardPermission};
pub use realm::AuthorizingRealm;
pub use requirement::{Logical, Requirement};
pub use resolver::{
    PermissionResolver, RolePermissionResolver, StaticRolePermissionResolver,
    WildcardPermissionResolver,
};
