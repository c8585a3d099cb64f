#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Authorization
//!
//! [`ModularRealmAuthorizer`] answers role and permission questions over the
//! realms named in a principal collection, with deny-by-default and optional
//! per-realm caching. [`Guard`] checks declared [`authz_sdk::Requirement`]s
//! before running work.

pub mod authorizer;
pub mod guard;

pub use authorizer::{
    AUTHZ_CACHE_PREFIX, ModularRealmAuthorizer, ModularRealmAuthorizerBuilder,
    ResolvedAuthorization,
};
pub use guard::Guard;
