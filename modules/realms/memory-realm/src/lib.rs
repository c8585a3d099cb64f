#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! In-memory realm.
//!
//! Accounts, their roles and each role's permissions come from
//! [`MemoryRealmConfig`]. The realm authenticates `username_password` tokens
//! and answers authorization queries for principals it contributed.

pub mod config;
pub mod domain;

pub use config::{AccountConfig, DEFAULT_REALM_NAME, MemoryRealmConfig, PasswordFormat};
pub use domain::MemoryRealm;
