#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Authentication
//!
//! - [`Authenticator`] walks the realms through an [`AuthenticationStrategy`]
//! - [`HashService`] computes salted, iterated credential hashes
//! - [`SimpleCredentialsMatcher`], [`HashedCredentialsMatcher`] and
//!   [`ModularCryptMatcher`] compare submitted and stored credentials

pub mod authenticator;
pub mod config;
pub mod credential;
pub mod strategy;

pub use authenticator::{Authenticator, AuthenticatorBuilder};
pub use config::{HashingConfig, MIN_PUBLIC_SALT_LEN, StoredEncoding};
pub use credential::{
    Hash, HashAlgorithm, HashRequest, HashService, HashedCredentialsMatcher, ModularCryptMatcher,
    SimpleCredentialsMatcher,
};
pub use strategy::{
    ALL_SUCCESSFUL, AT_LEAST_ONE, AllSuccessful, AtLeastOneSuccessful, AttemptFlow, AttemptState,
    AuthenticationStrategy, FIRST_SUCCESSFUL, FirstSuccessful, RealmCandidate,
};
