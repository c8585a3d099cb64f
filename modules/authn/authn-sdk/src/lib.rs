#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Authentication SDK
//!
//! Public types and SPIs of the authentication area:
//!
//! - [`AuthenticationToken`] - submitted credential claim
//! - [`AuthenticationInfo`] - what a realm found for a token
//! - [`AuthenticatingRealm`] - realm SPI
//! - [`CredentialsMatcher`] - stored-credential comparison SPI
//! - [`AuthenticatorClient`] - API used by callers
//! - [`AuthNError`] / [`CredentialsError`] - error types
//! - [`AuthenticationEvent`] / [`LogoutEvent`] - bus events

pub mod api;
pub mod credential;
pub mod error;
pub mod events;
pub mod models;
pub mod realm;
pub mod token;

pub use api::AuthenticatorClient;
pub use credential::{CredentialsMatcher, assert_credentials_match};
pub use error::{AuthNError, CredentialsError, RealmFailure};
pub use events::{AuthenticationEvent, LogoutEvent};
pub use models::AuthenticationInfo;
pub use realm::AuthenticatingRealm;
pub use token::{AuthenticationToken, AuthenticationTokenBuilder, BEARER, Credential, USERNAME_PASSWORD};
