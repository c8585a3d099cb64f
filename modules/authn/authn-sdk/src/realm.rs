//! Realm SPI for authentication.

use async_trait::async_trait;
use security_core::PrincipalCollection;

use crate::error::AuthNError;
use crate::models::AuthenticationInfo;
use crate::token::AuthenticationToken;

/// A source of account data that can verify submitted tokens.
///
/// Implementations look the account up, check its state and run their
/// [`crate::CredentialsMatcher`] before returning. `Ok(None)` means the realm
/// has nothing to say about this token; errors describe why the realm
/// rejected it.
#[async_trait]
pub trait AuthenticatingRealm: Send + Sync {
    /// Unique name. Principals this realm contributes are keyed by it.
    fn name(&self) -> &str;

    /// Capability check for a token type (e.g. `username_password`).
    fn supports(&self, token_type: &str) -> bool;

    /// Verify `token` and return the account it identifies.
    ///
    /// # Errors
    ///
    /// Any [`AuthNError`] describing why the realm rejected the token.
    async fn authentication_info(
        &self,
        token: &AuthenticationToken,
    ) -> Result<Option<AuthenticationInfo>, AuthNError>;

    /// Called once per logout with the subject's full principal set.
    async fn on_logout(&self, _principals: &PrincipalCollection) {}
}
