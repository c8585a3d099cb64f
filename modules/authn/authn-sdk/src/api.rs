//! Public API trait for authentication.

use async_trait::async_trait;
use security_core::PrincipalCollection;

use crate::error::AuthNError;
use crate::token::AuthenticationToken;

/// What callers use to turn a token into a trusted identity.
///
/// ```ignore
/// let principals = authenticator
///     .authenticate(&AuthenticationToken::username_password("alice", "secret"))
///     .await?;
/// ```
#[async_trait]
pub trait AuthenticatorClient: Send + Sync {
    /// Authenticate `token` against the configured realms.
    ///
    /// # Errors
    ///
    /// - `UnsupportedToken` if no realm accepts the token type
    /// - `Configuration` if no realms are configured
    /// - the strategy's failure otherwise
    async fn authenticate(
        &self,
        token: &AuthenticationToken,
    ) -> Result<PrincipalCollection, AuthNError>;

    /// Tell every realm that `principals` logged out.
    async fn on_logout(&self, principals: &PrincipalCollection);
}
