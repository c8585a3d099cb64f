//! Credential matcher SPI.

use crate::error::{AuthNError, CredentialsError};
use crate::models::AuthenticationInfo;
use crate::token::AuthenticationToken;

/// Compares a submitted credential with the one a realm stored.
pub trait CredentialsMatcher: Send + Sync {
    /// `Ok(true)` when the token's credential proves the account.
    ///
    /// # Errors
    ///
    /// [`CredentialsError`] if the stored credential cannot be interpreted.
    /// A mismatch is `Ok(false)`, never an error.
    fn matches(
        &self,
        token: &AuthenticationToken,
        info: &AuthenticationInfo,
    ) -> Result<bool, CredentialsError>;
}

/// Run `matcher` and turn a mismatch into [`AuthNError::IncorrectCredentials`].
///
/// # Errors
///
/// `IncorrectCredentials` on mismatch, `Credentials` on malformed stored data.
pub fn assert_credentials_match(
    matcher: &dyn CredentialsMatcher,
    token: &AuthenticationToken,
    info: &AuthenticationInfo,
) -> Result<(), AuthNError> {
    if matcher.matches(token, info)? {
        Ok(())
    } else {
        Err(AuthNError::IncorrectCredentials(
            token.principal_hint().to_owned(),
        ))
    }
}
