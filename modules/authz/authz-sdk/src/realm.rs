//! Realm SPI for authorization.

use async_trait::async_trait;
use security_core::PrincipalCollection;

use crate::error::AuthZError;
use crate::models::AuthorizationInfo;

/// A source of roles and permissions.
///
/// Realms pick their own principals out of the collection, usually with
/// `principals.from_realm(self.name())`.
#[async_trait]
pub trait AuthorizingRealm: Send + Sync {
    fn name(&self) -> &str;

    /// Authorization data for `principals`. `Ok(None)` means "no roles, no
    /// permissions" and is not an error.
    ///
    /// # Errors
    ///
    /// [`AuthZError::RealmUnavailable`] when the backing store cannot be read.
    async fn authorization_info(
        &self,
        principals: &PrincipalCollection,
    ) -> Result<Option<AuthorizationInfo>, AuthZError>;
}
