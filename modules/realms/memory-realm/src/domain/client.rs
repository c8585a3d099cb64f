//! Realm SPI implementations for [`MemoryRealm`].

use async_trait::async_trait;
use authn_sdk::{AuthNError, AuthenticatingRealm, AuthenticationInfo, AuthenticationToken, USERNAME_PASSWORD};
use authz_sdk::{AuthZError, AuthorizationInfo, AuthorizingRealm};
use security_core::PrincipalCollection;
use tracing::debug;

use super::service::MemoryRealm;

#[async_trait]
impl AuthenticatingRealm for MemoryRealm {
    fn name(&self) -> &str {
        MemoryRealm::name(self)
    }

    fn supports(&self, token_type: &str) -> bool {
        token_type == USERNAME_PASSWORD
    }

    async fn authentication_info(
        &self,
        token: &AuthenticationToken,
    ) -> Result<Option<AuthenticationInfo>, AuthNError> {
        self.verify(token)
    }

    async fn on_logout(&self, principals: &PrincipalCollection) {
        debug!(realm = MemoryRealm::name(self), principals = %principals, "Logout");
    }
}

#[async_trait]
impl AuthorizingRealm for MemoryRealm {
    fn name(&self) -> &str {
        MemoryRealm::name(self)
    }

    async fn authorization_info(
        &self,
        principals: &PrincipalCollection,
    ) -> Result<Option<AuthorizationInfo>, AuthZError> {
        Ok(self.authorization(principals))
    }
}
