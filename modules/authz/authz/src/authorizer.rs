//! Multi-realm authorizer.
//!
//! A check is granted when any realm named in the principal collection grants
//! it. Missing or failing realm data counts as "nothing granted"; queries
//! never error and the `check_*` forms turn a denial into
//! [`AuthZError::Unauthorized`].

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use authz_sdk::{
    AuthZError, AuthorizationInfo, AuthorizingRealm, Permission, PermissionResolver,
    RolePermissionResolver, WildcardPermissionResolver,
};
use identity_cache::{Cache, CacheManager};
use security_core::PrincipalCollection;
use tracing::{debug, trace, warn};

/// Prefix of the per-realm cache names requested from the cache manager.
pub const AUTHZ_CACHE_PREFIX: &str = "authz:";

/// A realm's authorization data with every permission resolved.
#[derive(Debug, Default)]
pub struct ResolvedAuthorization {
    pub roles: HashSet<String>,
    pub permissions: Vec<Arc<dyn Permission>>,
}

impl ResolvedAuthorization {
    fn implies(&self, permission: &dyn Permission) -> bool {
        self.permissions.iter().any(|p| p.implies(permission))
    }
}

type AuthzCache = Arc<dyn Cache<PrincipalCollection, ResolvedAuthorization>>;

struct RealmEntry {
    realm: Arc<dyn AuthorizingRealm>,
    cache: Option<AuthzCache>,
}

pub struct ModularRealmAuthorizer {
    realms: Vec<RealmEntry>,
    resolver: Arc<dyn PermissionResolver>,
    role_resolver: Option<Arc<dyn RolePermissionResolver>>,
}

impl fmt::Debug for ModularRealmAuthorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModularRealmAuthorizer")
            .field(
                "realms",
                &self.realms.iter().map(|r| r.realm.name()).collect::<Vec<_>>(),
            )
            .field("caching", &self.realms.iter().any(|r| r.cache.is_some()))
            .field("role_resolver", &self.role_resolver.is_some())
            .finish_non_exhaustive()
    }
}

impl ModularRealmAuthorizer {
    #[must_use]
    pub fn builder() -> ModularRealmAuthorizerBuilder {
        ModularRealmAuthorizerBuilder::default()
    }

    /// Whether any realm grants `role`.
    pub async fn has_role(&self, principals: &PrincipalCollection, role: &str) -> bool {
        self.any_realm(principals, |info| info.roles.contains(role))
            .await
    }

    /// One answer per role, in input order.
    pub async fn has_roles(&self, principals: &PrincipalCollection, roles: &[&str]) -> Vec<bool> {
        let mut out = Vec::with_capacity(roles.len());
        for role in roles {
            out.push(self.has_role(principals, role).await);
        }
        out
    }

    /// Every role granted, each by any realm. An empty list is granted.
    pub async fn has_all_roles(&self, principals: &PrincipalCollection, roles: &[&str]) -> bool {
        for role in roles {
            if !self.has_role(principals, role).await {
                return false;
            }
        }
        true
    }

    /// Whether any realm grants a permission implying `permission`.
    ///
    /// An unparseable permission string is denied.
    pub async fn is_permitted(&self, principals: &PrincipalCollection, permission: &str) -> bool {
        match self.resolver.resolve(permission) {
            Ok(p) => self.is_permitted_permission(principals, p.as_ref()).await,
            Err(e) => {
                debug!(permission, error = %e, "Denying unparseable permission");
                false
            }
        }
    }

    /// Whether any realm grants a permission implying `permission`.
    pub async fn is_permitted_permission(
        &self,
        principals: &PrincipalCollection,
        permission: &dyn Permission,
    ) -> bool {
        self.any_realm(principals, |info| info.implies(permission))
            .await
    }

    /// One answer per permission, in input order.
    pub async fn is_permitted_each(
        &self,
        principals: &PrincipalCollection,
        permissions: &[&str],
    ) -> Vec<bool> {
        let mut out = Vec::with_capacity(permissions.len());
        for permission in permissions {
            out.push(self.is_permitted(principals, permission).await);
        }
        out
    }

    /// Every permission granted. An empty list is granted.
    pub async fn is_permitted_all(
        &self,
        principals: &PrincipalCollection,
        permissions: &[&str],
    ) -> bool {
        for permission in permissions {
            if !self.is_permitted(principals, permission).await {
                return false;
            }
        }
        true
    }

    /// # Errors
    ///
    /// [`AuthZError::Unauthorized`] naming the role when it is not granted.
    pub async fn check_role(
        &self,
        principals: &PrincipalCollection,
        role: &str,
    ) -> Result<(), AuthZError> {
        if self.has_role(principals, role).await {
            Ok(())
        } else {
            Err(AuthZError::unauthorized(format!("act as role '{role}'")))
        }
    }

    /// # Errors
    ///
    /// [`AuthZError::Unauthorized`] naming the first role not granted.
    pub async fn check_roles(
        &self,
        principals: &PrincipalCollection,
        roles: &[&str],
    ) -> Result<(), AuthZError> {
        for role in roles {
            self.check_role(principals, role).await?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// - [`AuthZError::InvalidPermission`] when `permission` cannot be parsed
    /// - [`AuthZError::Unauthorized`] naming the permission when it is denied
    pub async fn check_permission(
        &self,
        principals: &PrincipalCollection,
        permission: &str,
    ) -> Result<(), AuthZError> {
        let resolved = self.resolver.resolve(permission)?;
        if self
            .is_permitted_permission(principals, resolved.as_ref())
            .await
        {
            Ok(())
        } else {
            Err(AuthZError::unauthorized(format!(
                "use permission '{permission}'"
            )))
        }
    }

    /// # Errors
    ///
    /// The first failing [`ModularRealmAuthorizer::check_permission`].
    pub async fn check_permissions(
        &self,
        principals: &PrincipalCollection,
        permissions: &[&str],
    ) -> Result<(), AuthZError> {
        for permission in permissions {
            self.check_permission(principals, permission).await?;
        }
        Ok(())
    }

    /// Drop cached authorization data of `principals` in every realm.
    pub fn clear_cache(&self, principals: &PrincipalCollection) {
        let mut removed = 0_usize;
        for entry in &self.realms {
            if let Some(cache) = &entry.cache
                && cache.remove(principals).is_some()
            {
                removed += 1;
            }
        }
        debug!(principals = %principals, removed, "Cleared cached authorization info");
    }

    /// Drop all cached authorization data.
    pub fn clear_all_caches(&self) {
        for entry in &self.realms {
            if let Some(cache) = &entry.cache {
                cache.clear();
            }
        }
    }

    async fn any_realm<F>(&self, principals: &PrincipalCollection, grants: F) -> bool
    where
        F: Fn(&ResolvedAuthorization) -> bool,
    {
        for entry in self.realms_for(principals) {
            if let Some(info) = self.authorization_for(entry, principals).await
                && grants(&info)
            {
                trace!(realm = entry.realm.name(), "Granted");
                return true;
            }
        }
        false
    }

    fn realms_for<'a>(
        &'a self,
        principals: &'a PrincipalCollection,
    ) -> impl Iterator<Item = &'a RealmEntry> + 'a {
        self.realms
            .iter()
            .filter(|e| principals.contains_realm(e.realm.name()))
    }

    /// Cached data, or realm data resolved and cached on first use.
    async fn authorization_for(
        &self,
        entry: &RealmEntry,
        principals: &PrincipalCollection,
    ) -> Option<Arc<ResolvedAuthorization>> {
        if let Some(cached) = entry.cache.as_ref().and_then(|c| c.get(principals)) {
            return Some(cached);
        }

        let info = match entry.realm.authorization_info(principals).await {
            Ok(Some(info)) => info,
            Ok(None) => {
                trace!(realm = entry.realm.name(), "Realm has no authorization info");
                return None;
            }
            Err(e) => {
                warn!(realm = entry.realm.name(), error = %e, "Failed to load authorization info");
                return None;
            }
        };

        let resolved = Arc::new(self.resolve(entry.realm.name(), info));
        if let Some(cache) = &entry.cache {
            cache.put(principals.clone(), Arc::clone(&resolved));
        }
        Some(resolved)
    }

    fn resolve(&self, realm: &str, info: AuthorizationInfo) -> ResolvedAuthorization {
        let mut permissions = info.permissions;
        for s in &info.string_permissions {
            match self.resolver.resolve(s) {
                Ok(p) => permissions.push(p),
                Err(e) => warn!(realm, error = %e, "Ignoring invalid permission from realm"),
            }
        }
        if let Some(role_resolver) = &self.role_resolver {
            for role in &info.roles {
                permissions.extend(role_resolver.resolve_permissions(role));
            }
        }
        ResolvedAuthorization {
            roles: info.roles,
            permissions,
        }
    }
}

pub struct ModularRealmAuthorizerBuilder {
    realms: Vec<Arc<dyn AuthorizingRealm>>,
    resolver: Arc<dyn PermissionResolver>,
    role_resolver: Option<Arc<dyn RolePermissionResolver>>,
    cache_manager: Option<Arc<dyn CacheManager<PrincipalCollection, ResolvedAuthorization>>>,
}

impl Default for ModularRealmAuthorizerBuilder {
    fn default() -> Self {
        Self {
            realms: Vec::new(),
            resolver: Arc::new(WildcardPermissionResolver::default()),
            role_resolver: None,
            cache_manager: None,
        }
    }
}

impl ModularRealmAuthorizerBuilder {
    #[must_use]
    pub fn realm(mut self, realm: Arc<dyn AuthorizingRealm>) -> Self {
        self.realms.push(realm);
        self
    }

    /// Defaults to case-insensitive wildcard parsing.
    #[must_use]
    pub fn permission_resolver(mut self, resolver: Arc<dyn PermissionResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    #[must_use]
    pub fn role_permission_resolver(mut self, resolver: Arc<dyn RolePermissionResolver>) -> Self {
        self.role_resolver = Some(resolver);
        self
    }

    /// Cache realm data per principal collection. Without a manager every
    /// query consults the realms.
    #[must_use]
    pub fn cache_manager(
        mut self,
        manager: Arc<dyn CacheManager<PrincipalCollection, ResolvedAuthorization>>,
    ) -> Self {
        self.cache_manager = Some(manager);
        self
    }

    #[must_use]
    pub fn build(self) -> ModularRealmAuthorizer {
        let cache_manager = self.cache_manager;
        let realms = self
            .realms
            .into_iter()
            .map(|realm| RealmEntry {
                cache: cache_manager
                    .as_ref()
                    .map(|m| m.get_cache(&format!("{AUTHZ_CACHE_PREFIX}{}", realm.name()))),
                realm,
            })
            .collect();
        ModularRealmAuthorizer {
            realms,
            resolver: self.resolver,
            role_resolver: self.role_resolver,
        }
    }
}
