//! String-to-permission resolution.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::AuthZError;
use crate::permission::{Permission, WildcardPermission};

/// Turns permission strings into [`Permission`] values.
pub trait PermissionResolver: Send + Sync {
    /// # Errors
    ///
    /// [`AuthZError::InvalidPermission`] when `s` cannot be parsed.
    fn resolve(&self, s: &str) -> Result<Arc<dyn Permission>, AuthZError>;
}

/// Resolves every string as a [`WildcardPermission`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WildcardPermissionResolver {
    case_sensitive: bool,
}

impl WildcardPermissionResolver {
    #[must_use]
    pub fn new(case_sensitive: bool) -> Self {
        Self { case_sensitive }
    }
}

impl PermissionResolver for WildcardPermissionResolver {
    fn resolve(&self, s: &str) -> Result<Arc<dyn Permission>, AuthZError> {
        Ok(Arc::new(WildcardPermission::parse_with_case(
            s,
            self.case_sensitive,
        )?))
    }
}

/// Expands a role name into the permissions it grants.
pub trait RolePermissionResolver: Send + Sync {
    fn resolve_permissions(&self, role: &str) -> Vec<Arc<dyn Permission>>;
}

/// Role to permission table fixed at construction.
#[derive(Debug, Default)]
pub struct StaticRolePermissionResolver {
    roles: HashMap<String, Vec<Arc<dyn Permission>>>,
}

impl StaticRolePermissionResolver {
    /// Parse every permission string of every role up front.
    ///
    /// # Errors
    ///
    /// The first [`AuthZError::InvalidPermission`] encountered.
    pub fn from_strings<'a, I, P>(
        table: I,
        resolver: &dyn PermissionResolver,
    ) -> Result<Self, AuthZError>
    where
        I: IntoIterator<Item = (&'a str, P)>,
        P: IntoIterator<Item = &'a str>,
    {
        let mut roles = HashMap::new();
        for (role, permissions) in table {
            let resolved = permissions
                .into_iter()
                .map(|p| resolver.resolve(p))
                .collect::<Result<Vec<_>, _>>()?;
            roles.insert(role.to_owned(), resolved);
        }
        Ok(Self { roles })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl RolePermissionResolver for StaticRolePermissionResolver {
    fn resolve_permissions(&self, role: &str) -> Vec<Arc<dyn Permission>> {
        self.roles.get(role).cloned().unwrap_or_default()
    }
}
