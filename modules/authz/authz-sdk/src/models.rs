use std::collections::HashSet;
use std::sync::Arc;

use crate::permission::Permission;

/// Roles and permissions a realm grants to a principal set.
///
/// Permissions come in two forms: strings that the authorizer resolves
/// (e.g. `document:read`) and already built [`Permission`] objects.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationInfo {
    pub roles: HashSet<String>,
    pub string_permissions: HashSet<String>,
    pub permissions: Vec<Arc<dyn Permission>>,
}

impl AuthorizationInfo {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_role(mut self, role: &str) -> Self {
        self.roles.insert(role.to_owned());
        self
    }

    #[must_use]
    pub fn with_roles<'a>(mut self, roles: impl IntoIterator<Item = &'a str>) -> Self {
        self.roles.extend(roles.into_iter().map(ToOwned::to_owned));
        self
    }

    #[must_use]
    pub fn with_permission(mut self, permission: &str) -> Self {
        self.string_permissions.insert(permission.to_owned());
        self
    }

    #[must_use]
    pub fn with_permissions<'a>(mut self, permissions: impl IntoIterator<Item = &'a str>) -> Self {
        self.string_permissions
            .extend(permissions.into_iter().map(ToOwned::to_owned));
        self
    }

    #[must_use]
    pub fn with_object_permission(mut self, permission: Arc<dyn Permission>) -> Self {
        self.permissions.push(permission);
        self
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// No roles and no permissions of either form.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty() && self.string_permissions.is_empty() && self.permissions.is_empty()
    }
}
