#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use authz::{ModularRealmAuthorizer, ResolvedAuthorization};
use authz_sdk::{
    AuthZError, AuthorizationInfo, AuthorizingRealm, StaticRolePermissionResolver,
    WildcardPermissionResolver,
};
use identity_cache::BoundedCacheManager;
use security_core::PrincipalCollection;

/// Grants roles only; every permission has to come from the role table.
struct DirectoryRealm {
    loads: AtomicUsize,
}

#[async_trait]
impl AuthorizingRealm for DirectoryRealm {
    fn name(&self) -> &str {
        "directory"
    }

    async fn authorization_info(
        &self,
        principals: &PrincipalCollection,
    ) -> Result<Option<AuthorizationInfo>, AuthZError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(match principals.from_realm("directory").first().copied() {
            Some("alice") => Some(AuthorizationInfo::new().with_roles(["editor", "auditor"])),
            Some("bob") => Some(AuthorizationInfo::new().with_role("viewer")),
            _ => None,
        })
    }
}

fn role_table() -> StaticRolePermissionResolver {
    StaticRolePermissionResolver::from_strings(
        [
            ("editor", vec!["doc:read,write"]),
            ("auditor", vec!["report:*"]),
            ("viewer", vec!["doc:read"]),
        ],
        &WildcardPermissionResolver::default(),
    )
    .unwrap()
}

fn directory(name: &str) -> PrincipalCollection {
    PrincipalCollection::single("directory", name)
}

#[tokio::test]
async fn roles_expand_into_permissions() {
    let authz = ModularRealmAuthorizer::builder()
        .realm(Arc::new(DirectoryRealm {
            loads: AtomicUsize::new(0),
        }))
        .role_permission_resolver(Arc::new(role_table()))
        .build();

    assert!(authz.is_permitted(&directory("alice"), "doc:write:42").await);
    assert!(authz.is_permitted(&directory("alice"), "report:export").await);
    assert!(authz.is_permitted(&directory("bob"), "doc:read").await);
    assert!(!authz.is_permitted(&directory("bob"), "doc:write").await);
    assert!(
        authz
            .check_permission(&directory("bob"), "report:view")
            .await
            .is_err()
    );
}

#[tokio::test]
async fn without_a_role_table_roles_grant_no_permissions() {
    let authz = ModularRealmAuthorizer::builder()
        .realm(Arc::new(DirectoryRealm {
            loads: AtomicUsize::new(0),
        }))
        .build();

    assert!(authz.has_role(&directory("alice"), "editor").await);
    assert!(!authz.is_permitted(&directory("alice"), "doc:read").await);
}

#[tokio::test]
async fn expanded_permissions_are_cached() {
    let realm = Arc::new(DirectoryRealm {
        loads: AtomicUsize::new(0),
    });
    let authz = ModularRealmAuthorizer::builder()
        .realm(realm.clone())
        .role_permission_resolver(Arc::new(role_table()))
        .cache_manager(Arc::new(
            BoundedCacheManager::<PrincipalCollection, ResolvedAuthorization>::default(),
        ))
        .build();

    let alice = directory("alice");
    assert!(authz.is_permitted(&alice, "doc:write").await);
    assert!(authz.is_permitted(&alice, "report:view").await);
    assert_eq!(realm.loads.load(Ordering::SeqCst), 1);
}
