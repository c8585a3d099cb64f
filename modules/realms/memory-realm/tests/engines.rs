#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use authn::{AT_LEAST_ONE, Authenticator, HashService, HashingConfig};
use authn_sdk::{AuthNError, AuthenticationToken};
use authz::ModularRealmAuthorizer;
use memory_realm::{AccountConfig, MemoryRealm, MemoryRealmConfig};

fn realm() -> Arc<MemoryRealm> {
    let hashing = HashingConfig::default();
    let service = HashService::from_config(&hashing).unwrap();

    let mut cfg = MemoryRealmConfig {
        accounts: vec![
            AccountConfig::new("alice", &service.hash_password(b"wonderland").unwrap())
                .with_roles(["admin"]),
            AccountConfig::new("bob", &service.hash_password(b"builder").unwrap())
                .with_permissions(["printer:print:lp7200"]),
            AccountConfig {
                disabled: true,
                ..AccountConfig::new("mallory", &service.hash_password(b"x").unwrap())
            },
        ],
        ..MemoryRealmConfig::default()
    };
    cfg.roles.insert("admin".to_owned(), vec!["*".to_owned()]);

    Arc::new(MemoryRealm::from_config(&cfg, &hashing).unwrap())
}

#[tokio::test]
async fn login_and_authorize_through_both_engines() {
    let realm = realm();
    let authenticator = Authenticator::builder().realm(realm.clone()).build();
    assert_eq!(authenticator.strategy_name(), AT_LEAST_ONE);
    let authorizer = ModularRealmAuthorizer::builder().realm(realm).build();

    let alice = authenticator
        .authenticate(&AuthenticationToken::username_password("alice", "wonderland"))
        .await
        .unwrap();
    assert!(authorizer.has_role(&alice, "admin").await);
    assert!(authorizer.is_permitted(&alice, "anything:at:all").await);

    let bob = authenticator
        .authenticate(&AuthenticationToken::username_password("bob", "builder"))
        .await
        .unwrap();
    assert!(!authorizer.has_role(&bob, "admin").await);
    assert!(authorizer.is_permitted(&bob, "printer:print:lp7200").await);
    assert!(!authorizer.is_permitted(&bob, "printer:print:epsoncolor").await);
    assert!(authorizer.check_permission(&bob, "printer:manage").await.is_err());
}

#[tokio::test]
async fn wrong_password_and_account_states() {
    let authenticator = Authenticator::builder().realm(realm()).build();

    let err = authenticator
        .authenticate(&AuthenticationToken::username_password("alice", "looking-glass"))
        .await
        .unwrap_err();
    assert_eq!(err.last_cause().unwrap().kind(), "incorrect_credentials");

    let err = authenticator
        .authenticate(&AuthenticationToken::username_password("mallory", "x"))
        .await
        .unwrap_err();
    assert!(matches!(
        err.last_cause(),
        Some(AuthNError::DisabledAccount(_))
    ));

    let err = authenticator
        .authenticate(&AuthenticationToken::username_password("nobody", "x"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "aggregate");
    assert!(err.last_cause().is_none());
}
