//! Account store of the in-memory realm.

use std::collections::HashMap;
use std::sync::Arc;

use authn::{HashService, HashedCredentialsMatcher, HashingConfig, ModularCryptMatcher, SimpleCredentialsMatcher};
use authn_sdk::{
    AuthNError, AuthenticationInfo, AuthenticationToken, CredentialsMatcher,
    assert_credentials_match,
};
use authz_sdk::AuthorizationInfo;
use secrecy::{ExposeSecret, SecretString};
use security_core::PrincipalCollection;
use tracing::debug;

use crate::config::{AccountConfig, MemoryRealmConfig, PasswordFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccountState {
    Active,
    Disabled,
    Locked,
    CredentialsExpired,
}

impl AccountState {
    fn from_flags(cfg: &AccountConfig) -> Self {
        if cfg.disabled {
            Self::Disabled
        } else if cfg.locked {
            Self::Locked
        } else if cfg.credentials_expired {
            Self::CredentialsExpired
        } else {
            Self::Active
        }
    }
}

struct Account {
    password: SecretString,
    salt: Option<Vec<u8>>,
    roles: Vec<String>,
    permissions: Vec<String>,
    state: AccountState,
}

/// Realm over a fixed set of configured accounts.
pub struct MemoryRealm {
    name: String,
    accounts: HashMap<String, Account>,
    role_permissions: HashMap<String, Vec<String>>,
    matcher: Arc<dyn CredentialsMatcher>,
}

impl MemoryRealm {
    /// Build the realm. `hashing` configures the matcher for hashed formats.
    ///
    /// # Errors
    ///
    /// `Configuration` for duplicate usernames or undecodable salts,
    /// `Credentials` for an unsupported hash algorithm.
    pub fn from_config(cfg: &MemoryRealmConfig, hashing: &HashingConfig) -> Result<Self, AuthNError> {
        let matcher: Arc<dyn CredentialsMatcher> = match cfg.password_format {
            PasswordFormat::Modular => {
                Arc::new(ModularCryptMatcher::new(HashService::from_config(hashing)?))
            }
            PasswordFormat::Hashed => Arc::new(
                HashedCredentialsMatcher::new(HashService::from_config(hashing)?)
                    .with_encoding(hashing.stored_encoding)
                    .with_legacy_principal_salt(hashing.legacy_principal_salt),
            ),
            PasswordFormat::Plain => Arc::new(SimpleCredentialsMatcher),
        };

        let mut accounts = HashMap::with_capacity(cfg.accounts.len());
        for account in &cfg.accounts {
            let salt = account
                .salt
                .as_deref()
                .map(hex::decode)
                .transpose()
                .map_err(|e| {
                    AuthNError::Configuration(format!(
                        "account '{}' has an invalid salt: {e}",
                        account.username
                    ))
                })?;
            let entry = Account {
                password: account.password.clone(),
                salt,
                roles: account.roles.clone(),
                permissions: account.permissions.clone(),
                state: AccountState::from_flags(account),
            };
            if accounts.insert(account.username.clone(), entry).is_some() {
                return Err(AuthNError::Configuration(format!(
                    "duplicate account '{}' in realm '{}'",
                    account.username, cfg.name
                )));
            }
        }

        debug!(
            realm = %cfg.name,
            accounts = accounts.len(),
            roles = cfg.roles.len(),
            "Memory realm loaded"
        );
        Ok(Self {
            name: cfg.name.clone(),
            accounts,
            role_permissions: cfg
                .roles
                .iter()
                .map(|(role, perms)| (role.clone(), perms.clone()))
                .collect(),
            matcher,
        })
    }

    /// Replace the credentials matcher chosen from the password format.
    #[must_use]
    pub fn with_matcher(mut self, matcher: Arc<dyn CredentialsMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Usernames in sorted order.
    #[must_use]
    pub fn usernames(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.accounts.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Verify a username/password token against the stored account.
    ///
    /// Credentials are checked before account state, so a locked or disabled
    /// account is only reported to callers who know its password.
    pub(super) fn verify(
        &self,
        token: &AuthenticationToken,
    ) -> Result<Option<AuthenticationInfo>, AuthNError> {
        let username = token.principal_hint();
        let Some(account) = self.accounts.get(username) else {
            return Ok(None);
        };

        let mut info =
            AuthenticationInfo::new(&self.name, username, account.password.expose_secret());
        if let Some(salt) = &account.salt {
            info = info.with_salt(salt.clone());
        }
        assert_credentials_match(self.matcher.as_ref(), token, &info)?;

        match account.state {
            AccountState::Active => Ok(Some(info)),
            AccountState::Disabled => Err(AuthNError::DisabledAccount(username.to_owned())),
            AccountState::Locked => Err(AuthNError::LockedAccount(username.to_owned())),
            AccountState::CredentialsExpired => {
                Err(AuthNError::ExpiredCredentials(username.to_owned()))
            }
        }
    }

    /// Roles and permissions of every principal this realm contributed.
    pub(super) fn authorization(&self, principals: &PrincipalCollection) -> Option<AuthorizationInfo> {
        let mut info = AuthorizationInfo::new();
        let mut found = false;

        for username in principals.from_realm(&self.name) {
            let Some(account) = self.accounts.get(username) else {
                continue;
            };
            found = true;
            info = info
                .with_roles(account.roles.iter().map(String::as_str))
                .with_permissions(account.permissions.iter().map(String::as_str));
            for role in &account.roles {
                if let Some(perms) = self.role_permissions.get(role) {
                    info = info.with_permissions(perms.iter().map(String::as_str));
                }
            }
        }

        found.then_some(info)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn plain(accounts: Vec<AccountConfig>) -> MemoryRealmConfig {
        MemoryRealmConfig {
            password_format: PasswordFormat::Plain,
            accounts,
            ..MemoryRealmConfig::default()
        }
    }

    #[test]
    fn duplicate_accounts_are_rejected() {
        let cfg = plain(vec![
            AccountConfig::new("alice", "a"),
            AccountConfig::new("alice", "b"),
        ]);
        let err = MemoryRealm::from_config(&cfg, &HashingConfig::default())
            .err()
            .unwrap();
        assert_eq!(err.kind(), "configuration");
    }

    #[test]
    fn invalid_salt_is_rejected() {
        let cfg = plain(vec![AccountConfig::new("alice", "a").with_salt("zz")]);
        assert!(MemoryRealm::from_config(&cfg, &HashingConfig::default()).is_err());
    }

    #[test]
    fn unsupported_algorithm_is_rejected() {
        let hashing = HashingConfig {
            algorithm: "MD5".to_owned(),
            ..HashingConfig::default()
        };
        let err = MemoryRealm::from_config(&MemoryRealmConfig::default(), &hashing)
            .err()
            .unwrap();
        assert!(matches!(err, AuthNError::Credentials(_)));
    }

    #[test]
    fn verify_checks_password_then_state() {
        let locked = AccountConfig {
            locked: true,
            ..AccountConfig::new("bob", "pw")
        };
        let realm = MemoryRealm::from_config(
            &plain(vec![AccountConfig::new("alice", "pw"), locked]),
            &HashingConfig::default(),
        )
        .unwrap();

        let ok = realm
            .verify(&AuthenticationToken::username_password("alice", "pw"))
            .unwrap()
            .unwrap();
        assert_eq!(ok.principals.primary(), Some("alice"));

        assert!(matches!(
            realm.verify(&AuthenticationToken::username_password("bob", "nope")),
            Err(AuthNError::IncorrectCredentials(_))
        ));
        assert!(matches!(
            realm.verify(&AuthenticationToken::username_password("bob", "pw")),
            Err(AuthNError::LockedAccount(_))
        ));
        assert!(
            realm
                .verify(&AuthenticationToken::username_password("carol", "pw"))
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn account_state_precedence() {
        let all_flags = AccountConfig {
            disabled: true,
            locked: true,
            credentials_expired: true,
            ..AccountConfig::new("x", "pw")
        };
        assert_eq!(AccountState::from_flags(&all_flags), AccountState::Disabled);

        let expired = AccountConfig {
            credentials_expired: true,
            ..AccountConfig::new("x", "pw")
        };
        assert_eq!(
            AccountState::from_flags(&expired),
            AccountState::CredentialsExpired
        );
    }

    #[test]
    fn authorization_expands_roles() {
        let mut cfg = plain(vec![
            AccountConfig::new("alice", "pw")
                .with_roles(["editor"])
                .with_permissions(["report:read"]),
        ]);
        cfg.roles
            .insert("editor".to_owned(), vec!["doc:edit,view".to_owned()]);
        let realm = MemoryRealm::from_config(&cfg, &HashingConfig::default()).unwrap();

        let info = realm
            .authorization(&PrincipalCollection::single("memory", "alice"))
            .unwrap();
        assert!(info.has_role("editor"));
        assert!(info.string_permissions.contains("report:read"));
        assert!(info.string_permissions.contains("doc:edit,view"));

        assert!(
            realm
                .authorization(&PrincipalCollection::single("ldap", "alice"))
                .is_none()
        );
    }

    #[test]
    fn usernames_sorted() {
        let realm = MemoryRealm::from_config(
            &plain(vec![AccountConfig::new("zed", "a"), AccountConfig::new("amy", "b")]),
            &HashingConfig::default(),
        )
        .unwrap();
        assert_eq!(realm.usernames(), vec!["amy", "zed"]);
    }
}
