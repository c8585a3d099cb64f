//! Configuration for the in-memory realm.

use std::collections::BTreeMap;

use secrecy::SecretString;
use serde::Deserialize;

pub const DEFAULT_REALM_NAME: &str = "memory";

/// Realm configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryRealmConfig {
    /// Realm name; principals from this realm are keyed by it.
    pub name: String,

    /// How account passwords are stored.
    pub password_format: PasswordFormat,

    pub accounts: Vec<AccountConfig>,

    /// Role name to the permission strings the role grants.
    pub roles: BTreeMap<String, Vec<String>>,
}

impl Default for MemoryRealmConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_REALM_NAME.to_owned(),
            password_format: PasswordFormat::Modular,
            accounts: Vec::new(),
            roles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PasswordFormat {
    /// `$gk1$...` strings produced by `HashService::hash_password`.
    #[default]
    Modular,
    /// Encoded digest plus an optional per-account hex salt, read with the
    /// configured hashing parameters.
    Hashed,
    /// Plain text. Test setups only.
    Plain,
}

/// One account.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountConfig {
    pub username: String,

    /// Stored password in the realm's [`PasswordFormat`].
    pub password: SecretString,

    /// Hex-encoded public salt, for [`PasswordFormat::Hashed`].
    #[serde(default)]
    pub salt: Option<String>,

    #[serde(default)]
    pub roles: Vec<String>,

    /// Permissions granted directly, on top of those of the roles.
    #[serde(default)]
    pub permissions: Vec<String>,

    #[serde(default)]
    pub locked: bool,

    #[serde(default)]
    pub disabled: bool,

    #[serde(default)]
    pub credentials_expired: bool,
}

impl AccountConfig {
    #[must_use]
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_owned(),
            password: SecretString::from(password),
            salt: None,
            roles: Vec::new(),
            permissions: Vec::new(),
            locked: false,
            disabled: false,
            credentials_expired: false,
        }
    }

    #[must_use]
    pub fn with_roles<'a>(mut self, roles: impl IntoIterator<Item = &'a str>) -> Self {
        self.roles.extend(roles.into_iter().map(ToOwned::to_owned));
        self
    }

    #[must_use]
    pub fn with_permissions<'a>(mut self, permissions: impl IntoIterator<Item = &'a str>) -> Self {
        self.permissions
            .extend(permissions.into_iter().map(ToOwned::to_owned));
        self
    }

    #[must_use]
    pub fn with_salt(mut self, salt_hex: &str) -> Self {
        self.salt = Some(salt_hex.to_owned());
        self
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn parses_accounts_and_roles() {
        let cfg: MemoryRealmConfig = serde_json::from_value(serde_json::json!({
            "name": "local",
            "password_format": "plain",
            "accounts": [
                { "username": "alice", "password": "pw", "roles": ["admin"], "locked": true }
            ],
            "roles": { "admin": ["*"] }
        }))
        .unwrap();

        assert_eq!(cfg.name, "local");
        assert_eq!(cfg.password_format, PasswordFormat::Plain);
        let alice = &cfg.accounts[0];
        assert_eq!(alice.password.expose_secret(), "pw");
        assert!(alice.locked);
        assert!(!alice.disabled);
        assert_eq!(cfg.roles["admin"], vec!["*"]);
    }

    #[test]
    #[allow(clippy::use_debug)]
    fn password_is_redacted_in_debug() {
        let account = AccountConfig::new("alice", "hunter2");
        let rendered = format!("{account:?}");
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let bad = serde_json::from_value::<AccountConfig>(serde_json::json!({
            "username": "a", "password": "b", "group": "c"
        }));
        assert!(bad.is_err());
    }
}
