use security_core::PrincipalCollection;

use crate::token::Credential;

/// Account data a realm found for a submitted token.
///
/// Only the merged principals ever leave the authenticator; the stored
/// credential and salt stay between the realm and its matcher.
#[derive(Debug, Clone, Default)]
pub struct AuthenticationInfo {
    pub principals: PrincipalCollection,
    /// Stored credential as the realm keeps it (plain, hex, base64 or modular form).
    pub credentials: Credential,
    /// Per-record public salt, when the stored credential was hashed with one.
    pub salt: Option<Vec<u8>>,
}

impl AuthenticationInfo {
    /// Info for one principal of `realm` with its stored credential.
    #[must_use]
    pub fn new(realm: &str, principal: &str, credentials: impl Into<Credential>) -> Self {
        Self {
            principals: PrincipalCollection::single(realm, principal),
            credentials: credentials.into(),
            salt: None,
        }
    }

    #[must_use]
    pub fn with_salt(mut self, salt: impl Into<Vec<u8>>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    /// Fold another realm's result into this one.
    ///
    /// Principals are appended with duplicates dropped. Credentials and salt
    /// are kept from the first contributor.
    pub fn merge(&mut self, other: &AuthenticationInfo) {
        self.principals.add_all(&other.principals);
        if self.credentials.is_empty() {
            self.credentials = other.credentials.clone();
        }
        if self.salt.is_none() {
            self.salt.clone_from(&other.salt);
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn merge_appends_principals_and_keeps_first_credentials() {
        let mut acc = AuthenticationInfo::default();
        acc.merge(&AuthenticationInfo::new("ldap", "alice", "h1").with_salt(b"s1".to_vec()));
        acc.merge(&AuthenticationInfo::new("db", "alice", "h2").with_salt(b"s2".to_vec()));
        acc.merge(&AuthenticationInfo::new("ldap", "alice", "h3"));

        assert_eq!(acc.principals.len(), 2);
        assert_eq!(acc.principals.realm_names(), vec!["ldap", "db"]);
        assert_eq!(acc.credentials.expose(), b"h1");
        assert_eq!(acc.salt.as_deref(), Some(&b"s1"[..]));
    }
}
