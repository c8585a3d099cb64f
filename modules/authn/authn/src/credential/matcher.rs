//! Built-in [`CredentialsMatcher`] implementations.

use authn_sdk::{AuthenticationInfo, AuthenticationToken, CredentialsError, CredentialsMatcher};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::hash::{Hash, HashRequest, HashService};
use crate::config::StoredEncoding;

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// Compares the submitted credential with the stored one byte for byte,
/// in constant time. For realms that keep plain or pre-shared secrets.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleCredentialsMatcher;

impl CredentialsMatcher for SimpleCredentialsMatcher {
    fn matches(
        &self,
        token: &AuthenticationToken,
        info: &AuthenticationInfo,
    ) -> Result<bool, CredentialsError> {
        Ok(constant_time_eq(
            token.credential().expose(),
            info.credentials.expose(),
        ))
    }
}

/// Re-hashes the submitted credential with the stored salt and compares the
/// digest with the stored, encoded hash.
#[derive(Debug, Clone)]
pub struct HashedCredentialsMatcher {
    service: HashService,
    encoding: StoredEncoding,
    legacy_principal_salt: bool,
}

impl HashedCredentialsMatcher {
    #[must_use]
    pub fn new(service: HashService) -> Self {
        Self {
            service,
            encoding: StoredEncoding::Hex,
            legacy_principal_salt: false,
        }
    }

    #[must_use]
    pub fn with_encoding(mut self, encoding: StoredEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Salt with the principal name when the account carries no salt.
    /// Only for credentials stored that way by older deployments.
    #[must_use]
    pub fn with_legacy_principal_salt(mut self, enabled: bool) -> Self {
        self.legacy_principal_salt = enabled;
        self
    }

    fn decode_stored(&self, stored: &[u8]) -> Result<Zeroizing<Vec<u8>>, CredentialsError> {
        let decoded = match self.encoding {
            StoredEncoding::Raw => stored.to_vec(),
            StoredEncoding::Hex => hex::decode(stored)
                .map_err(|e| CredentialsError::Encoding(format!("hex: {e}")))?,
            StoredEncoding::Base64 => B64
                .decode(stored)
                .map_err(|e| CredentialsError::Encoding(format!("base64: {e}")))?,
        };
        if decoded.is_empty() {
            return Err(CredentialsError::Malformed("stored hash is empty".to_owned()));
        }
        Ok(Zeroizing::new(decoded))
    }
}

impl CredentialsMatcher for HashedCredentialsMatcher {
    fn matches(
        &self,
        token: &AuthenticationToken,
        info: &AuthenticationInfo,
    ) -> Result<bool, CredentialsError> {
        let stored = self.decode_stored(info.credentials.expose())?;

        let salt: &[u8] = match (&info.salt, self.legacy_principal_salt) {
            (Some(salt), _) => salt.as_slice(),
            (None, true) => token.principal_hint().as_bytes(),
            (None, false) => &[],
        };

        let submitted = self
            .service
            .compute_hash(&HashRequest::new(token.credential().expose()).salt(salt))?;
        Ok(constant_time_eq(submitted.bytes(), &stored))
    }
}

/// Matches against self-describing `$gk1$` stored strings, so accounts
/// hashed with different algorithms or iteration counts can coexist.
#[derive(Debug, Clone, Default)]
pub struct ModularCryptMatcher {
    service: HashService,
}

impl ModularCryptMatcher {
    /// `service` supplies the private salt; algorithm and iterations come
    /// from each stored string.
    #[must_use]
    pub fn new(service: HashService) -> Self {
        Self { service }
    }
}

impl CredentialsMatcher for ModularCryptMatcher {
    fn matches(
        &self,
        token: &AuthenticationToken,
        info: &AuthenticationInfo,
    ) -> Result<bool, CredentialsError> {
        let stored = std::str::from_utf8(info.credentials.expose())
            .map_err(|e| CredentialsError::Encoding(format!("utf-8: {e}")))?;
        let stored = Hash::from_modular(stored)?;

        let submitted = self.service.compute_hash(
            &HashRequest::new(token.credential().expose())
                .salt(stored.salt())
                .iterations(stored.iterations())
                .algorithm(stored.algorithm().name()),
        )?;
        Ok(constant_time_eq(submitted.bytes(), stored.bytes()))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::credential::hash::HashAlgorithm;

    fn token(password: &str) -> AuthenticationToken {
        AuthenticationToken::username_password("alice", password)
    }

    #[test]
    fn simple_matcher_compares_bytes() {
        let info = AuthenticationInfo::new("r", "alice", "secret");
        let m = SimpleCredentialsMatcher;
        assert!(m.matches(&token("secret"), &info).unwrap());
        assert!(!m.matches(&token("secre"), &info).unwrap());
        assert!(!m.matches(&token("secret!"), &info).unwrap());
    }

    #[test]
    fn hashed_matcher_accepts_right_and_rejects_wrong() {
        let svc = HashService::default();
        let hash = svc.compute_hash(&HashRequest::new(b"secret")).unwrap();
        let info = AuthenticationInfo::new("r", "alice", hash.to_hex()).with_salt(hash.salt());

        let m = HashedCredentialsMatcher::new(svc);
        assert!(m.matches(&token("secret"), &info).unwrap());
        assert!(!m.matches(&token("wrong"), &info).unwrap());
    }

    #[test]
    fn hashed_matcher_base64_and_raw_encodings() {
        let svc = HashService::new(HashAlgorithm::Sha512, 3);
        let hash = svc.compute_hash(&HashRequest::new(b"pw")).unwrap();

        let b64 = AuthenticationInfo::new("r", "alice", hash.to_base64()).with_salt(hash.salt());
        let m = HashedCredentialsMatcher::new(svc.clone()).with_encoding(StoredEncoding::Base64);
        assert!(m.matches(&token("pw"), &b64).unwrap());

        let raw = AuthenticationInfo::new("r", "alice", hash.bytes().to_vec()).with_salt(hash.salt());
        let m = HashedCredentialsMatcher::new(svc).with_encoding(StoredEncoding::Raw);
        assert!(m.matches(&token("pw"), &raw).unwrap());
    }

    #[test]
    fn hashed_matcher_reports_malformed_storage() {
        let m = HashedCredentialsMatcher::new(HashService::default());
        let info = AuthenticationInfo::new("r", "alice", "not-hex!");
        assert!(matches!(
            m.matches(&token("x"), &info),
            Err(CredentialsError::Encoding(_))
        ));

        let empty = AuthenticationInfo::new("r", "alice", "");
        assert!(matches!(
            m.matches(&token("x"), &empty),
            Err(CredentialsError::Malformed(_))
        ));
    }

    #[test]
    fn legacy_principal_salt_is_opt_in() {
        let svc = HashService::default();
        let hash = svc
            .compute_hash(&HashRequest::new(b"secret").salt(b"alice"))
            .unwrap();
        let info = AuthenticationInfo::new("r", "alice", hash.to_hex());

        let strict = HashedCredentialsMatcher::new(svc.clone());
        assert!(!strict.matches(&token("secret"), &info).unwrap());

        let legacy = HashedCredentialsMatcher::new(svc).with_legacy_principal_salt(true);
        assert!(legacy.matches(&token("secret"), &info).unwrap());
    }

    #[test]
    fn private_salt_must_agree() {
        let pepper = SecretString::from("pepper");
        let svc = HashService::default().with_private_salt(&pepper);
        let stored = svc.hash_password(b"secret").unwrap();
        let info = AuthenticationInfo::new("r", "alice", stored);

        assert!(ModularCryptMatcher::new(svc).matches(&token("secret"), &info).unwrap());
        assert!(
            !ModularCryptMatcher::default()
                .matches(&token("secret"), &info)
                .unwrap()
        );
    }

    #[test]
    fn modular_matcher_reads_parameters_from_storage() {
        let old = HashService::new(HashAlgorithm::Sha256, 2).hash_password(b"a").unwrap();
        let new = HashService::new(HashAlgorithm::Sha512, 50).hash_password(b"b").unwrap();
        let m = ModularCryptMatcher::default();

        assert!(m.matches(&token("a"), &AuthenticationInfo::new("r", "u", old)).unwrap());
        assert!(m.matches(&token("b"), &AuthenticationInfo::new("r", "u", new)).unwrap());
    }

    #[test]
    fn modular_matcher_rejects_garbage() {
        let m = ModularCryptMatcher::default();
        let info = AuthenticationInfo::new("r", "alice", "plaintext");
        assert!(matches!(
            m.matches(&token("plaintext"), &info),
            Err(CredentialsError::Malformed(_))
        ));
    }
}
