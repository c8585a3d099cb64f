//! Salted, iterated hashing of credentials.
//!
//! The digest input is `private salt || public salt || source`, hashed once and
//! then re-hashed `iterations - 1` more times. The private salt is a
//! service-wide secret and is never part of a [`Hash`]; the public salt is
//! random per record and is returned so callers can store it.

use std::fmt;
use std::str::FromStr;

use authn_sdk::CredentialsError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use crate::config::{HashingConfig, MIN_PUBLIC_SALT_LEN};

/// Prefix of the self-describing stored form produced by [`Hash::to_modular`].
pub const MODULAR_PREFIX: &str = "$gk1$";

/// Supported digest families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
        }
    }

    fn digest(self, salt: &[u8], source: &[u8], iterations: u32) -> Vec<u8> {
        match self {
            Self::Sha256 => iterate::<Sha256>(salt, source, iterations),
            Self::Sha384 => iterate::<Sha384>(salt, source, iterations),
            Self::Sha512 => iterate::<Sha512>(salt, source, iterations),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = CredentialsError;

    /// Accepts `SHA-256`, `sha256`, `Sha-512`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            _ => Err(CredentialsError::UnsupportedAlgorithm(s.to_owned())),
        }
    }
}

fn iterate<D: Digest>(salt: &[u8], source: &[u8], iterations: u32) -> Vec<u8> {
    let mut digest = D::new();
    digest.update(salt);
    digest.update(source);
    let mut hashed = digest.finalize();
    for _ in 1..iterations.max(1) {
        hashed = D::digest(&hashed);
    }
    hashed.to_vec()
}

/// Input of [`HashService::compute_hash`]. Unset fields fall back to the
/// service's configuration; an unset salt means "generate one".
#[derive(Clone, Copy)]
pub struct HashRequest<'a> {
    source: &'a [u8],
    salt: Option<&'a [u8]>,
    iterations: Option<u32>,
    algorithm: Option<&'a str>,
}

impl<'a> HashRequest<'a> {
    #[must_use]
    pub fn new(source: &'a [u8]) -> Self {
        Self {
            source,
            salt: None,
            iterations: None,
            algorithm: None,
        }
    }

    /// Explicit public salt. An empty slice hashes without a public salt.
    #[must_use]
    pub fn salt(mut self, salt: &'a [u8]) -> Self {
        self.salt = Some(salt);
        self
    }

    #[must_use]
    pub fn iterations(mut self, iterations: u32) -> Self {
        self.iterations = Some(iterations);
        self
    }

    #[must_use]
    pub fn algorithm(mut self, algorithm: &'a str) -> Self {
        self.algorithm = Some(algorithm);
        self
    }
}

/// Result of hashing: digest bytes plus everything needed to recompute them,
/// except the private salt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hash {
    algorithm: HashAlgorithm,
    bytes: Vec<u8>,
    salt: Vec<u8>,
    iterations: u32,
}

impl Hash {
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The public salt, empty when none was used.
    #[must_use]
    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    #[must_use]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    #[must_use]
    pub fn to_base64(&self) -> String {
        B64.encode(&self.bytes)
    }

    /// `$gk1$<ALG>$<ITER>$<b64 salt>$<b64 hash>`
    #[must_use]
    pub fn to_modular(&self) -> String {
        format!(
            "{MODULAR_PREFIX}{}${}${}${}",
            self.algorithm,
            self.iterations,
            B64.encode(&self.salt),
            B64.encode(&self.bytes)
        )
    }

    /// Parse the form written by [`Hash::to_modular`].
    ///
    /// # Errors
    ///
    /// [`CredentialsError`] when the string is not in that form.
    pub fn from_modular(stored: &str) -> Result<Self, CredentialsError> {
        let rest = stored
            .strip_prefix(MODULAR_PREFIX)
            .ok_or_else(|| CredentialsError::Malformed("missing $gk1$ prefix".to_owned()))?;
        let fields: Vec<&str> = rest.split('$').collect();
        let [alg, iterations, salt, bytes] = fields.as_slice() else {
            return Err(CredentialsError::Malformed(format!(
                "expected 4 fields after prefix, found {}",
                fields.len()
            )));
        };

        let algorithm = alg.parse::<HashAlgorithm>()?;
        let iterations = iterations
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                CredentialsError::Malformed(format!("invalid iteration count '{iterations}'"))
            })?;
        let salt = B64
            .decode(salt)
            .map_err(|e| CredentialsError::Encoding(format!("salt: {e}")))?;
        let bytes = B64
            .decode(bytes)
            .map_err(|e| CredentialsError::Encoding(format!("hash: {e}")))?;
        if bytes.is_empty() {
            return Err(CredentialsError::Malformed("empty hash".to_owned()));
        }

        Ok(Self {
            algorithm,
            bytes,
            salt,
            iterations,
        })
    }
}

/// Computes salted, iterated hashes.
#[derive(Clone)]
pub struct HashService {
    algorithm: HashAlgorithm,
    iterations: u32,
    private_salt: Zeroizing<Vec<u8>>,
    public_salt_len: usize,
}

impl fmt::Debug for HashService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashService")
            .field("algorithm", &self.algorithm)
            .field("iterations", &self.iterations)
            .field("private_salt", &"[REDACTED]")
            .field("public_salt_len", &self.public_salt_len)
            .finish()
    }
}

impl Default for HashService {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            iterations: crate::config::DEFAULT_ITERATIONS,
            private_salt: Zeroizing::new(Vec::new()),
            public_salt_len: crate::config::DEFAULT_PUBLIC_SALT_LEN,
        }
    }
}

impl HashService {
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, iterations: u32) -> Self {
        Self {
            algorithm,
            iterations: iterations.max(1),
            ..Self::default()
        }
    }

    /// Build from configuration.
    ///
    /// # Errors
    ///
    /// `UnsupportedAlgorithm` for an unknown algorithm name, `SaltTooShort`
    /// when `public_salt_len` is below [`MIN_PUBLIC_SALT_LEN`].
    pub fn from_config(cfg: &HashingConfig) -> Result<Self, CredentialsError> {
        if cfg.public_salt_len < MIN_PUBLIC_SALT_LEN {
            return Err(CredentialsError::SaltTooShort {
                len: cfg.public_salt_len,
                min: MIN_PUBLIC_SALT_LEN,
            });
        }
        let mut service = Self::new(cfg.algorithm.parse()?, cfg.iterations);
        if let Some(salt) = &cfg.private_salt {
            service = service.with_private_salt(salt);
        }
        Ok(service.with_public_salt_len(cfg.public_salt_len))
    }

    /// Service-wide secret salt prepended to every public salt.
    #[must_use]
    pub fn with_private_salt(mut self, salt: &SecretString) -> Self {
        self.private_salt = Zeroizing::new(salt.expose_secret().as_bytes().to_vec());
        self
    }

    /// Lengths below [`MIN_PUBLIC_SALT_LEN`] are raised to it.
    #[must_use]
    pub fn with_public_salt_len(mut self, len: usize) -> Self {
        self.public_salt_len = len.max(MIN_PUBLIC_SALT_LEN);
        self
    }

    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    #[must_use]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Hash `request.source`.
    ///
    /// Without an explicit salt a fresh random public salt is generated and
    /// returned in the [`Hash`].
    ///
    /// # Errors
    ///
    /// `UnsupportedAlgorithm` when the request names an unknown algorithm.
    pub fn compute_hash(&self, request: &HashRequest<'_>) -> Result<Hash, CredentialsError> {
        let algorithm = match request.algorithm {
            Some(name) => name.parse()?,
            None => self.algorithm,
        };
        let iterations = request.iterations.unwrap_or(self.iterations).max(1);
        let public_salt = match request.salt {
            Some(salt) => salt.to_vec(),
            None => self.generate_salt(),
        };

        let mut combined = Zeroizing::new(Vec::with_capacity(
            self.private_salt.len() + public_salt.len(),
        ));
        combined.extend_from_slice(&self.private_salt);
        combined.extend_from_slice(&public_salt);

        Ok(Hash {
            algorithm,
            bytes: algorithm.digest(&combined, request.source, iterations),
            salt: public_salt,
            iterations,
        })
    }

    /// Hash a new password with a fresh salt and return its stored form.
    ///
    /// # Errors
    ///
    /// Propagates [`HashService::compute_hash`] errors.
    pub fn hash_password(&self, password: &[u8]) -> Result<String, CredentialsError> {
        self.compute_hash(&HashRequest::new(password))
            .map(|h| h.to_modular())
    }

    fn generate_salt(&self) -> Vec<u8> {
        let mut salt = vec![0_u8; self.public_salt_len];
        rand::rng().fill_bytes(&mut salt);
        salt
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn no_explicit_salt_is_random_per_call() {
        let svc = HashService::default();
        for source in ["", "secret", "correct horse battery staple"] {
            let a = svc.compute_hash(&HashRequest::new(source.as_bytes())).unwrap();
            let b = svc.compute_hash(&HashRequest::new(source.as_bytes())).unwrap();
            assert_ne!(a.salt(), b.salt());
            assert_ne!(a.bytes(), b.bytes());
            assert_eq!(a.salt().len(), crate::config::DEFAULT_PUBLIC_SALT_LEN);
        }
    }

    #[test]
    fn zero_salt_length_still_salts_randomly() {
        let svc = HashService::default().with_public_salt_len(0);
        let a = svc.compute_hash(&HashRequest::new(b"secret")).unwrap();
        let b = svc.compute_hash(&HashRequest::new(b"secret")).unwrap();
        assert_eq!(a.salt().len(), MIN_PUBLIC_SALT_LEN);
        assert_ne!(a.salt(), b.salt());
        assert_ne!(a.bytes(), b.bytes());
    }

    #[test]
    fn config_with_short_salt_is_rejected() {
        let cfg: HashingConfig =
            serde_json::from_value(serde_json::json!({ "public_salt_len": 0 })).unwrap();
        assert_eq!(
            HashService::from_config(&cfg).unwrap_err(),
            CredentialsError::SaltTooShort {
                len: 0,
                min: MIN_PUBLIC_SALT_LEN
            }
        );

        let cfg = HashingConfig {
            public_salt_len: MIN_PUBLIC_SALT_LEN,
            ..HashingConfig::default()
        };
        let svc = HashService::from_config(&cfg).unwrap();
        let hash = svc.compute_hash(&HashRequest::new(b"secret")).unwrap();
        assert_eq!(hash.salt().len(), MIN_PUBLIC_SALT_LEN);
    }

    #[test]
    fn explicit_salt_is_reproducible() {
        let svc = HashService::default();
        let req = HashRequest::new(b"secret").salt(b"NaCl");
        let a = svc.compute_hash(&req).unwrap();
        let b = svc.compute_hash(&req).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.salt(), b"NaCl");
    }

    #[test]
    fn different_sources_differ_under_same_salt() {
        let svc = HashService::default();
        let samples = ["a", "b", "secret", "Secret", "secret ", "p@ss", "pass"];
        let hashes: Vec<Vec<u8>> = samples
            .iter()
            .map(|s| {
                svc.compute_hash(&HashRequest::new(s.as_bytes()).salt(b"k"))
                    .unwrap()
                    .bytes()
                    .to_vec()
            })
            .collect();
        for (i, a) in hashes.iter().enumerate() {
            for b in &hashes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn private_salt_changes_the_digest() {
        let plain = HashService::default();
        let peppered = HashService::default().with_private_salt(&SecretString::from("pepper"));
        let req = HashRequest::new(b"secret").salt(b"NaCl");

        let a = plain.compute_hash(&req).unwrap();
        let b = peppered.compute_hash(&req).unwrap();
        assert_ne!(a.bytes(), b.bytes());
        assert_eq!(b.salt(), b"NaCl", "private salt never leaks into the result");
    }

    #[test]
    fn single_iteration_is_plain_salted_digest() {
        let svc = HashService::new(HashAlgorithm::Sha256, 1);
        let h = svc
            .compute_hash(&HashRequest::new(b"abc").salt(b"xy"))
            .unwrap();
        let expected = Sha256::digest(b"xyabc");
        assert_eq!(h.bytes(), expected.as_slice());
    }

    #[test]
    fn iterations_rehash_the_previous_digest() {
        let svc = HashService::new(HashAlgorithm::Sha256, 1);
        let h = svc
            .compute_hash(&HashRequest::new(b"abc").salt(b"xy").iterations(3))
            .unwrap();
        let once = Sha256::digest(b"xyabc");
        let twice = Sha256::digest(once);
        let thrice = Sha256::digest(twice);
        assert_eq!(h.bytes(), thrice.as_slice());
        assert_eq!(h.iterations(), 3);
    }

    #[test]
    fn algorithm_by_name() {
        let svc = HashService::default();
        let h = svc
            .compute_hash(&HashRequest::new(b"x").salt(b"").algorithm("sha-512"))
            .unwrap();
        assert_eq!(h.algorithm(), HashAlgorithm::Sha512);
        assert_eq!(h.bytes().len(), 64);

        let err = svc
            .compute_hash(&HashRequest::new(b"x").algorithm("md5"))
            .unwrap_err();
        assert_eq!(err, CredentialsError::UnsupportedAlgorithm("md5".to_owned()));
    }

    #[test]
    fn modular_form_parses_back() {
        let svc = HashService::new(HashAlgorithm::Sha384, 7);
        let h = svc.compute_hash(&HashRequest::new(b"secret")).unwrap();
        let stored = h.to_modular();
        assert!(stored.starts_with("$gk1$SHA-384$7$"));
        assert_eq!(Hash::from_modular(&stored).unwrap(), h);
    }

    #[test]
    fn malformed_modular_forms_are_rejected() {
        for bad in [
            "plain",
            "$gk1$SHA-256$1$c2FsdA==",
            "$gk1$MD5$1$c2FsdA==$aGFzaA==",
            "$gk1$SHA-256$zero$c2FsdA==$aGFzaA==",
            "$gk1$SHA-256$0$c2FsdA==$aGFzaA==",
            "$gk1$SHA-256$1$!!!$aGFzaA==",
            "$gk1$SHA-256$1$c2FsdA==$",
        ] {
            assert!(Hash::from_modular(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn hex_and_base64_render_the_digest() {
        let svc = HashService::new(HashAlgorithm::Sha256, 1);
        let h = svc.compute_hash(&HashRequest::new(b"abc").salt(b"")).unwrap();
        assert_eq!(
            h.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(h.to_base64(), "ungWv48Bz+pBQUDeXa4iI7ADYaOWF3qctBD/YfIAFa0=");
    }
}
