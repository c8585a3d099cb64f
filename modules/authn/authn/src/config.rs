//! Configuration for credential hashing and matching.

use secrecy::SecretString;
use serde::Deserialize;

pub const DEFAULT_ALGORITHM: &str = "SHA-256";
pub const DEFAULT_ITERATIONS: u32 = 1024;
pub const DEFAULT_PUBLIC_SALT_LEN: usize = 16;
pub const MIN_PUBLIC_SALT_LEN: usize = 8;

/// How a realm stores hashed credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoredEncoding {
    #[default]
    Hex,
    Base64,
    /// Digest bytes stored as-is.
    Raw,
}

/// Hashing configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HashingConfig {
    /// Digest name: `SHA-256`, `SHA-384` or `SHA-512`.
    pub algorithm: String,

    /// Total digest rounds. Values below 1 are treated as 1.
    pub iterations: u32,

    /// Service-wide secret prepended to every public salt.
    pub private_salt: Option<SecretString>,

    /// Length in bytes of generated public salts. At least
    /// [`MIN_PUBLIC_SALT_LEN`].
    pub public_salt_len: usize,

    /// Encoding of stored hashes read by the hashed matcher.
    pub stored_encoding: StoredEncoding,

    /// Derive the salt from the principal when an account has none.
    pub legacy_principal_salt: bool,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            algorithm: DEFAULT_ALGORITHM.to_owned(),
            iterations: DEFAULT_ITERATIONS,
            private_salt: None,
            public_salt_len: DEFAULT_PUBLIC_SALT_LEN,
            stored_encoding: StoredEncoding::Hex,
            legacy_principal_salt: false,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn defaults() {
        let cfg = HashingConfig::default();
        assert_eq!(cfg.algorithm, "SHA-256");
        assert_eq!(cfg.iterations, DEFAULT_ITERATIONS);
        assert!(cfg.private_salt.is_none());
        assert_eq!(cfg.stored_encoding, StoredEncoding::Hex);
        assert!(!cfg.legacy_principal_salt);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: HashingConfig = serde_json::from_value(serde_json::json!({
            "algorithm": "SHA-512",
            "private_salt": "pepper",
            "stored_encoding": "base64"
        }))
        .unwrap();
        assert_eq!(cfg.algorithm, "SHA-512");
        assert_eq!(cfg.iterations, DEFAULT_ITERATIONS);
        assert_eq!(cfg.private_salt.as_ref().map(ExposeSecret::expose_secret), Some("pepper"));
        assert_eq!(cfg.stored_encoding, StoredEncoding::Base64);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let res: Result<HashingConfig, _> =
            serde_json::from_value(serde_json::json!({ "rounds": 3 }));
        assert!(res.is_err());
    }
}
