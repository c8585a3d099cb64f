//! Layered configuration.
//!
//! # Load order
//!
//! 1. Defaults (every section is `#[serde(default)]`)
//! 2. An optional YAML file
//! 3. Environment variables prefixed `GATEKEEP_`, nested with `__`
//!    (`GATEKEEP_SESSION__GLOBAL_TIMEOUT=10m`)
//!
//! Each layer overrides the previous. Unknown keys are rejected, including
//! stray `GATEKEEP_*` variables.

use std::collections::BTreeMap;
use std::path::PathBuf;

use authn::{AT_LEAST_ONE, HashingConfig};
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use identity_cache::BoundedCacheConfig;
use serde::Deserialize;
use session::SessionConfig;
use tracing::debug;

use crate::error::ConfigError;
use crate::logging::LoggingConfig;

pub const ENV_PREFIX: &str = "GATEKEEP_";
pub const ENV_SPLIT: &str = "__";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    pub authentication: AuthenticationConfig,
    pub authorization: AuthorizationConfig,
    pub hashing: HashingConfig,
    pub session: SessionConfig,
    /// Sizing of the authorization and session caches.
    pub cache: BoundedCacheConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthenticationConfig {
    /// Registry key of the authentication strategy.
    pub strategy: String,
    /// Realms in consultation order.
    pub realms: Vec<RealmConfig>,
}

impl Default for AuthenticationConfig {
    fn default() -> Self {
        Self {
            strategy: AT_LEAST_ONE.to_owned(),
            realms: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorizationConfig {
    /// Compare permission tokens case-sensitively.
    pub case_sensitive_permissions: bool,
    /// Permissions granted by each role, on top of what realms grant directly.
    pub role_permissions: BTreeMap<String, Vec<String>>,
}

/// One realm instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RealmConfig {
    /// Registry key of the realm factory, e.g. `memory`.
    pub kind: String,
    /// Factory-specific settings, passed through untouched.
    #[serde(default)]
    pub options: serde_json::Value,
}

impl RealmConfig {
    #[must_use]
    pub fn new(kind: &str, options: serde_json::Value) -> Self {
        Self {
            kind: kind.to_owned(),
            options,
        }
    }
}

/// Builds a [`SecurityConfig`] from its layers.
///
/// ```ignore
/// let config = ConfigLoader::new()
///     .with_file("/etc/gatekeep/security.yaml")
///     .load()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    yaml: Option<String>,
    skip_env: bool,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read this YAML file. It must exist.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Inline YAML, layered after the file.
    #[must_use]
    pub fn with_yaml(mut self, yaml: &str) -> Self {
        self.yaml = Some(yaml.to_owned());
        self
    }

    /// Ignore `GATEKEEP_*` environment variables.
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Merge every layer and deserialize the result.
    ///
    /// # Errors
    ///
    /// `MissingFile` if the configured file does not exist, `Load` if any
    /// layer fails to parse or holds unknown keys.
    pub fn load(&self) -> Result<SecurityConfig, ConfigError> {
        let mut figment = Figment::new();

        if let Some(path) = &self.file {
            if !path.is_file() {
                return Err(ConfigError::MissingFile(path.clone()));
            }
            debug!(path = %path.display(), "Loading security configuration file");
            figment = figment.merge(Yaml::file(path));
        }
        if let Some(yaml) = &self.yaml {
            figment = figment.merge(Yaml::string(yaml));
        }
        if !self.skip_env {
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split(ENV_SPLIT));
        }

        figment.extract().map_err(|e| ConfigError::Load(Box::new(e)))
    }
}
