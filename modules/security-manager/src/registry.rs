//! Named factories for realms and authentication strategies.
//!
//! Configuration refers to components by key. The host registers its own
//! factories next to the built-in ones before building the manager.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use authn::{
    ALL_SUCCESSFUL, AT_LEAST_ONE, AllSuccessful, AtLeastOneSuccessful, AuthenticationStrategy,
    FIRST_SUCCESSFUL, FirstSuccessful, HashingConfig,
};
use authn_sdk::AuthenticatingRealm;
use authz_sdk::AuthorizingRealm;
use memory_realm::{MemoryRealm, MemoryRealmConfig};

use crate::config::RealmConfig;
use crate::error::ConfigError;

/// Registry key of [`MemoryRealm`].
pub const MEMORY_REALM: &str = "memory";

/// What a realm factory gets to work with.
pub struct RealmContext<'a> {
    pub options: &'a serde_json::Value,
    pub hashing: &'a HashingConfig,
}

pub type RealmFactory = Arc<dyn Fn(&RealmContext<'_>) -> anyhow::Result<RealmHandle> + Send + Sync>;

pub type StrategyFactory = Arc<dyn Fn() -> Arc<dyn AuthenticationStrategy> + Send + Sync>;

/// A realm as seen by the two engines. Either side may be absent.
#[derive(Clone)]
pub struct RealmHandle {
    name: String,
    authenticating: Option<Arc<dyn AuthenticatingRealm>>,
    authorizing: Option<Arc<dyn AuthorizingRealm>>,
}

impl RealmHandle {
    /// A realm taking part in both authentication and authorization.
    #[must_use]
    pub fn new<R>(realm: Arc<R>) -> Self
    where
        R: AuthenticatingRealm + AuthorizingRealm + 'static,
    {
        let name = AuthenticatingRealm::name(realm.as_ref()).to_owned();
        let authenticating: Arc<dyn AuthenticatingRealm> = realm.clone();
        let authorizing: Arc<dyn AuthorizingRealm> = realm;
        Self {
            name,
            authenticating: Some(authenticating),
            authorizing: Some(authorizing),
        }
    }

    #[must_use]
    pub fn authenticating_only(realm: Arc<dyn AuthenticatingRealm>) -> Self {
        Self {
            name: realm.name().to_owned(),
            authenticating: Some(realm),
            authorizing: None,
        }
    }

    #[must_use]
    pub fn authorizing_only(realm: Arc<dyn AuthorizingRealm>) -> Self {
        Self {
            name: realm.name().to_owned(),
            authenticating: None,
            authorizing: Some(realm),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn authenticating(&self) -> Option<&Arc<dyn AuthenticatingRealm>> {
        self.authenticating.as_ref()
    }

    #[must_use]
    pub fn authorizing(&self) -> Option<&Arc<dyn AuthorizingRealm>> {
        self.authorizing.as_ref()
    }
}

impl fmt::Debug for RealmHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealmHandle")
            .field("name", &self.name)
            .field("authenticating", &self.authenticating.is_some())
            .field("authorizing", &self.authorizing.is_some())
            .finish()
    }
}

pub struct ComponentRegistry {
    realms: HashMap<String, RealmFactory>,
    strategies: HashMap<String, StrategyFactory>,
}

impl Default for ComponentRegistry {
    /// Registry with the built-in strategies and the `memory` realm.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register_strategy(AT_LEAST_ONE, || Arc::new(AtLeastOneSuccessful));
        registry.register_strategy(FIRST_SUCCESSFUL, || Arc::new(FirstSuccessful));
        registry.register_strategy(ALL_SUCCESSFUL, || Arc::new(AllSuccessful));
        registry.register_realm(MEMORY_REALM, memory_realm_factory);
        registry
    }
}

impl ComponentRegistry {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            realms: HashMap::new(),
            strategies: HashMap::new(),
        }
    }

    /// Register a realm factory, replacing any previous one under `key`.
    pub fn register_realm<F>(&mut self, key: &str, factory: F)
    where
        F: Fn(&RealmContext<'_>) -> anyhow::Result<RealmHandle> + Send + Sync + 'static,
    {
        if self.realms.insert(key.to_owned(), Arc::new(factory)).is_some() {
            tracing::debug!(key, "Replaced realm factory");
        }
    }

    /// Register a strategy factory, replacing any previous one under `key`.
    pub fn register_strategy<F>(&mut self, key: &str, factory: F)
    where
        F: Fn() -> Arc<dyn AuthenticationStrategy> + Send + Sync + 'static,
    {
        if self.strategies.insert(key.to_owned(), Arc::new(factory)).is_some() {
            tracing::debug!(key, "Replaced strategy factory");
        }
    }

    /// # Errors
    ///
    /// `UnknownComponent` for an unregistered kind, `Component` when the
    /// factory fails.
    pub fn create_realm(
        &self,
        cfg: &RealmConfig,
        hashing: &HashingConfig,
    ) -> Result<RealmHandle, ConfigError> {
        let factory = self
            .realms
            .get(&cfg.kind)
            .ok_or_else(|| ConfigError::UnknownComponent {
                kind: "realm",
                key: cfg.kind.clone(),
            })?;
        factory(&RealmContext {
            options: &cfg.options,
            hashing,
        })
        .map_err(|e| ConfigError::Component {
            kind: "realm",
            key: cfg.kind.clone(),
            reason: format!("{e:#}"),
        })
    }

    /// # Errors
    ///
    /// `UnknownComponent` for an unregistered key.
    pub fn create_strategy(&self, key: &str) -> Result<Arc<dyn AuthenticationStrategy>, ConfigError> {
        self.strategies
            .get(key)
            .map(|factory| factory())
            .ok_or_else(|| ConfigError::UnknownComponent {
                kind: "strategy",
                key: key.to_owned(),
            })
    }

    /// Registered realm keys, sorted.
    #[must_use]
    pub fn realm_kinds(&self) -> Vec<&str> {
        sorted_keys(&self.realms)
    }

    /// Registered strategy keys, sorted.
    #[must_use]
    pub fn strategy_keys(&self) -> Vec<&str> {
        sorted_keys(&self.strategies)
    }
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<&str> {
    let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}

fn memory_realm_factory(ctx: &RealmContext<'_>) -> anyhow::Result<RealmHandle> {
    let cfg: MemoryRealmConfig = if ctx.options.is_null() {
        MemoryRealmConfig::default()
    } else {
        serde_json::from_value(ctx.options.clone())?
    };
    let realm = MemoryRealm::from_config(&cfg, ctx.hashing)?;
    Ok(RealmHandle::new(Arc::new(realm)))
}
