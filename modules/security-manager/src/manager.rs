//! The security manager facade.
//!
//! Wires the authenticator, the authorizer and the session manager together
//! and exposes the operations a host needs per request: log in, resume from
//! a session, check permissions, log out.

use std::sync::Arc;

use authn::Authenticator;
use authn_sdk::AuthenticationToken;
use authz::{Guard, ModularRealmAuthorizer, ResolvedAuthorization};
use authz_sdk::{
    AuthZError, Requirement, StaticRolePermissionResolver, WildcardPermissionResolver,
};
use event_bus::EventBus;
use identity_cache::BoundedCacheManager;
use security_core::{PrincipalCollection, SecurityContext};
use session::{
    CachingSessionDao, Clock, MemorySessionDao, SessionManager, SessionValidationScheduler,
};
use session_sdk::{Session, SessionDao, SessionError, SessionId};
use tracing::{debug, info};

use crate::config::SecurityConfig;
use crate::error::SecurityError;
use crate::registry::{ComponentRegistry, RealmHandle};

/// Session attribute holding the subject's principals.
pub const PRINCIPALS_SESSION_KEY: &str = "gk.principals";

/// Session attribute set when the principals were proven by a login.
pub const AUTHENTICATED_SESSION_KEY: &str = "gk.authenticated";

pub struct SecurityManager {
    authenticator: Authenticator,
    authorizer: Arc<ModularRealmAuthorizer>,
    sessions: Arc<SessionManager>,
    scheduler: SessionValidationScheduler,
    validation_enabled: bool,
    events: Arc<EventBus>,
}

impl SecurityManager {
    #[must_use]
    pub fn builder(config: SecurityConfig) -> SecurityManagerBuilder {
        SecurityManagerBuilder::new(config)
    }

    /// Build with the default registry and no extra components.
    ///
    /// # Errors
    ///
    /// See [`SecurityManagerBuilder::build`].
    pub fn from_config(config: SecurityConfig) -> Result<Self, SecurityError> {
        Self::builder(config).build()
    }

    #[must_use]
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    #[must_use]
    pub fn authorizer(&self) -> &Arc<ModularRealmAuthorizer> {
        &self.authorizer
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    #[must_use]
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Authenticate `token`, start a session and bind the principals to it.
    ///
    /// No session is created when authentication fails.
    ///
    /// # Errors
    ///
    /// `AuthN` when the token is rejected, `Session` when the session cannot
    /// be stored.
    #[tracing::instrument(
        skip_all,
        fields(principal = %token.principal_hint(), token_type = %token.token_type())
    )]
    pub async fn login(&self, token: &AuthenticationToken) -> Result<SecurityContext, SecurityError> {
        let principals = self.authenticator.authenticate(token).await?;

        let session = self.sessions.start(token.host()).await?;
        let id = session.id();
        self.sessions
            .set_attribute(id, PRINCIPALS_SESSION_KEY, principals_to_value(&principals)?)
            .await?;
        self.sessions
            .set_attribute(id, AUTHENTICATED_SESSION_KEY, serde_json::Value::Bool(true))
            .await?;

        info!(session_id = %id, principals = %principals, "Login succeeded");
        let mut ctx = SecurityContext::builder()
            .principals(principals)
            .session_id(id)
            .authenticated(true);
        if let Some(host) = token.host() {
            ctx = ctx.host(host);
        }
        Ok(ctx.build())
    }

    /// Rebuild the subject's context from an existing session, counting it as
    /// an access.
    ///
    /// # Errors
    ///
    /// `Session` when the session is unknown, stopped or expired.
    pub async fn resume(&self, session_id: SessionId) -> Result<SecurityContext, SecurityError> {
        self.sessions.touch(session_id).await?;
        let session = self.sessions.get_session(session_id).await?;

        let principals = match session.attribute(PRINCIPALS_SESSION_KEY) {
            Some(value) => serde_json::from_value::<PrincipalCollection>(value.clone())
                .map_err(|e| SessionError::Storage(format!("corrupt principals attribute: {e}")))?,
            None => PrincipalCollection::new(),
        };
        let authenticated = session
            .attribute(AUTHENTICATED_SESSION_KEY)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false);

        let mut ctx = SecurityContext::builder()
            .principals(principals)
            .session_id(session_id)
            .authenticated(authenticated);
        if let Some(host) = session.host() {
            ctx = ctx.host(host);
        }
        Ok(ctx.build())
    }

    /// Log the subject out: drop its cached authorization data, notify the
    /// realms and stop its session.
    ///
    /// A session that is already gone, stopped or expired is not an error.
    ///
    /// # Errors
    ///
    /// `Session` when the session store fails.
    #[tracing::instrument(skip_all, fields(principals = %ctx.principals()))]
    pub async fn logout(&self, ctx: &SecurityContext) -> Result<(), SecurityError> {
        let principals = ctx.principals();
        if !principals.is_empty() {
            self.authorizer.clear_cache(principals);
            self.authenticator.on_logout(principals).await;
        }

        if let Some(id) = ctx.session_id() {
            match self.sessions.stop(id).await {
                Ok(()) => {}
                Err(e @ SessionError::Unknown(_)) => {
                    debug!(session_id = %id, reason = e.kind(), "Logout without a live session");
                }
                Err(e) => return Err(e.into()),
            }
        }
        info!("Logout complete");
        Ok(())
    }

    pub async fn has_role(&self, ctx: &SecurityContext, role: &str) -> bool {
        self.authorizer.has_role(ctx.principals(), role).await
    }

    pub async fn is_permitted(&self, ctx: &SecurityContext, permission: &str) -> bool {
        self.authorizer.is_permitted(ctx.principals(), permission).await
    }

    /// # Errors
    ///
    /// `Unauthorized` when no realm grants `role`.
    pub async fn check_role(&self, ctx: &SecurityContext, role: &str) -> Result<(), AuthZError> {
        self.authorizer.check_role(ctx.principals(), role).await
    }

    /// # Errors
    ///
    /// `InvalidPermission` or `Unauthorized`.
    pub async fn check_permission(
        &self,
        ctx: &SecurityContext,
        permission: &str,
    ) -> Result<(), AuthZError> {
        self.authorizer
            .check_permission(ctx.principals(), permission)
            .await
    }

    /// A guard over this manager's authorizer.
    #[must_use]
    pub fn guard(&self, requirements: impl IntoIterator<Item = Requirement>) -> Guard {
        Guard::new(Arc::clone(&self.authorizer), requirements)
    }

    /// Start the validation sweep if the configuration enables it.
    ///
    /// # Errors
    ///
    /// `Scheduler` when there is no runtime or the interval is zero.
    pub fn start_background_tasks(&self) -> Result<bool, SecurityError> {
        if !self.validation_enabled {
            debug!("Session validation disabled by configuration");
            return Ok(false);
        }
        self.start_session_validation()
    }

    /// Start the validation sweep regardless of configuration. Returns
    /// `false` if it was already running.
    ///
    /// # Errors
    ///
    /// `Scheduler` when there is no runtime or the interval is zero.
    pub fn start_session_validation(&self) -> Result<bool, SecurityError> {
        Ok(self.scheduler.start()?)
    }

    /// Returns `false` if the sweep was not running.
    pub async fn stop_session_validation(&self) -> bool {
        self.scheduler.stop().await
    }

    #[must_use]
    pub fn is_validating_sessions(&self) -> bool {
        self.scheduler.is_running()
    }
}

fn principals_to_value(principals: &PrincipalCollection) -> Result<serde_json::Value, SessionError> {
    serde_json::to_value(principals)
        .map_err(|e| SessionError::Storage(format!("cannot store principals: {e}")))
}

pub struct SecurityManagerBuilder {
    config: SecurityConfig,
    registry: ComponentRegistry,
    realms: Vec<RealmHandle>,
    session_dao: Option<Arc<dyn SessionDao>>,
    clock: Option<Arc<dyn Clock>>,
    events: Option<Arc<EventBus>>,
}

impl SecurityManagerBuilder {
    #[must_use]
    pub fn new(config: SecurityConfig) -> Self {
        Self {
            config,
            registry: ComponentRegistry::default(),
            realms: Vec::new(),
            session_dao: None,
            clock: None,
            events: None,
        }
    }

    /// Resolve configured components through `registry` instead of the
    /// default one.
    #[must_use]
    pub fn registry(mut self, registry: ComponentRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Add a realm after the configured ones.
    #[must_use]
    pub fn realm(mut self, realm: RealmHandle) -> Self {
        self.realms.push(realm);
        self
    }

    /// Defaults to a [`CachingSessionDao`] over a [`MemorySessionDao`].
    #[must_use]
    pub fn session_dao(mut self, dao: Arc<dyn SessionDao>) -> Self {
        self.session_dao = Some(dao);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Defaults to a fresh bus.
    #[must_use]
    pub fn event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    /// # Errors
    ///
    /// `Config` when the strategy or a realm kind is not registered, or a
    /// realm factory fails. `AuthZ` when a configured role permission does
    /// not parse.
    pub fn build(self) -> Result<SecurityManager, SecurityError> {
        let Self {
            config,
            registry,
            realms: extra_realms,
            session_dao,
            clock,
            events,
        } = self;
        let events = events.unwrap_or_else(|| Arc::new(EventBus::new()));

        let strategy = registry.create_strategy(&config.authentication.strategy)?;
        let mut realms = Vec::with_capacity(config.authentication.realms.len() + extra_realms.len());
        for realm_cfg in &config.authentication.realms {
            realms.push(registry.create_realm(realm_cfg, &config.hashing)?);
        }
        realms.extend(extra_realms);

        let authenticator = Authenticator::builder()
            .realms(realms.iter().filter_map(|r| r.authenticating().cloned()))
            .strategy(strategy)
            .event_bus(Arc::clone(&events))
            .build();

        let authz_caches =
            BoundedCacheManager::<PrincipalCollection, ResolvedAuthorization>::new(config.cache.clone());
        let permission_resolver =
            WildcardPermissionResolver::new(config.authorization.case_sensitive_permissions);
        let mut authorizer = ModularRealmAuthorizer::builder()
            .permission_resolver(Arc::new(permission_resolver))
            .cache_manager(Arc::new(authz_caches));
        if !config.authorization.role_permissions.is_empty() {
            let roles = StaticRolePermissionResolver::from_strings(
                config
                    .authorization
                    .role_permissions
                    .iter()
                    .map(|(role, perms)| (role.as_str(), perms.iter().map(String::as_str))),
                &permission_resolver,
            )?;
            authorizer = authorizer.role_permission_resolver(Arc::new(roles));
        }
        for realm in realms.iter().filter_map(|r| r.authorizing().cloned()) {
            authorizer = authorizer.realm(realm);
        }

        let session_dao = session_dao.unwrap_or_else(|| -> Arc<dyn SessionDao> {
            let caches = BoundedCacheManager::<SessionId, Session>::new(config.cache.clone());
            Arc::new(CachingSessionDao::new(Arc::new(MemorySessionDao::new()), &caches))
        });
        let mut sessions = SessionManager::builder()
            .dao(session_dao)
            .event_bus(Arc::clone(&events))
            .config(&config.session);
        if let Some(clock) = clock {
            sessions = sessions.clock(clock);
        }
        let sessions = Arc::new(sessions.build());
        let scheduler =
            SessionValidationScheduler::new(Arc::clone(&sessions), config.session.validation_interval);

        info!(
            strategy = authenticator.strategy_name(),
            realms = realms.len(),
            session_timeout = ?config.session.global_timeout,
            "Security manager ready"
        );
        Ok(SecurityManager {
            authenticator,
            authorizer: Arc::new(authorizer.build()),
            sessions,
            scheduler,
            validation_enabled: config.session.validation_enabled,
            events,
        })
    }
}
