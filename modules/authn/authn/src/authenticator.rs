//! Multi-realm authenticator.

use std::sync::Arc;

use async_trait::async_trait;
use authn_sdk::{
    AuthNError, AuthenticatingRealm, AuthenticationEvent, AuthenticationToken,
    AuthenticatorClient, LogoutEvent,
};
use event_bus::EventBus;
use security_core::PrincipalCollection;
use tracing::{debug, info};

use crate::strategy::{AtLeastOneSuccessful, AttemptFlow, AttemptState, AuthenticationStrategy, RealmCandidate};

/// Runs a token through the configured realms under one strategy.
pub struct Authenticator {
    realms: Vec<Arc<dyn AuthenticatingRealm>>,
    strategy: Arc<dyn AuthenticationStrategy>,
    events: Option<Arc<EventBus>>,
}

impl Authenticator {
    #[must_use]
    pub fn builder() -> AuthenticatorBuilder {
        AuthenticatorBuilder::default()
    }

    #[must_use]
    pub fn realms(&self) -> &[Arc<dyn AuthenticatingRealm>] {
        &self.realms
    }

    #[must_use]
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Authenticate `token` and return the merged identity.
    ///
    /// Publishes [`AuthenticationEvent::Succeeded`] or
    /// [`AuthenticationEvent::Failed`] on the bus, if one is attached.
    ///
    /// # Errors
    ///
    /// - `Configuration` when no realms are configured
    /// - `UnsupportedToken` when no realm supports the token type
    /// - whatever the strategy reports when the attempt fails
    #[tracing::instrument(
        skip_all,
        fields(
            token_type = %token.token_type(),
            principal = %token.principal_hint(),
            strategy = self.strategy.name(),
        )
    )]
    pub async fn authenticate(
        &self,
        token: &AuthenticationToken,
    ) -> Result<PrincipalCollection, AuthNError> {
        let result = self.run_realms(token).await;

        match &result {
            Ok(principals) => {
                info!(principals = %principals, "Authentication succeeded");
                self.publish(&AuthenticationEvent::Succeeded {
                    principals: principals.clone(),
                    token_type: token.token_type().to_owned(),
                });
            }
            Err(e) => {
                info!(reason = e.kind(), "Authentication failed");
                self.publish(&AuthenticationEvent::Failed {
                    principal_hint: token.principal_hint().to_owned(),
                    token_type: token.token_type().to_owned(),
                    reason: e.kind().to_owned(),
                });
            }
        }
        result
    }

    async fn run_realms(
        &self,
        token: &AuthenticationToken,
    ) -> Result<PrincipalCollection, AuthNError> {
        if self.realms.is_empty() {
            return Err(AuthNError::Configuration(
                "no realms configured".to_owned(),
            ));
        }

        let candidates: Vec<RealmCandidate<'_>> = self
            .realms
            .iter()
            .map(|r| RealmCandidate {
                name: r.name(),
                supports: r.supports(token.token_type()),
            })
            .collect();
        if !candidates.iter().any(|c| c.supports) {
            return Err(AuthNError::UnsupportedToken {
                token_type: token.token_type().to_owned(),
            });
        }

        self.strategy.before_all(token, &candidates)?;

        let mut state = AttemptState::default();
        for realm in &self.realms {
            let name = realm.name();
            if !realm.supports(token.token_type()) {
                debug!(realm = name, "Skipping realm that does not support token type");
                continue;
            }

            self.strategy.before_attempt(name, token, &state)?;
            let outcome = realm.authentication_info(token).await;
            match &outcome {
                Ok(Some(_)) => debug!(realm = name, "Realm found account"),
                Ok(None) => debug!(realm = name, "Realm found no account"),
                Err(e) => debug!(realm = name, reason = e.kind(), "Realm rejected token"),
            }

            if self.strategy.after_attempt(name, token, outcome, &mut state)? == AttemptFlow::Stop {
                debug!(realm = name, "Strategy stopped realm iteration");
                break;
            }
        }

        let info = self.strategy.after_all(token, state)?;
        if info.principals.is_empty() {
            return Err(AuthNError::UnknownAccount(token.principal_hint().to_owned()));
        }
        Ok(info.principals)
    }

    /// Notify every realm that `principals` logged out.
    pub async fn on_logout(&self, principals: &PrincipalCollection) {
        for realm in &self.realms {
            realm.on_logout(principals).await;
        }
        debug!(principals = %principals, "Logout propagated to realms");
        self.publish(&LogoutEvent {
            principals: principals.clone(),
        });
    }

    fn publish<E: std::any::Any>(&self, event: &E) {
        if let Some(bus) = &self.events {
            bus.publish(event);
        }
    }
}

#[async_trait]
impl AuthenticatorClient for Authenticator {
    async fn authenticate(
        &self,
        token: &AuthenticationToken,
    ) -> Result<PrincipalCollection, AuthNError> {
        Authenticator::authenticate(self, token).await
    }

    async fn on_logout(&self, principals: &PrincipalCollection) {
        Authenticator::on_logout(self, principals).await;
    }
}

pub struct AuthenticatorBuilder {
    realms: Vec<Arc<dyn AuthenticatingRealm>>,
    strategy: Arc<dyn AuthenticationStrategy>,
    events: Option<Arc<EventBus>>,
}

impl Default for AuthenticatorBuilder {
    fn default() -> Self {
        Self {
            realms: Vec::new(),
            strategy: Arc::new(AtLeastOneSuccessful),
            events: None,
        }
    }
}

impl AuthenticatorBuilder {
    /// Append a realm. Realms are consulted in the order added.
    #[must_use]
    pub fn realm(mut self, realm: Arc<dyn AuthenticatingRealm>) -> Self {
        self.realms.push(realm);
        self
    }

    #[must_use]
    pub fn realms(mut self, realms: impl IntoIterator<Item = Arc<dyn AuthenticatingRealm>>) -> Self {
        self.realms.extend(realms);
        self
    }

    /// Defaults to [`AtLeastOneSuccessful`].
    #[must_use]
    pub fn strategy(mut self, strategy: Arc<dyn AuthenticationStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    #[must_use]
    pub fn build(self) -> Authenticator {
        Authenticator {
            realms: self.realms,
            strategy: self.strategy,
            events: self.events,
        }
    }
}
