//! Multi-realm authentication strategies.
//!
//! The [`crate::Authenticator`] drives one [`AttemptState`] through a strategy:
//! `before_all`, then `before_attempt` / realm call / `after_attempt` for each
//! supporting realm in configuration order, then `after_all`. A strategy stops
//! the walk early by returning [`AttemptFlow::Stop`] or an error.

use authn_sdk::{AuthNError, AuthenticationInfo, AuthenticationToken, RealmFailure};

/// Registry key of [`AtLeastOneSuccessful`].
pub const AT_LEAST_ONE: &str = "at_least_one";
/// Registry key of [`FirstSuccessful`].
pub const FIRST_SUCCESSFUL: &str = "first_successful";
/// Registry key of [`AllSuccessful`].
pub const ALL_SUCCESSFUL: &str = "all_successful";

/// Whether the authenticator should visit the next realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptFlow {
    Continue,
    Stop,
}

/// A configured realm and whether it accepts the current token type.
#[derive(Debug, Clone, Copy)]
pub struct RealmCandidate<'a> {
    pub name: &'a str,
    pub supports: bool,
}

/// Accumulated outcome of one `authenticate` call.
#[derive(Debug, Default)]
pub struct AttemptState {
    aggregate: AuthenticationInfo,
    failures: Vec<RealmFailure>,
    successes: usize,
}

impl AttemptState {
    /// Merge a realm's account into the aggregate.
    pub fn record_success(&mut self, info: &AuthenticationInfo) {
        self.aggregate.merge(info);
        self.successes += 1;
    }

    pub fn record_failure(&mut self, realm: &str, error: AuthNError) {
        self.failures.push(RealmFailure {
            realm: realm.to_owned(),
            error,
        });
    }

    #[must_use]
    pub fn aggregate(&self) -> &AuthenticationInfo {
        &self.aggregate
    }

    #[must_use]
    pub fn failures(&self) -> &[RealmFailure] {
        &self.failures
    }

    #[must_use]
    pub fn successes(&self) -> usize {
        self.successes
    }

    /// Record the realm's outcome without deciding anything.
    fn record(&mut self, realm: &str, outcome: Result<Option<AuthenticationInfo>, AuthNError>) {
        match outcome {
            Ok(Some(info)) => self.record_success(&info),
            Ok(None) => {}
            Err(e) => self.record_failure(realm, e),
        }
    }
}

/// Merge and short-circuit policy across realms.
pub trait AuthenticationStrategy: Send + Sync {
    /// Registry key, also used as a log field.
    fn name(&self) -> &'static str;

    /// Called once before any realm is consulted.
    ///
    /// # Errors
    ///
    /// Aborts the attempt with the returned error.
    fn before_all(
        &self,
        _token: &AuthenticationToken,
        _realms: &[RealmCandidate<'_>],
    ) -> Result<(), AuthNError> {
        Ok(())
    }

    /// Called before each supporting realm is consulted.
    ///
    /// # Errors
    ///
    /// Aborts the attempt with the returned error.
    fn before_attempt(
        &self,
        _realm: &str,
        _token: &AuthenticationToken,
        _state: &AttemptState,
    ) -> Result<(), AuthNError> {
        Ok(())
    }

    /// Fold one realm's outcome into `state`.
    ///
    /// # Errors
    ///
    /// Aborts the attempt with the returned error.
    fn after_attempt(
        &self,
        realm: &str,
        token: &AuthenticationToken,
        outcome: Result<Option<AuthenticationInfo>, AuthNError>,
        state: &mut AttemptState,
    ) -> Result<AttemptFlow, AuthNError>;

    /// Decide the overall result once the walk is over.
    ///
    /// # Errors
    ///
    /// The strategy's failure when the attempt did not succeed.
    fn after_all(
        &self,
        token: &AuthenticationToken,
        state: AttemptState,
    ) -> Result<AuthenticationInfo, AuthNError>;
}

/// Succeeds if any realm found the account. Realm errors are kept and, if
/// nothing succeeded, reported together in [`AuthNError::Aggregate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AtLeastOneSuccessful;

impl AuthenticationStrategy for AtLeastOneSuccessful {
    fn name(&self) -> &'static str {
        AT_LEAST_ONE
    }

    fn after_attempt(
        &self,
        realm: &str,
        _token: &AuthenticationToken,
        outcome: Result<Option<AuthenticationInfo>, AuthNError>,
        state: &mut AttemptState,
    ) -> Result<AttemptFlow, AuthNError> {
        state.record(realm, outcome);
        Ok(AttemptFlow::Continue)
    }

    fn after_all(
        &self,
        token: &AuthenticationToken,
        state: AttemptState,
    ) -> Result<AuthenticationInfo, AuthNError> {
        if state.successes > 0 && !state.aggregate.principals.is_empty() {
            return Ok(state.aggregate);
        }
        let message = match state.failures.last() {
            Some(last) => format!(
                "token of type '{}' for '{}' was not accepted by any realm; last failure from '{}': {}",
                token.token_type(),
                token.principal_hint(),
                last.realm,
                last.error
            ),
            None => format!(
                "token of type '{}' for '{}' was not accepted by any realm",
                token.token_type(),
                token.principal_hint()
            ),
        };
        Err(AuthNError::Aggregate {
            message,
            failures: state.failures,
        })
    }
}

/// Returns on the first realm that finds the account and skips the rest.
/// When none does, the last realm error is returned as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstSuccessful;

impl AuthenticationStrategy for FirstSuccessful {
    fn name(&self) -> &'static str {
        FIRST_SUCCESSFUL
    }

    fn after_attempt(
        &self,
        realm: &str,
        _token: &AuthenticationToken,
        outcome: Result<Option<AuthenticationInfo>, AuthNError>,
        state: &mut AttemptState,
    ) -> Result<AttemptFlow, AuthNError> {
        state.record(realm, outcome);
        if state.successes > 0 {
            Ok(AttemptFlow::Stop)
        } else {
            Ok(AttemptFlow::Continue)
        }
    }

    fn after_all(
        &self,
        token: &AuthenticationToken,
        mut state: AttemptState,
    ) -> Result<AuthenticationInfo, AuthNError> {
        if state.successes > 0 {
            return Ok(state.aggregate);
        }
        Err(state.failures.pop().map_or_else(
            || AuthNError::UnknownAccount(token.principal_hint().to_owned()),
            |last| last.error,
        ))
    }
}

/// Every configured realm must accept the token and find the account. The
/// first error ends the attempt with that error.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllSuccessful;

impl AuthenticationStrategy for AllSuccessful {
    fn name(&self) -> &'static str {
        ALL_SUCCESSFUL
    }

    fn before_all(
        &self,
        token: &AuthenticationToken,
        realms: &[RealmCandidate<'_>],
    ) -> Result<(), AuthNError> {
        if let Some(skipped) = realms.iter().find(|r| !r.supports) {
            tracing::debug!(realm = skipped.name, "Realm does not support token type");
            return Err(AuthNError::UnsupportedToken {
                token_type: token.token_type().to_owned(),
            });
        }
        Ok(())
    }

    fn after_attempt(
        &self,
        realm: &str,
        token: &AuthenticationToken,
        outcome: Result<Option<AuthenticationInfo>, AuthNError>,
        state: &mut AttemptState,
    ) -> Result<AttemptFlow, AuthNError> {
        match outcome {
            Ok(Some(info)) => {
                state.record_success(&info);
                Ok(AttemptFlow::Continue)
            }
            Ok(None) => {
                tracing::debug!(realm, "Realm found no account");
                Err(AuthNError::UnknownAccount(token.principal_hint().to_owned()))
            }
            Err(e) => Err(e),
        }
    }

    fn after_all(
        &self,
        _token: &AuthenticationToken,
        state: AttemptState,
    ) -> Result<AuthenticationInfo, AuthNError> {
        Ok(state.aggregate)
    }
}
