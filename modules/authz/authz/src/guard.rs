//! Requirement checks wrapped around a unit of work.
//!
//! ```ignore
//! let guard = Guard::new(authorizer, [Requirement::Authenticated, Requirement::all_permissions(["doc:write"])]);
//! let saved = guard.run(&ctx, save_document(doc)).await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use authz_sdk::{AuthZError, Logical, Requirement};
use security_core::SecurityContext;
use tracing::debug;

use crate::authorizer::ModularRealmAuthorizer;

/// Checks a fixed list of [`Requirement`]s, in order, before running work.
#[derive(Debug, Clone)]
pub struct Guard {
    authorizer: Arc<ModularRealmAuthorizer>,
    requirements: Vec<Requirement>,
}

impl Guard {
    #[must_use]
    pub fn new(
        authorizer: Arc<ModularRealmAuthorizer>,
        requirements: impl IntoIterator<Item = Requirement>,
    ) -> Self {
        Self {
            authorizer,
            requirements: requirements.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// Evaluate every requirement against `ctx`.
    ///
    /// # Errors
    ///
    /// The error of the first requirement that is not met.
    pub async fn check(&self, ctx: &SecurityContext) -> Result<(), AuthZError> {
        for requirement in &self.requirements {
            if let Err(e) = self.check_one(ctx, requirement).await {
                debug!(requirement = ?requirement, reason = e.kind(), "Requirement not met");
                return Err(e);
            }
        }
        Ok(())
    }

    /// Run `work` only if every requirement is met.
    ///
    /// `work` is not polled when a requirement fails.
    ///
    /// # Errors
    ///
    /// The error of the first requirement that is not met.
    pub async fn run<F>(&self, ctx: &SecurityContext, work: F) -> Result<F::Output, AuthZError>
    where
        F: Future,
    {
        self.check(ctx).await?;
        Ok(work.await)
    }

    async fn check_one(
        &self,
        ctx: &SecurityContext,
        requirement: &Requirement,
    ) -> Result<(), AuthZError> {
        let principals = ctx.principals();
        match requirement {
            Requirement::Authenticated if !ctx.is_authenticated() => Err(AuthZError::Unauthenticated),
            Requirement::User if !ctx.is_user() => Err(AuthZError::Unauthenticated),
            Requirement::Guest if ctx.is_user() => {
                Err(AuthZError::unauthorized("access a guest-only resource"))
            }
            Requirement::Authenticated | Requirement::User | Requirement::Guest => Ok(()),
            Requirement::Roles { roles, logical } => {
                let roles: Vec<&str> = roles.iter().map(String::as_str).collect();
                match logical {
                    Logical::And => self.authorizer.check_roles(principals, &roles).await,
                    Logical::Or => {
                        if self.authorizer.has_roles(principals, &roles).await.contains(&true) {
                            Ok(())
                        } else {
                            Err(AuthZError::unauthorized(format!(
                                "act as any of roles [{}]",
                                roles.join(", ")
                            )))
                        }
                    }
                }
            }
            Requirement::Permissions {
                permissions,
                logical,
            } => {
                let permissions: Vec<&str> = permissions.iter().map(String::as_str).collect();
                match logical {
                    Logical::And => {
                        self.authorizer
                            .check_permissions(principals, &permissions)
                            .await
                    }
                    Logical::Or => {
                        for p in &permissions {
                            if self.authorizer.is_permitted(principals, p).await {
                                return Ok(());
                            }
                        }
                        Err(AuthZError::unauthorized(format!(
                            "use any of permissions [{}]",
                            permissions.join(", ")
                        )))
                    }
                }
            }
            Requirement::Host(allowed) => match ctx.host() {
                Some(host) if allowed.iter().any(|h| h == host) => Ok(()),
                host => Err(AuthZError::HostUnauthorized {
                    host: host.unwrap_or("unknown").to_owned(),
                }),
            },
        }
    }
}
