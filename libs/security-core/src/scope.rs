//! Scoped binding of the current [`SecurityContext`].
//!
//! The context is bound to a task (or to a synchronous call) for the duration
//! of a future or closure. Whatever was bound before is visible again once the
//! scope ends, on success, on error and on panic. Work moved onto another task
//! must be rebound explicitly; [`spawn_with_current`] does that.

use std::future::Future;

use tokio::task::JoinHandle;

use crate::context::SecurityContext;

tokio::task_local! {
    static CURRENT: SecurityContext;
}

/// Run `fut` with `ctx` bound as the current context.
pub async fn scope<F>(ctx: SecurityContext, fut: F) -> F::Output
where
    F: Future,
{
    CURRENT.scope(ctx, fut).await
}

/// Run `f` synchronously with `ctx` bound as the current context.
pub fn sync_scope<F, R>(ctx: SecurityContext, f: F) -> R
where
    F: FnOnce() -> R,
{
    CURRENT.sync_scope(ctx, f)
}

/// The context bound to the running task, if any.
#[must_use]
pub fn current() -> Option<SecurityContext> {
    CURRENT.try_with(Clone::clone).ok()
}

/// The bound context, or the anonymous one when nothing is bound.
#[must_use]
pub fn current_or_anonymous() -> SecurityContext {
    current().unwrap_or_default()
}

/// Spawn `fut` on the runtime with a copy of the caller's context bound.
///
/// If the caller has no context, the spawned task runs with none.
pub fn spawn_with_current<F>(fut: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match current() {
        Some(ctx) => tokio::spawn(CURRENT.scope(ctx, fut)),
        None => tokio::spawn(fut),
    }
}
