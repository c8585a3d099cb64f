//! Background session validation.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;
use tracing::{debug, info, warn};

use crate::manager::SessionManager;

/// How long `stop` waits for an in-flight sweep before aborting it.
const STOP_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("validation interval must be greater than zero")]
    ZeroInterval,

    #[error("session validation needs a running tokio runtime")]
    NoRuntime,
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Periodically runs [`SessionManager::validate_all_active_sessions`].
///
/// Independent of the manager's lifetime: a manager works without a
/// scheduler, it just finds expired sessions lazily. Start and stop are
/// idempotent.
pub struct SessionValidationScheduler {
    manager: Arc<SessionManager>,
    interval: Duration,
    running: Mutex<Option<Running>>,
}

impl SessionValidationScheduler {
    #[must_use]
    pub fn new(manager: Arc<SessionManager>, interval: Duration) -> Self {
        Self {
            manager,
            interval,
            running: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|r| !r.handle.is_finished())
    }

    /// Spawn the sweep loop on the current runtime. Returns `false` if it was
    /// already running. The first sweep happens one interval after start.
    ///
    /// # Errors
    ///
    /// `ZeroInterval` or `NoRuntime`.
    pub fn start(&self) -> Result<bool, SchedulerError> {
        if self.interval.is_zero() {
            return Err(SchedulerError::ZeroInterval);
        }
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;

        let mut running = self.running.lock();
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            return Ok(false);
        }

        let cancel = CancellationToken::new();
        let handle = runtime.spawn(sweep_loop(
            Arc::clone(&self.manager),
            self.interval,
            cancel.clone(),
        ));
        *running = Some(Running { cancel, handle });

        info!(interval = %humantime::format_duration(self.interval), "Session validation started");
        Ok(true)
    }

    /// Stop the sweep loop. Returns `false` if it was not running.
    ///
    /// An in-flight sweep gets a short grace period to finish; after that the
    /// loop and its sweep are aborted.
    pub async fn stop(&self) -> bool {
        let Some(Running { cancel, mut handle }) = self.running.lock().take() else {
            return false;
        };
        cancel.cancel();

        if tokio::time::timeout(STOP_GRACE, &mut handle).await.is_err() {
            warn!("Session validation did not stop in time, aborting");
            handle.abort();
            // Dropping the loop future aborts the sweep it is waiting on.
            if let Err(e) = handle.await
                && !e.is_cancelled()
            {
                warn!(error = %e, "Session validation loop failed while aborting");
            }
        }
        info!("Session validation stopped");
        true
    }
}

impl Drop for SessionValidationScheduler {
    fn drop(&mut self) {
        if let Some(running) = self.running.get_mut().take() {
            running.cancel.cancel();
        }
    }
}

async fn sweep_loop(manager: Arc<SessionManager>, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => run_sweep(&manager).await,
        }
    }
    debug!("Session validation loop exited");
}

/// One sweep, isolated in its own task so a panic cannot end the loop. The
/// sweep task is aborted if the loop is dropped while waiting on it.
async fn run_sweep(manager: &Arc<SessionManager>) {
    let manager = Arc::clone(manager);
    let sweep = AbortOnDropHandle::new(tokio::spawn(async move {
        manager.validate_all_active_sessions().await
    }));
    let outcome = sweep.await;
    match outcome {
        Ok(Ok(report)) => debug!(
            checked = report.checked,
            invalid = report.invalid,
            "Session validation tick"
        ),
        Ok(Err(e)) => warn!(error = %e, "Session validation tick failed"),
        Err(e) => warn!(error = %e, "Session validation tick panicked"),
    }
}
