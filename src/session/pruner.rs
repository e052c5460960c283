//! Background expiry of sessions.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::SessionStore;

/// Default time between prune passes.
pub const DEFAULT_PRUNE_INTERVAL: Duration = Duration::from_secs(1);

/// Lifecycle of a [`Pruner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrunerState {
    /// Constructed, no task spawned yet.
    Created,
    /// The prune loop is scheduled.
    Running,
    /// Stop was requested, or the loop task ended on its own. Terminal.
    Stopped,
}

/// Periodic task that removes expired sessions from a [`SessionStore`].
///
/// Stopping goes through a [`CancellationToken`], so [`stop`](Self::stop)
/// never waits on the loop: it can be called any number of times, before
/// the task starts, or after the task has already exited.
#[derive(Debug)]
pub struct Pruner {
    store: Arc<SessionStore>,
    interval: Duration,
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Pruner {
    pub fn new(store: Arc<SessionStore>, interval: Duration) -> Self {
        Self {
            store,
            interval: interval.max(Duration::from_millis(1)),
            cancel: CancellationToken::new(),
            handle: Mutex::new(None),
        }
    }

    /// Create a pruner and start it immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(store: Arc<SessionStore>, interval: Duration) -> Self {
        let pruner = Self::new(store, interval);
        pruner.start();
        pruner
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawn the prune loop. No-op unless the pruner is still `Created`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let Ok(mut handle) = self.handle.lock() else {
            tracing::error!("pruner handle lock poisoned; not starting");
            return;
        };
        if handle.is_some() || self.cancel.is_cancelled() {
            return;
        }

        let store = Arc::clone(&self.store);
        let cancel = self.cancel.clone();
        let period = self.interval;
        *handle = Some(tokio::spawn(run(store, period, cancel)));

        tracing::debug!(interval_ms = period.as_millis() as u64, "session pruner started");
    }

    /// Request the loop to stop. Idempotent and never blocks.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            tracing::debug!("session pruner stopping");
        }
        self.cancel.cancel();
    }

    /// Stop the loop and wait for the task to finish.
    pub async fn shutdown(&self) {
        self.stop();
        let handle = self.handle.lock().ok().and_then(|mut h| h.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!("session pruner task ended abnormally: {}", e);
            }
        }
    }

    pub fn state(&self) -> PrunerState {
        if self.cancel.is_cancelled() {
            return PrunerState::Stopped;
        }
        match self.handle.lock().as_deref() {
            Ok(Some(task)) if task.is_finished() => PrunerState::Stopped,
            Ok(Some(_)) => PrunerState::Running,
            Ok(None) => PrunerState::Created,
            Err(_) => PrunerState::Stopped,
        }
    }
}

impl Drop for Pruner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(store: Arc<SessionStore>, period: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                match store.prune() {
                    Ok(0) => {}
                    Ok(removed) => tracing::debug!(removed, "expired sessions removed"),
                    Err(e) => tracing::warn!(error = %e, "session prune failed"),
                }
            }
        }
    }

    tracing::debug!("session pruner stopped");
}
