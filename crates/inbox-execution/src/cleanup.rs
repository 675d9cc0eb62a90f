//! Background sweep of expired persona sessions.

use anyhow::{Context, Result};
use inbox_application::PersonaSessionManager;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Runs `PersonaSessionManager::cleanup` on a fixed interval.
pub struct CleanupScheduler {
    manager: Arc<PersonaSessionManager>,
    interval: Duration,
}

impl CleanupScheduler {
    /// Uses the manager's configured cleanup interval (hourly by default).
    pub fn new(manager: Arc<PersonaSessionManager>) -> Self {
        let interval = manager.config().cleanup_interval();
        Self { manager, interval }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawns the sweep loop on the current tokio runtime.
    ///
    /// The first sweep happens one interval after spawning. A failed sweep is
    /// logged and the loop keeps going.
    pub fn spawn(self) -> CleanupHandle {
        let token = CancellationToken::new();
        let sweeps = Arc::new(AtomicUsize::new(0));

        let task = {
            let token = token.clone();
            let sweeps = sweeps.clone();
            tokio::spawn(async move {
                tracing::info!(
                    "[Cleanup] Sweeping expired persona sessions every {:?}",
                    self.interval
                );
                let mut ticker = tokio::time::interval(self.interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // interval() fires immediately; skip that tick
                ticker.tick().await;

                loop {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = ticker.tick() => {
                            match self.manager.cleanup().await {
                                Ok(removed) => {
                                    tracing::debug!("[Cleanup] Sweep removed {} sessions", removed);
                                }
                                Err(e) => {
                                    tracing::warn!("[Cleanup] Sweep failed: {}", e);
                                }
                            }
                            sweeps.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
                tracing::info!("[Cleanup] Stopped");
            })
        };

        CleanupHandle {
            token,
            sweeps,
            task,
        }
    }
}

/// Handle to a running cleanup loop.
pub struct CleanupHandle {
    token: CancellationToken,
    sweeps: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl CleanupHandle {
    /// Number of sweeps finished so far.
    pub fn completed_sweeps(&self) -> usize {
        self.sweeps.load(Ordering::Relaxed)
    }

    /// Token that stops the loop when cancelled, e.g. from a shutdown hook.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Stops the loop and waits for it to exit.
    pub async fn shutdown(self) -> Result<()> {
        self.token.cancel();
        self.task.await.context("Cleanup task panicked")?;
        Ok(())
    }
}
