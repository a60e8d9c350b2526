//! Background task that expires waiting jobs.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::{CheckoutError, Result};
use crate::registry::{JobRegistry, SweepReport};

/// Period between sweeps when nothing else is configured.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// Periodic sweep over the whole registry.
///
/// One pass per interval instead of one timer per job: a job expires at
/// least `budget` and at most `budget + interval` after creation. The
/// registry lock is held for the pass only, never across the wait.
pub struct Sweeper {
    registry: JobRegistry,
    interval: Duration,
}

impl Sweeper {
    /// Creates a sweeper. A zero interval is bumped to one millisecond.
    pub fn new(registry: JobRegistry, interval: Duration) -> Self {
        Self {
            registry,
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs a single sweep pass now.
    pub async fn tick(&self) -> SweepReport {
        let started = std::time::Instant::now();
        let report = self.registry.sweep(Instant::now()).await;

        metrics::counter!("checkout_sweeps_total").increment(1);
        metrics::gauge!("checkout_jobs_tracked").set(report.scanned as f64);
        metrics::histogram!("checkout_sweep_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::debug!(
            scanned = report.scanned,
            timed_out = report.timed_out,
            "sweep complete"
        );
        report
    }

    /// Starts the sweep loop on the tokio runtime.
    ///
    /// The first pass runs one interval after the call.
    pub fn spawn(self) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        // Dropped together with the task, whichever way it ends.
        let (alive_tx, alive_rx) = watch::channel(());

        let task = tokio::spawn(async move {
            let _alive = alive_tx;
            let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(interval_ms = self.interval.as_millis() as u64, "sweeper started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.tick().await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::info!("sweeper stopped");
        });

        SweeperHandle {
            shutdown: shutdown_tx,
            task: Some(task),
            alive: alive_rx,
        }
    }
}

/// Handle to a running sweeper.
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
    alive: watch::Receiver<()>,
}

impl SweeperHandle {
    /// Asks the loop to stop without waiting for it.
    pub fn cancel(&self) {
        self.shutdown.send_replace(true);
    }

    /// Kills the loop at its next await point, without a shutdown request.
    ///
    /// [`wait`](Self::wait) then reports the loop as dead.
    pub fn abort(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    /// Stops the loop and waits for it to finish.
    ///
    /// Returns `Ok` right away if [`wait`](Self::wait) already saw the loop end.
    pub async fn shutdown(mut self) -> Result<()> {
        self.cancel();
        match self.task.take() {
            Some(task) => task
                .await
                .map_err(|e| CheckoutError::SweeperFatal(e.to_string())),
            None => Ok(()),
        }
    }

    /// Resolves when the loop ends.
    ///
    /// Ending after [`cancel`](Self::cancel) or [`shutdown`](Self::shutdown)
    /// is `Ok`. Any other ending, a panic or abort included, is
    /// `SweeperFatal`: jobs created afterwards would never expire.
    pub async fn wait(&mut self) -> Result<()> {
        if let Some(task) = self.task.as_mut() {
            let joined = task.await;
            self.task = None;
            if let Err(e) = joined {
                return Err(CheckoutError::SweeperFatal(e.to_string()));
            }
        }

        if *self.shutdown.borrow() {
            Ok(())
        } else {
            Err(CheckoutError::SweeperFatal("sweeper exited".to_string()))
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Returns a cloneable view of the loop's liveness, e.g. for health checks.
    pub fn status(&self) -> SweeperStatus {
        SweeperStatus {
            alive: self.alive.clone(),
        }
    }
}

/// Cloneable liveness view of a spawned sweeper.
#[derive(Debug, Clone)]
pub struct SweeperStatus {
    alive: watch::Receiver<()>,
}

impl SweeperStatus {
    /// Returns false once the loop has ended for any reason.
    pub fn is_running(&self) -> bool {
        self.alive.has_changed().is_ok()
    }
}
