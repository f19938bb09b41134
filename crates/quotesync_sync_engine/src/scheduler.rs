//! Periodic sync scheduling.

use crate::engine::{SyncEngine, SyncOutcome};
use crate::error::SyncError;
use crate::transport::QuoteTransport;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

struct Running {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Runs sync cycles on a fixed interval.
///
/// The first cycle runs as soon as the scheduler starts. Every outcome is
/// sent on the events channel; conflict sessions are resolved by whoever
/// receives them. Stopping takes effect between cycles, so a cycle that is
/// already fetching runs to completion and still reports its outcome. A tick
/// that finds a cycle already in flight is skipped. Dropping the scheduler
/// stops it.
pub struct SyncScheduler<T: QuoteTransport + 'static> {
    engine: Arc<SyncEngine<T>>,
    interval: Duration,
    events: mpsc::UnboundedSender<SyncOutcome>,
    running: Mutex<Option<Running>>,
}

impl<T: QuoteTransport + 'static> SyncScheduler<T> {
    /// Creates a stopped scheduler using the engine's configured interval.
    pub fn new(engine: Arc<SyncEngine<T>>, events: mpsc::UnboundedSender<SyncOutcome>) -> Self {
        let interval = engine.config().sync_interval;
        Self {
            engine,
            interval,
            events,
            running: Mutex::new(None),
        }
    }

    /// Sets the interval between cycles.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Gets the interval between cycles.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Gets the engine driven by this scheduler.
    pub fn engine(&self) -> &Arc<SyncEngine<T>> {
        &self.engine
    }

    /// Starts the periodic loop.
    ///
    /// Returns false if the scheduler is already running.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(&self) -> bool {
        let mut running = self.running.lock();
        if running.as_ref().is_some_and(|r| !r.task.is_finished()) {
            return false;
        }

        let (stop, stop_rx) = watch::channel(false);
        let task = tokio::spawn(run_loop(
            Arc::clone(&self.engine),
            self.interval,
            self.events.clone(),
            stop_rx,
        ));
        *running = Some(Running { stop, task });
        info!(interval_secs = self.interval.as_secs(), "sync scheduler started");
        true
    }

    /// Stops the periodic loop after the current cycle, if any.
    ///
    /// Returns false if the scheduler was not running.
    pub fn stop(&self) -> bool {
        match self.running.lock().take() {
            Some(running) => {
                let _ = running.stop.send(true);
                info!("sync scheduler stopped");
                true
            }
            None => false,
        }
    }

    /// Stops the loop and waits for the current cycle to finish.
    pub async fn shutdown(&self) {
        let running = self.running.lock().take();
        if let Some(running) = running {
            let _ = running.stop.send(true);
            let _ = running.task.await;
            info!("sync scheduler shut down");
        }
    }

    /// Returns true while the loop is running.
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|r| !r.task.is_finished())
    }
}

async fn run_loop<T: QuoteTransport>(
    engine: Arc<SyncEngine<T>>,
    period: Duration,
    events: mpsc::UnboundedSender<SyncOutcome>,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = stop.changed() => break,

            _ = ticker.tick() => {
                let outcome = engine.run_sync().await;
                if let SyncOutcome::Failed(SyncError::AlreadyInFlight) = outcome {
                    debug!("skipping tick, a cycle is already in flight");
                    continue;
                }
                if events.send(outcome).is_err() {
                    debug!("sync events receiver dropped");
                }
            }
        }
    }

    debug!("sync loop exited");
}
