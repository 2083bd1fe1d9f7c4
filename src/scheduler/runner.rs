//! Periodic scan loop with start/stop control

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use super::error::SchedulerError;
use super::watchlist::WatchlistSource;
use crate::broadcast::LiveBroadcaster;
use crate::error::{self, DarkwatchErrorTrait, Error};
use crate::health::HealthCheck;
use crate::metrics;
use crate::models::{ScanOutcome, ScanQuery};
use crate::notifications::{match_summary_message, Notifier};
use crate::scanner::ScanPool;
use crate::storage::PersistenceSink;

/// Default time between two cycles
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(900);

/// Default wait after an unhealthy gate or a failed iteration
pub const DEFAULT_UNHEALTHY_BACKOFF: Duration = Duration::from_secs(60);

/// Everything one iteration needs, shared with the loop task
struct Engine {
    pool: ScanPool,
    health: Arc<dyn HealthCheck>,
    watchlist: Arc<dyn WatchlistSource>,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn PersistenceSink>,
    broadcaster: Option<Arc<dyn LiveBroadcaster>>,
    period: Duration,
    unhealthy_backoff: Duration,
    // Held for a whole gated cycle so `run_once` never overlaps the loop
    cycle_lock: Mutex<()>,
}

impl Engine {
    /// One gated iteration; `None` when the proxy is unhealthy
    async fn iterate(&self) -> error::Result<Option<ScanOutcome>> {
        let _cycle = self.cycle_lock.lock().await;

        if !self.health.check().await {
            tracing::warn!("Proxy is not healthy, skipping cycle");
            metrics::record_cycle_skipped();
            return Ok(None);
        }

        let watchlist = self.watchlist.load().await?;
        let query = watchlist.scan_query();

        let outcome = {
            let _timer = metrics::start_cycle_timer();
            self.pool.run_cycle(&watchlist.urls, &query).await
        };
        metrics::record_cycle(outcome.len());

        self.dispatch(&outcome, &query).await;
        Ok(Some(outcome))
    }

    /// Hand a non-empty outcome to every sink; failures are logged only
    async fn dispatch(&self, outcome: &ScanOutcome, query: &ScanQuery) {
        if outcome.is_empty() {
            return;
        }

        let summary = match_summary_message(outcome.len(), query.as_str().trim());
        if let Err(e) = self.notifier.notify(&summary).await {
            let err = Error::from(e);
            tracing::error!(
                error = %err,
                category = err.category().label(),
                "Failed to send match notification"
            );
        }

        if let Err(e) = self.store.store(outcome).await {
            let err = Error::from(e);
            tracing::error!(
                error = %err,
                category = err.category().label(),
                recoverable = err.is_recoverable(),
                count = outcome.len(),
                "Failed to save results"
            );
        }

        if let Some(broadcaster) = &self.broadcaster {
            broadcaster.broadcast(outcome).await;
        }
    }
}

/// Loop task: iterate, then wait, until the shutdown signal fires
async fn run_loop(engine: Arc<Engine>, mut shutdown: watch::Receiver<bool>) {
    tracing::info!(
        period_secs = engine.period.as_secs(),
        unhealthy_backoff_secs = engine.unhealthy_backoff.as_secs(),
        "Scheduler loop started"
    );

    loop {
        if *shutdown.borrow_and_update() {
            break;
        }

        let result = AssertUnwindSafe(engine.iterate())
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(SchedulerError::from_panic(panic).into()));

        let wait = match result {
            Ok(Some(_)) => engine.period,
            Ok(None) => engine.unhealthy_backoff,
            Err(e) => {
                metrics::record_loop_error();
                tracing::error!(
                    error = %e,
                    category = e.category().label(),
                    recoverable = e.is_recoverable(),
                    backoff_secs = engine.unhealthy_backoff.as_secs(),
                    "Scheduler iteration failed"
                );
                engine.unhealthy_backoff
            }
        };

        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = tokio::time::sleep(wait) => {}
        }
    }

    tracing::info!("Scheduler loop stopped");
}

/// Handle to the spawned loop task
struct LoopHandle {
    task: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

#[derive(Default)]
struct SchedulerState {
    running: bool,
    handle: Option<LoopHandle>,
}

/// Runs the scan cycle on a fixed period behind the proxy health gate
///
/// `start` and `stop` are serialized by one lock, so concurrent calls never
/// spawn a second loop or join a loop that does not exist.
pub struct Scheduler {
    engine: Arc<Engine>,
    state: Mutex<SchedulerState>,
}

impl Scheduler {
    /// Start assembling a scheduler from its collaborators
    pub fn builder(
        pool: ScanPool,
        health: Arc<dyn HealthCheck>,
        watchlist: Arc<dyn WatchlistSource>,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn PersistenceSink>,
    ) -> SchedulerBuilder {
        SchedulerBuilder {
            pool,
            health,
            watchlist,
            notifier,
            store,
            broadcaster: None,
            period: DEFAULT_PERIOD,
            unhealthy_backoff: DEFAULT_UNHEALTHY_BACKOFF,
        }
    }

    /// Spawn the loop; no-op when already running
    pub async fn start(&self) {
        let mut state = self.state.lock().await;
        if state.running {
            tracing::debug!("Scheduler already running");
            return;
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_loop(self.engine.clone(), shutdown_rx));

        state.running = true;
        state.handle = Some(LoopHandle { task, shutdown });
        metrics::set_scheduler_running(true);
        tracing::info!("Scheduler started");
    }

    /// Signal the loop and wait until it has exited; no-op when stopped
    ///
    /// A cycle already in progress runs to completion first.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        if !state.running {
            tracing::debug!("Scheduler not running");
            return;
        }

        state.running = false;
        if let Some(handle) = state.handle.take() {
            let _ = handle.shutdown.send(true);
            if let Err(e) = handle.task.await {
                tracing::error!(error = %e, "Scheduler loop task failed");
            }
        }

        metrics::set_scheduler_running(false);
        tracing::info!("Scheduler stopped");
    }

    /// Whether the loop is running
    pub async fn is_running(&self) -> bool {
        self.state.lock().await.running
    }

    /// Run one gated iteration on the calling task
    ///
    /// Returns `None` when the proxy is unhealthy. Sinks are invoked exactly as
    /// in the loop.
    pub async fn run_once(&self) -> error::Result<Option<ScanOutcome>> {
        self.engine.iterate().await
    }

    /// Time between two healthy cycles
    pub fn period(&self) -> Duration {
        self.engine.period
    }

    /// Wait after an unhealthy gate or a failed iteration
    pub fn unhealthy_backoff(&self) -> Duration {
        self.engine.unhealthy_backoff
    }
}

/// Builder for [`Scheduler`]
pub struct SchedulerBuilder {
    pool: ScanPool,
    health: Arc<dyn HealthCheck>,
    watchlist: Arc<dyn WatchlistSource>,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn PersistenceSink>,
    broadcaster: Option<Arc<dyn LiveBroadcaster>>,
    period: Duration,
    unhealthy_backoff: Duration,
}

impl SchedulerBuilder {
    /// Attach a live broadcaster
    pub fn broadcaster(mut self, broadcaster: Arc<dyn LiveBroadcaster>) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    /// Set the time between two healthy cycles
    pub fn period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Set the wait after an unhealthy gate or a failed iteration
    pub fn unhealthy_backoff(mut self, backoff: Duration) -> Self {
        self.unhealthy_backoff = backoff;
        self
    }

    pub fn build(self) -> Scheduler {
        Scheduler {
            engine: Arc::new(Engine {
                pool: self.pool,
                health: self.health,
                watchlist: self.watchlist,
                notifier: self.notifier,
                store: self.store,
                broadcaster: self.broadcaster,
                period: self.period,
                unhealthy_backoff: self.unhealthy_backoff,
                cycle_lock: Mutex::new(()),
            }),
            state: Mutex::new(SchedulerState::default()),
        }
    }
}
