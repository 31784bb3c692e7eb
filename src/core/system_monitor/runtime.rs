//! The collection loop and the handles used to drive it.
//!
//! One task is the only writer: it samples, aggregates and publishes on a
//! fixed cadence. Readers hold watch receivers and never block it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, Interval, MissedTickBehavior};

use super::aggregator::Aggregator;
use super::settings::{CollectorOptions, MonitorSettings};
use super::source::{MetricsSource, SharedSource};
use super::sampler::Sampler;
use super::state::{LoopState, MonitorStatus, PublishedState, StopReason};
use crate::error::{MonitorError, PublishError, Result, SourceError};

/// What a single tick ended with
#[derive(Debug)]
pub enum TickOutcome {
    Published(Arc<PublishedState>),
    /// The source failed; the tick was skipped
    Missed(SourceError),
    /// Commit failed an invariant check; the previous state stays published
    Discarded(PublishError),
}

/// Reader-side ends of the channels a [`Collector`] writes to
pub struct MonitorChannels {
    pub state: watch::Receiver<Arc<PublishedState>>,
    pub status: watch::Receiver<MonitorStatus>,
    pub settings: watch::Sender<MonitorSettings>,
}

/// Sole owner of the sampler and aggregator for one monitoring session
pub struct Collector {
    sampler: Sampler,
    aggregator: Aggregator,
    options: CollectorOptions,
    settings_rx: watch::Receiver<MonitorSettings>,
    state_tx: watch::Sender<Arc<PublishedState>>,
    status_tx: watch::Sender<MonitorStatus>,
    status: MonitorStatus,
}

impl Collector {
    pub fn new(
        source: SharedSource,
        settings: MonitorSettings,
        options: CollectorOptions,
    ) -> (Self, MonitorChannels) {
        let (state_tx, state_rx) = watch::channel(Arc::new(PublishedState::default()));
        let (status_tx, status_rx) = watch::channel(MonitorStatus::default());
        let aggregator = Aggregator::new(settings.window_size());
        let (settings_tx, settings_rx) = watch::channel(settings);

        let collector = Self {
            sampler: Sampler::new(source, options.sample_timeout),
            aggregator,
            options,
            settings_rx,
            state_tx,
            status_tx,
            status: MonitorStatus::default(),
        };
        let channels = MonitorChannels {
            state: state_rx,
            status: status_rx,
            settings: settings_tx,
        };
        (collector, channels)
    }

    pub fn status(&self) -> &MonitorStatus {
        &self.status
    }

    /// Run one sample → aggregate → publish cycle.
    ///
    /// Returns `Err(SourceExhausted)` once consecutive misses exceed the
    /// failure budget; the loop must stop after that.
    pub async fn tick(&mut self) -> Result<TickOutcome> {
        let settings = self.settings_rx.borrow().clone();

        self.set_state(LoopState::Sampling);
        let snapshot = match self.sampler.tick().await {
            Ok(snapshot) => snapshot,
            Err(err) => return self.record_miss(err),
        };

        self.set_state(LoopState::Aggregating);
        match self.aggregator.apply(snapshot, &settings) {
            Ok(state) => {
                self.state_tx.send_replace(Arc::clone(&state));
                self.status.consecutive_misses = 0;
                self.status.ticks_published += 1;
                self.set_state(LoopState::Published);
                log::trace!("published tick {}", state.tick);
                Ok(TickOutcome::Published(state))
            }
            Err(err) => {
                log::error!("discarding tick, commit failed: {}", err);
                self.status.discarded_ticks += 1;
                self.status.last_error = Some(err.to_string());
                self.set_state(LoopState::Idle);
                Ok(TickOutcome::Discarded(err))
            }
        }
    }

    fn record_miss(&mut self, err: SourceError) -> Result<TickOutcome> {
        self.status.consecutive_misses = self.status.consecutive_misses.saturating_add(1);
        self.status.total_misses = self.status.total_misses.saturating_add(1);
        self.status.last_error = Some(err.to_string());

        let misses = self.status.consecutive_misses;
        if misses > self.options.failure_budget {
            log::error!(
                "metrics source failed {} times in a row, stopping: {}",
                misses,
                err
            );
            self.set_state(LoopState::Stopped(StopReason::SourceExhausted));
            return Err(MonitorError::SourceExhausted { misses });
        }

        log::warn!(
            "skipping tick ({} consecutive misses): {}",
            misses,
            err
        );
        self.set_state(LoopState::Sampling);
        Ok(TickOutcome::Missed(err))
    }

    fn set_state(&mut self, state: LoopState) {
        self.status.state = state;
        self.status_tx.send_replace(self.status.clone());
    }

    /// Tick on the configured cadence until shut down or the source is exhausted.
    ///
    /// A shutdown request is only observed between ticks.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        log::info!(
            "collection loop started (source: {}, timeout: {:?}, failure budget: {})",
            self.sampler.source_name(),
            self.sampler.timeout(),
            self.options.failure_budget
        );

        let mut period = self.settings_rx.borrow().refresh_interval();
        let mut ticker = new_ticker(period, false);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await?;

                    let next = self.settings_rx.borrow().refresh_interval();
                    if next != period {
                        log::debug!("refresh interval changed {:?} -> {:?}", period, next);
                        period = next;
                        ticker = new_ticker(period, true);
                    }
                }
            }
        }

        log::info!("collection loop stopped");
        self.set_state(LoopState::Stopped(StopReason::Cancelled));
        Ok(())
    }
}

fn new_ticker(period: Duration, delay_first: bool) -> Interval {
    let mut ticker = if delay_first {
        interval_at(Instant::now() + period, period)
    } else {
        interval(period)
    };
    // A slow tick never causes a burst of catch-up ticks
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

/// Cloneable stop request, safe to move into signal handlers
#[derive(Clone)]
pub struct StopSignal(broadcast::Sender<()>);

impl StopSignal {
    pub fn stop(&self) {
        // No receivers means the loop already ended
        let _ = self.0.send(());
    }
}

/// Handle to a collection loop running on the current tokio runtime
pub struct MonitorHandle {
    state_rx: watch::Receiver<Arc<PublishedState>>,
    status_rx: watch::Receiver<MonitorStatus>,
    settings_tx: watch::Sender<MonitorSettings>,
    shutdown_tx: broadcast::Sender<()>,
    task: Option<JoinHandle<Result<()>>>,
}

impl MonitorHandle {
    /// Spawn the collection loop. Must be called from within a tokio runtime.
    pub fn spawn<S: MetricsSource>(
        source: S,
        settings: MonitorSettings,
        options: CollectorOptions,
    ) -> Self {
        Self::spawn_shared(SharedSource::new(source), settings, options)
    }

    pub fn spawn_shared(
        source: SharedSource,
        settings: MonitorSettings,
        options: CollectorOptions,
    ) -> Self {
        let (collector, channels) = Collector::new(source, settings, options);
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        let task = tokio::spawn(collector.run(shutdown_rx));

        Self {
            state_rx: channels.state,
            status_rx: channels.status,
            settings_tx: channels.settings,
            shutdown_tx,
            task: Some(task),
        }
    }

    /// The most recently published state
    pub fn state(&self) -> Arc<PublishedState> {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<PublishedState>> {
        self.state_rx.clone()
    }

    pub fn status(&self) -> MonitorStatus {
        self.status_rx.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<MonitorStatus> {
        self.status_rx.clone()
    }

    pub fn settings(&self) -> MonitorSettings {
        self.settings_tx.borrow().clone()
    }

    /// Replace the settings; they take effect at the start of the next tick
    pub fn update_settings(&self, settings: MonitorSettings) {
        self.settings_tx.send_replace(settings);
    }

    pub fn stop_signal(&self) -> StopSignal {
        StopSignal(self.shutdown_tx.clone())
    }

    /// Wait for the next published state. `None` once the loop has stopped.
    pub async fn next_state(&mut self) -> Option<Arc<PublishedState>> {
        loop {
            if self.status_rx.borrow_and_update().state.is_stopped() {
                return None;
            }
            tokio::select! {
                changed = self.state_rx.changed() => {
                    changed.ok()?;
                    return Some(self.state_rx.borrow_and_update().clone());
                }
                changed = self.status_rx.changed() => {
                    changed.ok()?;
                }
            }
        }
    }

    /// Wait for the loop to end on its own and return how it ended
    pub async fn join(&mut self) -> Result<()> {
        match self.task.take() {
            Some(task) => task
                .await
                .map_err(|e| MonitorError::runtime(format!("collection task failed: {}", e)))?,
            None => Ok(()),
        }
    }

    /// Ask the loop to stop after the current tick and wait for it
    pub async fn stop(mut self) -> Result<()> {
        let _ = self.shutdown_tx.send(());
        self.join().await
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
    }
}

/// Collection loop on a dedicated runtime, for synchronous callers.
pub struct MonitorRuntime {
    monitor: MonitorHandle,
    runtime: tokio::runtime::Runtime,
}

impl MonitorRuntime {
    pub fn new<S: MetricsSource>(
        source: S,
        settings: MonitorSettings,
        options: CollectorOptions,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .thread_name("metrics-worker")
            .build()?;

        let monitor = {
            let _guard = runtime.enter();
            MonitorHandle::spawn(source, settings, options)
        };

        Ok(Self { monitor, runtime })
    }

    pub fn monitor(&self) -> &MonitorHandle {
        &self.monitor
    }

    /// Block until the next state is published. `None` once the loop has stopped.
    pub fn next_state(&mut self) -> Option<Arc<PublishedState>> {
        self.runtime.block_on(self.monitor.next_state())
    }

    /// Stop the loop and tear the runtime down
    pub fn shutdown(self, grace: Duration) -> Result<()> {
        let Self { monitor, runtime } = self;
        let result = runtime.block_on(monitor.stop());
        // An abandoned sample may still be running on the blocking pool
        runtime.shutdown_timeout(grace);
        result
    }
}
