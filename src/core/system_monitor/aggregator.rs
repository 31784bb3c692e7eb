//! Owns the rolling series and turns each snapshot into the next published state.

use std::sync::Arc;

use chrono::Utc;

use super::alerts::{evaluate, AlertThresholds};
use super::history::MetricSeries;
use super::metrics::Snapshot;
use super::ranking::rank;
use super::settings::MonitorSettings;
use super::state::PublishedState;
use crate::error::PublishError;

pub struct Aggregator {
    series: MetricSeries,
    ticks: u64,
}

impl Aggregator {
    pub fn new(window_size: usize) -> Self {
        Self {
            series: MetricSeries::with_capacity(window_size),
            ticks: 0,
        }
    }

    pub fn series(&self) -> &MetricSeries {
        &self.series
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn apply(
        &mut self,
        snapshot: Snapshot,
        settings: &MonitorSettings,
    ) -> Result<Arc<PublishedState>, PublishError> {
        self.apply_with(
            snapshot,
            settings.window_size(),
            settings.thresholds(),
            settings.top_n_processes(),
        )
    }

    /// Append a snapshot to every series and build the next published state.
    ///
    /// All-or-nothing: the update is staged on a copy and only committed once
    /// the series are verified to be aligned. On error the aggregator is left
    /// exactly as it was.
    pub fn apply_with(
        &mut self,
        snapshot: Snapshot,
        window_size: usize,
        thresholds: &AlertThresholds,
        top_n: usize,
    ) -> Result<Arc<PublishedState>, PublishError> {
        let mut staged = self.series.clone();
        staged.set_capacity(window_size);
        staged.push_snapshot(&snapshot)?;
        staged.check_aligned()?;

        let alerts = evaluate(&snapshot, thresholds);
        let top_processes = rank(&snapshot.processes, top_n);

        self.series = staged;
        self.ticks += 1;

        Ok(Arc::new(PublishedState {
            tick: self.ticks,
            series: self.series.clone(),
            alerts,
            top_processes,
            latest: Some(snapshot),
            published_at: Some(Utc::now()),
        }))
    }
}
