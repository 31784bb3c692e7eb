//! Read-only views handed to readers of the monitor.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::alerts::AlertState;
use super::history::MetricSeries;
use super::metrics::{ProcessSample, Snapshot};

/// The latest consistent bundle of series and derived views.
///
/// Replaced wholesale on every successful tick, never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishedState {
    /// Number of ticks published so far (0 = nothing collected yet)
    pub tick: u64,
    pub series: MetricSeries,
    pub alerts: Vec<AlertState>,
    pub top_processes: Vec<ProcessSample>,
    pub latest: Option<Snapshot>,
    pub published_at: Option<DateTime<Utc>>,
}

impl PublishedState {
    pub fn is_empty(&self) -> bool {
        self.tick == 0
    }

    pub fn any_breached(&self) -> bool {
        self.alerts.iter().any(|a| a.breached)
    }

    pub fn idle_percent(&self) -> Option<f64> {
        self.latest.as_ref().map(|s| s.idle_frac * 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    Cancelled,
    SourceExhausted,
}

/// Where the collection loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopState {
    Idle,
    Sampling,
    Aggregating,
    Published,
    Stopped(StopReason),
}

impl LoopState {
    pub fn is_stopped(&self) -> bool {
        matches!(self, LoopState::Stopped(_))
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopState::Idle => write!(f, "idle"),
            LoopState::Sampling => write!(f, "sampling"),
            LoopState::Aggregating => write!(f, "aggregating"),
            LoopState::Published => write!(f, "published"),
            LoopState::Stopped(StopReason::Cancelled) => write!(f, "stopped"),
            LoopState::Stopped(StopReason::SourceExhausted) => {
                write!(f, "monitoring stopped: metrics source unavailable")
            }
        }
    }
}

/// Loop diagnostics, published separately so a miss never touches [`PublishedState`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorStatus {
    pub state: LoopState,
    pub consecutive_misses: u32,
    pub total_misses: u64,
    pub ticks_published: u64,
    pub discarded_ticks: u64,
    pub last_error: Option<String>,
}

impl Default for MonitorStatus {
    fn default() -> Self {
        Self {
            state: LoopState::Idle,
            consecutive_misses: 0,
            total_misses: 0,
            ticks_published: 0,
            discarded_ticks: 0,
            last_error: None,
        }
    }
}
