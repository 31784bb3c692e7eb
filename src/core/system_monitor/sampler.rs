//! Turns raw source readings into validated, timestamped snapshots.

use std::time::{Duration, Instant};

use super::metrics::{ProcessSample, RawMetrics, Snapshot};
use super::source::SharedSource;
use crate::error::SourceError;

const BYTES_PER_MB: f64 = 1_048_576.0; // 2^20

/// Percentages slightly above 100 (rounding in the OS counters) are clamped
const PERCENT_SLACK: f64 = 0.5;

/// Tracks the cumulative network counter across ticks.
///
/// A counter that goes backwards (interface reset) is re-based on the last
/// seen total so the reported value never decreases.
#[derive(Debug, Clone, Default)]
pub struct NetworkCounter {
    last_raw: Option<u64>,
    offset: u64,
}

impl NetworkCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in a raw reading and return the cumulative total in MB
    pub fn observe(&mut self, raw_bytes: u64) -> f64 {
        if let Some(last) = self.last_raw {
            if raw_bytes < last {
                log::debug!(
                    "network counter went backwards ({} -> {}), rebasing",
                    last,
                    raw_bytes
                );
                self.offset = self.offset.saturating_add(last);
            }
        }
        self.last_raw = Some(raw_bytes);
        self.offset.saturating_add(raw_bytes) as f64 / BYTES_PER_MB
    }
}

/// Collects one snapshot per tick from a metrics source
pub struct Sampler {
    source: SharedSource,
    started_at: Instant,
    timeout: Duration,
    network: NetworkCounter,
    last_elapsed: f64,
}

impl Sampler {
    pub fn new(source: SharedSource, timeout: Duration) -> Self {
        Self::with_start(source, timeout, Instant::now())
    }

    pub fn with_start(source: SharedSource, timeout: Duration, started_at: Instant) -> Self {
        Self {
            source,
            started_at,
            timeout,
            network: NetworkCounter::new(),
            last_elapsed: 0.0,
        }
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn source_name(&self) -> String {
        self.source.name()
    }

    /// Sample the source once.
    ///
    /// On error nothing is recorded: the network counter and the time base
    /// are left as they were, so the next tick starts from the last good one.
    pub async fn tick(&mut self) -> Result<Snapshot, SourceError> {
        let raw = self.source.sample(self.timeout).await?;
        let elapsed = round_centis(self.started_at.elapsed().as_secs_f64()).max(self.last_elapsed);

        let mut network = self.network.clone();
        let snapshot = build_snapshot(raw, elapsed, &mut network)?;

        self.network = network;
        self.last_elapsed = snapshot.elapsed_seconds;
        Ok(snapshot)
    }
}

/// Validate a raw reading and convert it into a snapshot taken at `elapsed_seconds`.
pub fn build_snapshot(
    raw: RawMetrics,
    elapsed_seconds: f64,
    network: &mut NetworkCounter,
) -> Result<Snapshot, SourceError> {
    if !elapsed_seconds.is_finite() || elapsed_seconds < 0.0 {
        return Err(SourceError::InvalidValue {
            field: "elapsed_seconds",
            value: elapsed_seconds,
        });
    }

    let cpu_pct = check_percent("cpu_pct", raw.cpu_pct)?;
    let memory_pct = check_percent("memory_pct", raw.memory_pct)?;
    let disk_pct = check_percent("disk_pct", raw.disk_pct)?;

    if !raw.idle_frac.is_finite() || !(0.0..=1.0).contains(&raw.idle_frac) {
        return Err(SourceError::InvalidValue {
            field: "idle_frac",
            value: raw.idle_frac,
        });
    }

    if let Some(temp) = raw.temperature_c {
        if !temp.is_finite() {
            return Err(SourceError::InvalidValue {
                field: "temperature_c",
                value: temp,
            });
        }
    }

    let processes = sanitize_processes(raw.processes);

    Ok(Snapshot {
        elapsed_seconds,
        cpu_pct,
        memory_pct,
        disk_pct,
        network_mb: network.observe(raw.network_bytes),
        idle_frac: raw.idle_frac,
        temperature_c: raw.temperature_c,
        processes,
    })
}

fn check_percent(field: &'static str, value: f64) -> Result<f64, SourceError> {
    if value.is_finite() && (0.0..=100.0 + PERCENT_SLACK).contains(&value) {
        Ok(value.min(100.0))
    } else {
        Err(SourceError::InvalidValue { field, value })
    }
}

fn sanitize_processes(processes: Vec<ProcessSample>) -> Vec<ProcessSample> {
    let before = processes.len();
    let kept: Vec<_> = processes
        .into_iter()
        .filter(|p| p.cpu_pct.is_finite() && p.cpu_pct >= 0.0)
        .collect();

    if kept.len() != before {
        log::debug!(
            "dropped {} process entries with invalid cpu usage",
            before - kept.len()
        );
    }
    kept
}

fn round_centis(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}
