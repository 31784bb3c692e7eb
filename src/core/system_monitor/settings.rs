//! Validated settings consumed by the collection loop.

use std::time::Duration;

use super::alerts::AlertThresholds;
use super::history::DEFAULT_WINDOW_SIZE;
use super::ranking::DEFAULT_TOP_N;
use crate::error::ValidationError;

pub const MIN_REFRESH_SECS: f64 = 0.5;
pub const MAX_REFRESH_SECS: f64 = 5.0;
pub const MIN_WINDOW_SIZE: usize = 10;
pub const MAX_WINDOW_SIZE: usize = 300;
pub const MIN_ALERT_THRESHOLD: f64 = 50.0;
pub const MAX_ALERT_THRESHOLD: f64 = 100.0;
pub const MAX_SAMPLE_TIMEOUT_SECS: f64 = 30.0;
pub const MAX_FAILURE_BUDGET: u32 = 10_000;

pub const DEFAULT_REFRESH_SECS: f64 = 1.0;
pub const DEFAULT_SAMPLE_TIMEOUT_SECS: f64 = 2.0;
pub const DEFAULT_FAILURE_BUDGET: u32 = 10;

/// Settings that may change while the monitor runs. Read at the start of every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSettings {
    refresh_interval: Duration,
    window_size: usize,
    thresholds: AlertThresholds,
    top_n_processes: usize,
}

impl MonitorSettings {
    pub fn new(
        refresh_interval_seconds: f64,
        window_size: i64,
        cpu_alert_threshold: f64,
        memory_alert_threshold: f64,
        top_n_processes: i64,
    ) -> Result<Self, ValidationError> {
        let refresh = check_range(
            "refresh_interval_seconds",
            refresh_interval_seconds,
            MIN_REFRESH_SECS,
            MAX_REFRESH_SECS,
        )?;
        let window = check_range(
            "window_size",
            window_size as f64,
            MIN_WINDOW_SIZE as f64,
            MAX_WINDOW_SIZE as f64,
        )?;
        let cpu = check_range(
            "cpu_alert_threshold",
            cpu_alert_threshold,
            MIN_ALERT_THRESHOLD,
            MAX_ALERT_THRESHOLD,
        )?;
        let memory = check_range(
            "memory_alert_threshold",
            memory_alert_threshold,
            MIN_ALERT_THRESHOLD,
            MAX_ALERT_THRESHOLD,
        )?;
        if top_n_processes < 0 {
            return Err(ValidationError::Negative {
                field: "top_n_processes",
                value: top_n_processes,
            });
        }

        Ok(Self {
            refresh_interval: Duration::from_secs_f64(refresh),
            window_size: window as usize,
            thresholds: AlertThresholds { cpu, memory },
            top_n_processes: top_n_processes as usize,
        })
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn thresholds(&self) -> &AlertThresholds {
        &self.thresholds
    }

    pub fn top_n_processes(&self) -> usize {
        self.top_n_processes
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs_f64(DEFAULT_REFRESH_SECS),
            window_size: DEFAULT_WINDOW_SIZE,
            thresholds: AlertThresholds::default(),
            top_n_processes: DEFAULT_TOP_N,
        }
    }
}

/// Fixed for the lifetime of a collection loop
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorOptions {
    pub sample_timeout: Duration,
    /// Consecutive misses tolerated before the loop gives up
    pub failure_budget: u32,
}

impl CollectorOptions {
    pub fn new(sample_timeout_seconds: f64, failure_budget: i64) -> Result<Self, ValidationError> {
        if !sample_timeout_seconds.is_finite() {
            return Err(ValidationError::NotFinite {
                field: "sample_timeout_seconds",
            });
        }
        if sample_timeout_seconds <= 0.0 || sample_timeout_seconds > MAX_SAMPLE_TIMEOUT_SECS {
            return Err(ValidationError::OutOfRange {
                field: "sample_timeout_seconds",
                value: sample_timeout_seconds,
                min: 0.0,
                max: MAX_SAMPLE_TIMEOUT_SECS,
            });
        }
        if failure_budget < 1 || failure_budget > i64::from(MAX_FAILURE_BUDGET) {
            return Err(ValidationError::OutOfRange {
                field: "failure_budget",
                value: failure_budget as f64,
                min: 1.0,
                max: f64::from(MAX_FAILURE_BUDGET),
            });
        }

        Ok(Self {
            sample_timeout: Duration::from_secs_f64(sample_timeout_seconds),
            failure_budget: failure_budget as u32,
        })
    }
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            sample_timeout: Duration::from_secs_f64(DEFAULT_SAMPLE_TIMEOUT_SECS),
            failure_budget: DEFAULT_FAILURE_BUDGET,
        }
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(value)
}
