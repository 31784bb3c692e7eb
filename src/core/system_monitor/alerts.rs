//! Threshold alerts for the latest snapshot.
//!
//! Only CPU and memory are evaluated. Disk and network are shown for
//! information and never raise an alert.

use std::fmt;

use super::metrics::Snapshot;
use serde::{Deserialize, Serialize};

/// Alert thresholds in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertThresholds {
    pub cpu: f64,
    pub memory: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            cpu: 90.0,
            memory: 90.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertMetric {
    Cpu,
    Memory,
}

impl fmt::Display for AlertMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertMetric::Cpu => write!(f, "CPU"),
            AlertMetric::Memory => write!(f, "Memory"),
        }
    }
}

/// Outcome of comparing one metric against its threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertState {
    pub metric: AlertMetric,
    pub current_value: f64,
    pub threshold: f64,
    pub breached: bool,
}

impl AlertState {
    fn check(metric: AlertMetric, current_value: f64, threshold: f64) -> Self {
        Self {
            metric,
            current_value,
            threshold,
            breached: current_value > threshold,
        }
    }

    pub fn message(&self) -> String {
        if self.breached {
            format!(
                "{} usage at {:.1}% (alert threshold: {:.1}%)",
                self.metric, self.current_value, self.threshold
            )
        } else {
            format!("{} usage at {:.1}%", self.metric, self.current_value)
        }
    }
}

/// Evaluate the CPU and memory thresholds, in that order
pub fn evaluate(snapshot: &Snapshot, thresholds: &AlertThresholds) -> Vec<AlertState> {
    vec![
        AlertState::check(AlertMetric::Cpu, snapshot.cpu_pct, thresholds.cpu),
        AlertState::check(AlertMetric::Memory, snapshot.memory_pct, thresholds.memory),
    ]
}
