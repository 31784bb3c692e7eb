use serde::{Deserialize, Serialize};

/// One reading as handed over by a metrics source, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMetrics {
    pub cpu_pct: f64,
    pub memory_pct: f64,
    pub disk_pct: f64,
    pub network_bytes: u64, // Cumulative sent + received
    pub idle_frac: f64,
    pub temperature_c: Option<f64>,
    pub processes: Vec<ProcessSample>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessSample {
    pub name: String,
    pub cpu_pct: f64,
}

impl ProcessSample {
    pub fn new<S: Into<String>>(name: S, cpu_pct: f64) -> Self {
        Self {
            name: name.into(),
            cpu_pct,
        }
    }
}

/// Validated, timestamped bundle of everything sampled in one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub elapsed_seconds: f64,
    pub cpu_pct: f64,
    pub memory_pct: f64,
    pub disk_pct: f64,
    pub network_mb: f64,
    pub idle_frac: f64,
    pub temperature_c: Option<f64>,
    pub processes: Vec<ProcessSample>,
}
