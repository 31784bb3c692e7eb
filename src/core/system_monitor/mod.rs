//! Resource monitoring core.
//!
//! Samples a metrics source on a fixed cadence, keeps bounded per-metric
//! histories, evaluates CPU/memory thresholds, ranks processes by CPU and
//! publishes the result as an immutable [`PublishedState`].

pub mod aggregator;
pub mod alerts;
mod collector;
pub mod export;
mod history;
mod metrics;
pub mod ranking;
pub mod runtime;
pub mod sampler;
pub mod settings;
mod source;
mod state;

pub use aggregator::Aggregator;
pub use alerts::{evaluate, AlertMetric, AlertState, AlertThresholds};
pub use collector::{CollectorConfig, SysinfoCollector};
pub use export::{parse_csv, to_csv, write_csv, ExportRow, CSV_HEADER};
pub use history::{MetricSeries, SeriesPoint, WindowedSeries, DEFAULT_WINDOW_SIZE};
pub use metrics::{ProcessSample, RawMetrics, Snapshot};
pub use ranking::{rank, DEFAULT_TOP_N};
pub use runtime::{
    Collector, MonitorChannels, MonitorHandle, MonitorRuntime, StopSignal, TickOutcome,
};
pub use sampler::{build_snapshot, NetworkCounter, Sampler};
pub use settings::{CollectorOptions, MonitorSettings};
pub use source::{MetricsSource, SharedSource};
pub use state::{LoopState, MonitorStatus, PublishedState, StopReason};
