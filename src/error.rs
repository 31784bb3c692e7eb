use std::io;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single sample from the metrics source.
///
/// Always recoverable: the tick is skipped and counted as a miss.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceError {
    #[error("metrics source did not respond within {0:?}")]
    Timeout(Duration),

    #[error("metrics source is still busy with an abandoned sample")]
    Busy,

    #[error("metrics source unavailable: {0}")]
    Unavailable(String),

    #[error("metrics source reported invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: f64 },

    #[error("metrics source panicked: {0}")]
    Panicked(String),
}

/// A configuration value outside its declared range.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: i64 },

    #[error("unknown setting: {0}")]
    UnknownKey(String),

    #[error("invalid value for {field}: {value}")]
    Unparsable { field: &'static str, value: String },
}

/// Invariant violation while committing a tick. Signals a defect, never user input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PublishError {
    #[error("point at {elapsed}s is older than the newest retained point at {newest}s")]
    OutOfOrder { elapsed: f64, newest: f64 },

    #[error("series lengths diverged: {0:?}")]
    LengthMismatch([usize; 4]),

    #[error("series time axes diverged at index {0}")]
    Misaligned(usize),
}

/// Top-level error type for the monitor library
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("monitoring stopped: metrics source unavailable ({misses} consecutive misses)")]
    SourceExhausted { misses: u32 },

    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("Publish failed: {0}")]
    Publish(#[from] PublishError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Result type alias for the monitor library
pub type Result<T> = std::result::Result<T, MonitorError>;

impl MonitorError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        MonitorError::Config(msg.into())
    }

    /// Create an export error
    pub fn export<S: Into<String>>(msg: S) -> Self {
        MonitorError::Export(msg.into())
    }

    pub fn runtime<S: Into<String>>(msg: S) -> Self {
        MonitorError::Runtime(msg.into())
    }

    /// True when the collection loop gave up on the metrics source.
    pub fn is_source_exhausted(&self) -> bool {
        matches!(self, MonitorError::SourceExhausted { .. })
    }
}
