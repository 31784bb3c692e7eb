//! The metrics source capability and the timeout-bounded wrapper the sampler calls through.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::metrics::RawMetrics;
use crate::error::SourceError;

/// Anything that can produce one reading of host metrics on demand.
///
/// Implementations may block; the caller runs them on the blocking pool and
/// abandons the call after its own timeout.
pub trait MetricsSource: Send + 'static {
    fn sample(&mut self) -> Result<RawMetrics, SourceError>;

    /// Short label used in log lines
    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> MetricsSource for F
where
    F: FnMut() -> Result<RawMetrics, SourceError> + Send + 'static,
{
    fn sample(&mut self) -> Result<RawMetrics, SourceError> {
        self()
    }
}

/// Shared handle so a sample can outlive the tick that started it.
#[derive(Clone)]
pub struct SharedSource {
    inner: Arc<Mutex<Box<dyn MetricsSource>>>,
}

impl SharedSource {
    pub fn new<S: MetricsSource>(source: S) -> Self {
        Self::from_boxed(Box::new(source))
    }

    pub fn from_boxed(source: Box<dyn MetricsSource>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(source)),
        }
    }

    pub fn name(&self) -> String {
        match self.inner.try_lock() {
            Some(source) => source.name().to_string(),
            None => "busy".to_string(),
        }
    }

    /// Take one sample, giving up after `timeout`.
    ///
    /// An abandoned call keeps the source locked until it returns; samples
    /// requested meanwhile fail fast with [`SourceError::Busy`].
    pub async fn sample(&self, timeout: Duration) -> Result<RawMetrics, SourceError> {
        let inner = Arc::clone(&self.inner);
        let call = tokio::task::spawn_blocking(move || {
            let mut source = inner.try_lock().ok_or(SourceError::Busy)?;
            source.sample()
        });

        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(SourceError::Panicked(join_err.to_string())),
            Err(_) => Err(SourceError::Timeout(timeout)),
        }
    }
}
