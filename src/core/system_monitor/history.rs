use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::metrics::Snapshot;
use crate::error::PublishError;

pub const DEFAULT_WINDOW_SIZE: usize = 60;

/// One (time, value) pair of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub elapsed_seconds: f64,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(elapsed_seconds: f64, value: f64) -> Self {
        Self {
            elapsed_seconds,
            value,
        }
    }
}

/// Bounded FIFO history of one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowedSeries {
    capacity: usize,
    points: VecDeque<SeriesPoint>,
}

impl WindowedSeries {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_WINDOW_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            points: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a point, evicting the oldest one first when full.
    pub fn append(&mut self, point: SeriesPoint) -> Result<(), PublishError> {
        if let Some(newest) = self.points.back() {
            if point.elapsed_seconds < newest.elapsed_seconds {
                return Err(PublishError::OutOfOrder {
                    elapsed: point.elapsed_seconds,
                    newest: newest.elapsed_seconds,
                });
            }
        }

        if self.capacity == 0 {
            return Ok(());
        }
        while self.points.len() >= self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
        Ok(())
    }

    /// Change the retained length. Shrinking drops the oldest points right
    /// away; growing only raises the limit.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.points.len() > capacity {
            self.points.pop_front();
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SeriesPoint> {
        self.points.iter()
    }

    /// Ordered copy of the retained points, oldest first
    pub fn as_sequence(&self) -> Vec<SeriesPoint> {
        self.points.iter().copied().collect()
    }

    pub fn times(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.elapsed_seconds).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

impl Default for WindowedSeries {
    fn default() -> Self {
        Self::new()
    }
}

/// The four charted metrics, kept index-aligned on time
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricSeries {
    pub cpu: WindowedSeries,
    pub memory: WindowedSeries,
    pub disk: WindowedSeries,
    pub network: WindowedSeries,
}

impl MetricSeries {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cpu: WindowedSeries::with_capacity(capacity),
            memory: WindowedSeries::with_capacity(capacity),
            disk: WindowedSeries::with_capacity(capacity),
            network: WindowedSeries::with_capacity(capacity),
        }
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        for series in self.all_mut() {
            series.set_capacity(capacity);
        }
    }

    /// Append one snapshot to every series
    pub fn push_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), PublishError> {
        let t = snapshot.elapsed_seconds;
        self.cpu.append(SeriesPoint::new(t, snapshot.cpu_pct))?;
        self.memory.append(SeriesPoint::new(t, snapshot.memory_pct))?;
        self.disk.append(SeriesPoint::new(t, snapshot.disk_pct))?;
        self.network.append(SeriesPoint::new(t, snapshot.network_mb))?;
        Ok(())
    }

    /// Check that all series have the same length and the same time axis
    pub fn check_aligned(&self) -> Result<(), PublishError> {
        let lengths = [
            self.cpu.len(),
            self.memory.len(),
            self.disk.len(),
            self.network.len(),
        ];
        if lengths.iter().any(|&len| len != lengths[0]) {
            return Err(PublishError::LengthMismatch(lengths));
        }

        let axes = [
            self.cpu.iter(),
            self.memory.iter(),
            self.disk.iter(),
            self.network.iter(),
        ];
        let [mut cpu, mut memory, mut disk, mut network] = axes;
        for index in 0..lengths[0] {
            let times = [cpu.next(), memory.next(), disk.next(), network.next()]
                .map(|p| p.map(|p| p.elapsed_seconds));
            if times.iter().any(|t| *t != times[0]) {
                return Err(PublishError::Misaligned(index));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.cpu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cpu.is_empty()
    }

    pub fn times(&self) -> Vec<f64> {
        self.cpu.times()
    }

    fn all_mut(&mut self) -> [&mut WindowedSeries; 4] {
        [
            &mut self.cpu,
            &mut self.memory,
            &mut self.disk,
            &mut self.network,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_keeps_last_points() {
        let mut series = WindowedSeries::with_capacity(3);
        for t in 1..=4 {
            series.append(SeriesPoint::new(t as f64, t as f64 * 10.0)).unwrap();
        }

        assert_eq!(series.times(), vec![2.0, 3.0, 4.0]);
        assert_eq!(series.values(), vec![20.0, 30.0, 40.0]);
    }

    #[test]
    fn test_fifo_eviction_over_many_ticks() {
        let window = 10;
        let mut series = WindowedSeries::with_capacity(window);
        for t in 0..57 {
            series.append(SeriesPoint::new(t as f64, 0.0)).unwrap();
            assert!(series.len() <= window);
        }

        let expected: Vec<f64> = (47..57).map(|t| t as f64).collect();
        assert_eq!(series.times(), expected);
    }

    #[test]
    fn test_out_of_order_point_is_rejected() {
        let mut series = WindowedSeries::with_capacity(5);
        series.append(SeriesPoint::new(2.0, 1.0)).unwrap();
        let err = series.append(SeriesPoint::new(1.0, 1.0)).unwrap_err();
        assert_eq!(
            err,
            PublishError::OutOfOrder {
                elapsed: 1.0,
                newest: 2.0
            }
        );
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_equal_timestamps_are_accepted() {
        let mut series = WindowedSeries::with_capacity(5);
        series.append(SeriesPoint::new(1.0, 1.0)).unwrap();
        series.append(SeriesPoint::new(1.0, 2.0)).unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_shrinking_capacity_drops_oldest() {
        let mut series = WindowedSeries::with_capacity(5);
        for t in 0..5 {
            series.append(SeriesPoint::new(t as f64, 0.0)).unwrap();
        }

        series.set_capacity(2);
        assert_eq!(series.times(), vec![3.0, 4.0]);

        // Growing does not invent points
        series.set_capacity(10);
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_as_sequence_is_a_copy() {
        let mut series = WindowedSeries::with_capacity(3);
        series.append(SeriesPoint::new(1.0, 5.0)).unwrap();
        let view = series.as_sequence();
        series.append(SeriesPoint::new(2.0, 6.0)).unwrap();

        assert_eq!(view, vec![SeriesPoint::new(1.0, 5.0)]);
    }

    #[test]
    fn test_metric_series_alignment() {
        let mut series = MetricSeries::with_capacity(3);
        let snapshot = Snapshot {
            elapsed_seconds: 1.0,
            cpu_pct: 10.0,
            ..Default::default()
        };
        series.push_snapshot(&snapshot).unwrap();
        assert!(series.check_aligned().is_ok());

        series.disk.append(SeriesPoint::new(2.0, 0.0)).unwrap();
        assert!(matches!(
            series.check_aligned(),
            Err(PublishError::LengthMismatch(_))
        ));
    }

    #[test]
    fn test_misaligned_time_axis_is_detected() {
        let mut series = MetricSeries::with_capacity(3);
        series.cpu.append(SeriesPoint::new(1.0, 0.0)).unwrap();
        series.memory.append(SeriesPoint::new(1.0, 0.0)).unwrap();
        series.disk.append(SeriesPoint::new(1.5, 0.0)).unwrap();
        series.network.append(SeriesPoint::new(1.0, 0.0)).unwrap();

        assert_eq!(series.check_aligned(), Err(PublishError::Misaligned(0)));
    }
}
