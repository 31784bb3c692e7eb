use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rmon::core::system_monitor::{
    CollectorOptions, LoopState, MonitorHandle, MonitorRuntime, MonitorSettings, RawMetrics,
    StopReason,
};
use rmon::{MonitorError, SourceError};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn fast_settings(cpu_threshold: f64) -> MonitorSettings {
    MonitorSettings::new(0.5, 10, cpu_threshold, 90.0, 3).unwrap()
}

/// Source whose network counter grows by 1 MB per sample
fn counting_source(cpu: f64) -> impl FnMut() -> Result<RawMetrics, SourceError> + Send + 'static {
    let bytes = Arc::new(AtomicU64::new(0));
    move || {
        let total = bytes.fetch_add(1_048_576, Ordering::SeqCst) + 1_048_576;
        Ok(RawMetrics {
            cpu_pct: cpu,
            memory_pct: 42.0,
            disk_pct: 63.0,
            network_bytes: total,
            idle_frac: 1.0 - cpu / 100.0,
            temperature_c: Some(51.0),
            processes: vec![],
        })
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_monitor_publishes_aligned_states() {
    let monitor = MonitorHandle::spawn(
        counting_source(20.0),
        fast_settings(90.0),
        CollectorOptions::default(),
    );
    let mut rx = monitor.subscribe();

    let mut last_tick = 0;
    for _ in 0..3 {
        timeout(WAIT, rx.changed())
            .await
            .expect("no state published in time")
            .unwrap();
        let state = rx.borrow_and_update().clone();

        assert!(state.tick > last_tick);
        last_tick = state.tick;
        assert!(state.series.check_aligned().is_ok());
        assert_eq!(state.series.len() as u64, state.tick.min(10));
        assert_eq!(
            state.series.network.last().unwrap().value,
            state.tick as f64
        );
    }

    monitor.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_reader_never_sees_partial_update() {
    let monitor = MonitorHandle::spawn(
        counting_source(20.0),
        fast_settings(90.0),
        CollectorOptions::default(),
    );
    let rx = monitor.subscribe();

    let reader = tokio::spawn(async move {
        let mut checks = 0u64;
        let deadline = tokio::time::Instant::now() + Duration::from_millis(1600);
        while tokio::time::Instant::now() < deadline {
            let state = rx.borrow().clone();
            let times = state.series.cpu.times();
            assert_eq!(state.series.memory.times(), times);
            assert_eq!(state.series.disk.times(), times);
            assert_eq!(state.series.network.times(), times);
            checks += 1;
            tokio::task::yield_now().await;
        }
        checks
    });

    let checks = reader.await.unwrap();
    assert!(checks > 0);
    assert!(monitor.state().tick >= 2);
    monitor.stop().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_marks_loop_cancelled() {
    let mut monitor = MonitorHandle::spawn(
        counting_source(20.0),
        fast_settings(90.0),
        CollectorOptions::default(),
    );
    timeout(WAIT, monitor.next_state())
        .await
        .unwrap()
        .expect("loop stopped early");

    let status_rx = monitor.subscribe_status();
    timeout(WAIT, monitor.stop()).await.unwrap().unwrap();

    assert_eq!(
        status_rx.borrow().state,
        LoopState::Stopped(StopReason::Cancelled)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_signal_from_another_task() {
    let mut monitor = MonitorHandle::spawn(
        counting_source(20.0),
        fast_settings(90.0),
        CollectorOptions::default(),
    );
    let stop = monitor.stop_signal();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(700)).await;
        stop.stop();
    });

    while timeout(WAIT, monitor.next_state()).await.unwrap().is_some() {}

    timeout(WAIT, monitor.join()).await.unwrap().unwrap();
    assert!(monitor.status().state.is_stopped());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failing_source_exhausts_budget() {
    let options = CollectorOptions::new(1.0, 1).unwrap();
    let mut monitor = MonitorHandle::spawn(
        || -> Result<RawMetrics, SourceError> {
            Err(SourceError::Unavailable("sensor bus offline".into()))
        },
        fast_settings(90.0),
        options,
    );

    assert!(timeout(WAIT, monitor.next_state()).await.unwrap().is_none());

    let err = timeout(WAIT, monitor.join()).await.unwrap().unwrap_err();
    assert!(matches!(err, MonitorError::SourceExhausted { misses: 2 }));
    assert!(err.is_source_exhausted());

    let status = monitor.status();
    assert_eq!(status.state, LoopState::Stopped(StopReason::SourceExhausted));
    assert_eq!(status.total_misses, 2);
    assert!(monitor.state().is_empty());
}

#[test]
fn test_panicking_source_counts_as_miss() {
    let calls = Arc::new(AtomicU64::new(0));
    let seen = Arc::clone(&calls);
    let mut healthy = counting_source(20.0);
    let source = move || {
        if seen.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("sensor driver crashed");
        }
        healthy()
    };

    let mut runtime =
        MonitorRuntime::new(source, fast_settings(90.0), CollectorOptions::default()).unwrap();

    let state = runtime.next_state().expect("loop should survive a panicking sample");
    assert_eq!(state.tick, 1);

    let status = runtime.monitor().status();
    assert_eq!(status.total_misses, 1);
    assert!(status.last_error.unwrap().contains("panicked"));
    assert!(calls.load(Ordering::SeqCst) >= 2);

    runtime.shutdown(Duration::from_secs(1)).unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_threshold_change_applies_to_following_ticks() {
    let mut monitor = MonitorHandle::spawn(
        counting_source(85.0),
        fast_settings(90.0),
        CollectorOptions::default(),
    );

    let state = timeout(WAIT, monitor.next_state()).await.unwrap().unwrap();
    assert!(!state.any_breached());

    monitor.update_settings(fast_settings(80.0));

    let mut breached = false;
    for _ in 0..3 {
        let state = timeout(WAIT, monitor.next_state()).await.unwrap().unwrap();
        if state.alerts[0].threshold == 80.0 {
            breached = state.alerts[0].breached;
            break;
        }
    }
    assert!(breached);
    monitor.stop().await.unwrap();
}
