use rmon::core::system_monitor::{
    parse_csv, to_csv, write_csv, Aggregator, AlertThresholds, PublishedState, Snapshot, CSV_HEADER,
};
use std::fs;
use tempfile::TempDir;

fn collected_state(points: usize, window: usize) -> PublishedState {
    let mut aggregator = Aggregator::new(window);
    let thresholds = AlertThresholds::default();
    let mut state = PublishedState::default();
    for i in 0..points {
        let t = i as f64 * 1.01;
        let snapshot = Snapshot {
            elapsed_seconds: (t * 100.0).round() / 100.0,
            cpu_pct: (i as f64 * 7.3) % 100.0,
            memory_pct: 40.0 + i as f64 / 3.0,
            disk_pct: 71.25,
            network_mb: 1500.0 + i as f64 * 0.125,
            idle_frac: 0.5,
            ..Default::default()
        };
        state = (*aggregator
            .apply_with(snapshot, window, &thresholds, 10)
            .unwrap())
        .clone();
    }
    state
}

#[test]
fn test_export_round_trip_through_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("exports").join("metrics_data.csv");
    let state = collected_state(25, 20);

    write_csv(&state, &path).unwrap();
    let content = fs::read_to_string(&path).unwrap();
    let rows = parse_csv(&content).unwrap();

    assert_eq!(rows.len(), 20);
    let cpu = state.series.cpu.as_sequence();
    let network = state.series.network.as_sequence();
    for (i, row) in rows.iter().enumerate() {
        assert!((row.time - cpu[i].elapsed_seconds).abs() < 1e-9);
        assert!((row.cpu_pct - cpu[i].value).abs() < 1e-9);
        assert!((row.network_mb - network[i].value).abs() < 1e-9);
    }
}

#[test]
fn test_export_contains_only_retained_points() {
    let state = collected_state(15, 10);
    let csv = to_csv(&state);
    let mut lines = csv.lines();

    assert_eq!(lines.next(), Some(CSV_HEADER));
    assert_eq!(lines.count(), 10);

    let rows = parse_csv(&csv).unwrap();
    assert_eq!(rows[0].time, state.series.times()[0]);
}

#[test]
fn test_export_of_empty_state_is_header_only() {
    let rows = parse_csv(&to_csv(&PublishedState::default())).unwrap();
    assert!(rows.is_empty());
}
