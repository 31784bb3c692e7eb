//! CSV dump of the retained series.

use std::fs;
use std::path::Path;

use super::state::PublishedState;
use crate::error::{MonitorError, Result};

pub const CSV_HEADER: &str = "Time,CPU (%),Memory (%),Disk (%),Network (MB)";

/// One exported row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportRow {
    pub time: f64,
    pub cpu_pct: f64,
    pub memory_pct: f64,
    pub disk_pct: f64,
    pub network_mb: f64,
}

/// Rows of every retained point, oldest first
pub fn rows(state: &PublishedState) -> Vec<ExportRow> {
    let series = &state.series;
    series
        .cpu
        .iter()
        .zip(series.memory.iter())
        .zip(series.disk.iter())
        .zip(series.network.iter())
        .map(|(((cpu, memory), disk), network)| ExportRow {
            time: cpu.elapsed_seconds,
            cpu_pct: cpu.value,
            memory_pct: memory.value,
            disk_pct: disk.value,
            network_mb: network.value,
        })
        .collect()
}

/// Serialize the retained points as CSV with a header row
pub fn to_csv(state: &PublishedState) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + state.series.len() * 48);
    out.push_str(CSV_HEADER);
    out.push('\n');

    for row in rows(state) {
        // `{}` on f64 prints the shortest representation that parses back exactly
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            row.time, row.cpu_pct, row.memory_pct, row.disk_pct, row.network_mb
        ));
    }
    out
}

/// Parse CSV produced by [`to_csv`]
pub fn parse_csv(input: &str) -> Result<Vec<ExportRow>> {
    let mut lines = input.lines().filter(|line| !line.trim().is_empty());

    match lines.next() {
        Some(header) if header.trim_end() == CSV_HEADER => {}
        Some(header) => {
            return Err(MonitorError::export(format!(
                "unexpected header: {}",
                header
            )))
        }
        None => return Err(MonitorError::export("empty input")),
    }

    lines
        .enumerate()
        .map(|(index, line)| {
            parse_row(line).map_err(|e| MonitorError::export(format!("row {}: {}", index + 1, e)))
        })
        .collect()
}

fn parse_row(line: &str) -> std::result::Result<ExportRow, String> {
    let fields: Vec<f64> = line
        .trim_end()
        .split(',')
        .map(|field| {
            field
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("invalid number '{}'", field))
        })
        .collect::<std::result::Result<_, _>>()?;

    match fields.as_slice() {
        [time, cpu_pct, memory_pct, disk_pct, network_mb] => Ok(ExportRow {
            time: *time,
            cpu_pct: *cpu_pct,
            memory_pct: *memory_pct,
            disk_pct: *disk_pct,
            network_mb: *network_mb,
        }),
        _ => Err(format!("expected 5 columns, found {}", fields.len())),
    }
}

/// Write the CSV dump to `path`, creating parent directories as needed
pub fn write_csv(state: &PublishedState, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, to_csv(state))?;
    log::info!("exported {} points to {}", state.series.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::system_monitor::aggregator::Aggregator;
    use crate::core::system_monitor::alerts::AlertThresholds;
    use crate::core::system_monitor::metrics::Snapshot;

    fn state_with(points: &[(f64, f64, f64, f64, f64)]) -> PublishedState {
        let mut aggregator = Aggregator::new(300);
        let thresholds = AlertThresholds::default();
        let mut state = PublishedState::default();
        for &(t, cpu, memory, disk, network) in points {
            let snapshot = Snapshot {
                elapsed_seconds: t,
                cpu_pct: cpu,
                memory_pct: memory,
                disk_pct: disk,
                network_mb: network,
                idle_frac: 0.5,
                ..Default::default()
            };
            state = (*aggregator.apply_with(snapshot, 300, &thresholds, 10).unwrap()).clone();
        }
        state
    }

    #[test]
    fn test_header_row() {
        let csv = to_csv(&PublishedState::default());
        assert_eq!(csv, "Time,CPU (%),Memory (%),Disk (%),Network (MB)\n");
    }

    #[test]
    fn test_rows_in_time_order() {
        let state = state_with(&[(0.0, 1.5, 2.0, 3.0, 4.25), (1.01, 100.0, 0.0, 50.0, 4.5)]);
        let csv = to_csv(&state);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "0,1.5,2,3,4.25");
        assert_eq!(lines[2], "1.01,100,0,50,4.5");
    }

    #[test]
    fn test_round_trip_reproduces_points() {
        let state = state_with(&[
            (0.0, 12.345678901234, 40.1, 71.9, 1024.000001),
            (1.0, 0.1 + 0.2, 40.2, 71.9, 1024.5),
            (2.03, 99.99, 40.3, 72.0, 1030.75),
        ]);

        let parsed = parse_csv(&to_csv(&state)).unwrap();
        assert_eq!(parsed, rows(&state));
        assert_eq!(parsed[1].cpu_pct, 0.1 + 0.2);
    }

    #[test]
    fn test_parse_rejects_wrong_header() {
        let err = parse_csv("time,cpu\n1,2\n").unwrap_err();
        assert!(err.to_string().contains("unexpected header"));
    }

    #[test]
    fn test_parse_rejects_short_row() {
        let input = format!("{}\n1,2,3\n", CSV_HEADER);
        assert!(parse_csv(&input).is_err());
    }
}
