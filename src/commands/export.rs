//! Export command handler.
//!
//! Collects a fixed number of samples and writes them as CSV.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;

use super::monitor::{start_runtime, SHUTDOWN_GRACE};
use crate::core::system_monitor::write_csv;

pub const DEFAULT_SAMPLES: u64 = 10;

/// Default export file name, timestamped so repeated exports don't collide
pub fn default_export_path() -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("metrics_data_{}.csv", stamp))
}

/// Execute the export command
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = super::resolve_config(matches)?;
    let samples = matches
        .get_one::<u64>("samples")
        .copied()
        .unwrap_or(DEFAULT_SAMPLES)
        .max(1);
    let output = matches
        .get_one::<String>("output")
        .map(PathBuf::from)
        .unwrap_or_else(default_export_path);

    println!(
        "{}",
        format!("Collecting {} samples...", samples).dimmed()
    );

    let mut runtime = start_runtime(&config)?;
    let mut last_state = None;
    while let Some(state) = runtime.next_state() {
        let done = state.tick >= samples;
        last_state = Some(state);
        if done {
            break;
        }
    }
    let result = runtime.shutdown(SHUTDOWN_GRACE);

    let state = last_state.context("No samples were collected")?;
    write_csv(&state, &output).with_context(|| format!("Failed to write {:?}", output))?;

    println!(
        "{}",
        format!(
            "✓ Exported {} samples to {}",
            state.series.len(),
            output.display()
        )
        .green()
        .bold()
    );

    result.context("Monitoring ended with an error")
}
