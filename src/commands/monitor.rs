//! Monitor command handler.
//!
//! Runs the collection loop and prints the published state after every tick.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ArgMatches;
use colored::Colorize;

use crate::core::system_monitor::{
    write_csv, CollectorConfig, MonitorRuntime, PublishedState, SysinfoCollector,
};
use crate::core::Config;
use crate::ui::{render_state, render_status};

/// How long shutdown waits for an abandoned sample to finish
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Start the sampling loop for the host described by `config`
pub fn start_runtime(config: &Config) -> Result<MonitorRuntime> {
    let settings = config.monitor_settings()?;
    let options = config.collector_options()?;

    let collector = SysinfoCollector::with_config(CollectorConfig {
        disk_mount_point: config.disk_mount_point.clone(),
        ..Default::default()
    });

    let runtime = MonitorRuntime::new(collector, settings, options)
        .context("Failed to start metrics runtime")?;

    let stop = runtime.monitor().stop_signal();
    ctrlc::set_handler(move || stop.stop()).context("Failed to install Ctrl-C handler")?;

    Ok(runtime)
}

/// Execute the monitor command
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = super::resolve_config(matches)?;
    let json_output = matches.get_flag("json");
    let max_ticks = matches.get_one::<u64>("ticks").copied();
    let export_path = matches.get_one::<String>("export").map(PathBuf::from);

    if !json_output {
        println!(
            "{}",
            format!(
                "Monitoring every {}s, window of {} samples. Press Ctrl-C to stop.",
                config.refresh_interval_seconds, config.window_size
            )
            .dimmed()
        );
    }

    let mut runtime = start_runtime(&config)?;
    let mut last_state: Option<std::sync::Arc<PublishedState>> = None;

    while let Some(state) = runtime.next_state() {
        if json_output {
            print_json(&state)?;
        } else {
            println!();
            println!("{}", render_state(&state));
            let status = render_status(&runtime.monitor().status());
            if !status.is_empty() {
                println!("{}", status);
            }
        }

        let done = max_ticks.is_some_and(|max| state.tick >= max);
        last_state = Some(state);
        if done {
            break;
        }
    }

    let final_status = runtime.monitor().status();
    let result = runtime.shutdown(SHUTDOWN_GRACE);

    if let (Some(path), Some(state)) = (export_path, last_state.as_ref()) {
        write_csv(state, &path)
            .with_context(|| format!("Failed to export metrics to {:?}", path))?;
        if !json_output {
            println!("{}", format!("Metrics exported to {}", path.display()).green());
        }
    }

    if let Err(err) = result {
        if !json_output {
            println!("{}", render_status(&final_status));
        }
        return Err(err).context("Monitoring ended with an error");
    }

    Ok(())
}

fn print_json(state: &PublishedState) -> Result<()> {
    let line = serde_json::json!({
        "tick": state.tick,
        "snapshot": state.latest,
        "alerts": state.alerts,
        "top_processes": state.top_processes,
    });
    println!("{}", serde_json::to_string(&line)?);
    Ok(())
}
