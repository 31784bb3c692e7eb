// Command handlers module
pub mod config;
pub mod export;
pub mod monitor;

use anyhow::{Context, Result};
use clap::ArgMatches;

use crate::core::Config;

/// Command-line flags that override config file values, as (flag, config key)
pub const SETTING_FLAGS: &[(&str, &str)] = &[
    ("interval", "refresh_interval_seconds"),
    ("window", "window_size"),
    ("cpu-alert", "cpu_alert_threshold"),
    ("memory-alert", "memory_alert_threshold"),
    ("top", "top_n_processes"),
    ("timeout", "sample_timeout_seconds"),
    ("budget", "failure_budget"),
    ("disk", "disk_mount_point"),
];

/// Load the config file and apply any overrides given on the command line
pub fn resolve_config(matches: &ArgMatches) -> Result<Config> {
    let mut config = Config::load()?;
    for (flag, key) in SETTING_FLAGS {
        if let Some(value) = matches.try_get_one::<String>(flag).ok().flatten() {
            config
                .set_value(key, value)
                .with_context(|| format!("Invalid value for --{}", flag))?;
        }
    }
    Ok(config)
}

// Re-exports for cleaner imports
pub use export::execute as export;
pub use monitor::execute as monitor;
