use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::system_monitor::settings::{
    DEFAULT_FAILURE_BUDGET, DEFAULT_REFRESH_SECS, DEFAULT_SAMPLE_TIMEOUT_SECS,
};
use crate::core::system_monitor::{
    CollectorOptions, MonitorSettings, DEFAULT_TOP_N, DEFAULT_WINDOW_SIZE,
};
use crate::error::ValidationError;

/// Keys accepted by [`Config::set_value`]
pub const CONFIG_KEYS: &[&str] = &[
    "refresh_interval_seconds",
    "window_size",
    "cpu_alert_threshold",
    "memory_alert_threshold",
    "top_n_processes",
    "sample_timeout_seconds",
    "failure_budget",
    "disk_mount_point",
];

/// User settings as stored on disk. Unvalidated until turned into
/// [`MonitorSettings`] / [`CollectorOptions`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub refresh_interval_seconds: f64,
    pub window_size: i64,
    pub cpu_alert_threshold: f64,
    pub memory_alert_threshold: f64,
    pub top_n_processes: i64,
    pub sample_timeout_seconds: f64,
    pub failure_budget: i64,
    pub disk_mount_point: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval_seconds: DEFAULT_REFRESH_SECS,
            window_size: DEFAULT_WINDOW_SIZE as i64,
            cpu_alert_threshold: 90.0,
            memory_alert_threshold: 90.0,
            top_n_processes: DEFAULT_TOP_N as i64,
            sample_timeout_seconds: DEFAULT_SAMPLE_TIMEOUT_SECS,
            failure_budget: i64::from(DEFAULT_FAILURE_BUDGET),
            disk_mount_point: "/".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let data = fs::read(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        // If the file is empty or corrupted, return default config
        if data.is_empty() {
            return Ok(Config::default());
        }
        Ok(serde_json::from_slice(&data).unwrap_or_else(|e| {
            log::warn!(
                "ignoring unreadable config file {:?}: {}",
                config_path,
                e
            );
            Config::default()
        }))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data =
            serde_json::to_vec_pretty(self).with_context(|| "Failed to serialize config")?;

        fs::write(config_path, data)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join("rmon").join("config.json"))
    }

    /// Validate the live-adjustable settings
    pub fn monitor_settings(&self) -> std::result::Result<MonitorSettings, ValidationError> {
        MonitorSettings::new(
            self.refresh_interval_seconds,
            self.window_size,
            self.cpu_alert_threshold,
            self.memory_alert_threshold,
            self.top_n_processes,
        )
    }

    /// Validate the settings fixed for a collection loop
    pub fn collector_options(&self) -> std::result::Result<CollectorOptions, ValidationError> {
        CollectorOptions::new(self.sample_timeout_seconds, self.failure_budget)
    }

    /// Check every field without building anything
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        self.monitor_settings()?;
        self.collector_options()?;
        Ok(())
    }

    /// Set a field from its textual form. The result is validated before
    /// being accepted, so a rejected value leaves the config unchanged.
    pub fn set_value(&mut self, key: &str, value: &str) -> std::result::Result<(), ValidationError> {
        let mut updated = self.clone();
        match key {
            "refresh_interval_seconds" => {
                updated.refresh_interval_seconds = parse_value("refresh_interval_seconds", value)?
            }
            "window_size" => updated.window_size = parse_value("window_size", value)?,
            "cpu_alert_threshold" => {
                updated.cpu_alert_threshold = parse_value("cpu_alert_threshold", value)?
            }
            "memory_alert_threshold" => {
                updated.memory_alert_threshold = parse_value("memory_alert_threshold", value)?
            }
            "top_n_processes" => updated.top_n_processes = parse_value("top_n_processes", value)?,
            "sample_timeout_seconds" => {
                updated.sample_timeout_seconds = parse_value("sample_timeout_seconds", value)?
            }
            "failure_budget" => updated.failure_budget = parse_value("failure_budget", value)?,
            "disk_mount_point" => updated.disk_mount_point = value.to_string(),
            other => return Err(ValidationError::UnknownKey(other.to_string())),
        }

        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Current value of a field in textual form
    pub fn get_value(&self, key: &str) -> Option<String> {
        let value = match key {
            "refresh_interval_seconds" => self.refresh_interval_seconds.to_string(),
            "window_size" => self.window_size.to_string(),
            "cpu_alert_threshold" => self.cpu_alert_threshold.to_string(),
            "memory_alert_threshold" => self.memory_alert_threshold.to_string(),
            "top_n_processes" => self.top_n_processes.to_string(),
            "sample_timeout_seconds" => self.sample_timeout_seconds.to_string(),
            "failure_budget" => self.failure_budget.to_string(),
            "disk_mount_point" => self.disk_mount_point.clone(),
            _ => return None,
        };
        Some(value)
    }
}

fn parse_value<T: std::str::FromStr>(
    field: &'static str,
    value: &str,
) -> std::result::Result<T, ValidationError> {
    value
        .trim()
        .parse()
        .map_err(|_| ValidationError::Unparsable {
            field,
            value: value.to_string(),
        })
}
