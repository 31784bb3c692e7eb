use std::path::Path;

use sysinfo::{Components, Disks, Networks, System};

use super::metrics::{ProcessSample, RawMetrics};
use super::source::MetricsSource;
use crate::error::SourceError;

/// Sensor labels that identify the CPU package temperature, in order of preference
const CPU_SENSOR_HINTS: &[&str] = &["coretemp", "package id", "tctl", "cpu"];

/// Configuration for the sysinfo-backed source
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Mount point whose usage is reported as disk %
    pub disk_mount_point: String,
    pub collect_temperature: bool,
    pub collect_processes: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            disk_mount_point: "/".to_string(),
            collect_temperature: true,
            collect_processes: true,
        }
    }
}

/// Metrics source that reads the local host through sysinfo
pub struct SysinfoCollector {
    system: System,
    components: Components,
    disks: Disks,
    networks: Networks,
    config: CollectorConfig,
    mount_missing_reported: bool,
}

impl SysinfoCollector {
    /// Create a new SysinfoCollector with default configuration
    pub fn new() -> Self {
        Self::with_config(CollectorConfig::default())
    }

    /// Create a new SysinfoCollector with custom configuration.
    ///
    /// Blocks for sysinfo's minimum CPU update interval so the first sample
    /// already carries a meaningful CPU reading.
    pub fn with_config(config: CollectorConfig) -> Self {
        let mut system = System::new_all();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        system.refresh_all();

        Self {
            system,
            components: Components::new_with_refreshed_list(),
            disks: Disks::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
            config,
            mount_missing_reported: false,
        }
    }

    fn collect_memory(&self) -> f64 {
        let total = self.system.total_memory();
        let used = self.system.used_memory();
        if total > 0 {
            (used as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    fn collect_disk(&mut self) -> f64 {
        let wanted = Path::new(&self.config.disk_mount_point);
        let mut disk = self.disks.iter().find(|disk| disk.mount_point() == wanted);

        if disk.is_none() {
            disk = self.disks.iter().next();
            if !self.mount_missing_reported {
                self.mount_missing_reported = true;
                log::warn!(
                    "mount point {:?} not found, reporting {:?} instead",
                    wanted,
                    disk.map(|d| d.mount_point())
                );
            }
        }

        let Some(disk) = disk else {
            log::debug!("no mounted disks reported, disk usage defaults to 0");
            return 0.0;
        };

        let total = disk.total_space();
        let used = total.saturating_sub(disk.available_space());
        if total > 0 {
            (used as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    fn collect_network_bytes(&self) -> u64 {
        self.networks
            .values()
            .map(|data| data.total_received() + data.total_transmitted())
            .fold(0u64, u64::saturating_add)
    }

    fn collect_temperature(&self) -> Option<f64> {
        CPU_SENSOR_HINTS.iter().find_map(|hint| {
            self.components
                .iter()
                .filter(|comp| comp.label().to_lowercase().contains(hint))
                .find_map(|comp| comp.temperature())
                .map(f64::from)
        })
    }

    fn collect_processes(&self) -> Vec<ProcessSample> {
        self.system
            .processes()
            .values()
            .map(|proc| ProcessSample {
                name: proc.name().to_string_lossy().to_string(),
                cpu_pct: f64::from(proc.cpu_usage()),
            })
            .collect()
    }
}

impl MetricsSource for SysinfoCollector {
    fn sample(&mut self) -> Result<RawMetrics, SourceError> {
        self.system.refresh_all();
        self.disks.refresh(true);
        self.networks.refresh(true);

        // CPU usage and idle come from the same refresh window
        let cpu_pct = f64::from(self.system.global_cpu_usage());
        let idle_frac = (1.0 - cpu_pct / 100.0).clamp(0.0, 1.0);

        let temperature_c = if self.config.collect_temperature {
            self.components.refresh(true);
            self.collect_temperature()
        } else {
            None
        };

        let processes = if self.config.collect_processes {
            self.collect_processes()
        } else {
            Vec::new()
        };

        Ok(RawMetrics {
            cpu_pct,
            memory_pct: self.collect_memory(),
            disk_pct: self.collect_disk(),
            network_bytes: self.collect_network_bytes(),
            idle_frac,
            temperature_c,
            processes,
        })
    }

    fn name(&self) -> &str {
        "sysinfo"
    }
}

impl Default for SysinfoCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_mount_point_is_flagged() {
        let mut collector = SysinfoCollector::with_config(CollectorConfig {
            disk_mount_point: "/no/such/mount/point".to_string(),
            collect_temperature: false,
            collect_processes: false,
        });
        assert!(!collector.mount_missing_reported);

        let raw = collector.sample().unwrap();
        assert!(collector.mount_missing_reported);
        assert!((0.0..=100.0).contains(&raw.disk_pct));
        assert!(raw.processes.is_empty());
        assert_eq!(raw.temperature_c, None);

        // Later samples keep working without flipping the flag back
        collector.sample().unwrap();
        assert!(collector.mount_missing_reported);
    }
}
