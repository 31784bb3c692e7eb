//! Text rendering of the published state for terminal output.

use colored::Colorize;

use crate::core::system_monitor::{AlertState, MonitorStatus, PublishedState, Snapshot};

/// Percentage shown in red when its alert is breached
pub fn format_alert_value(alert: &AlertState) -> String {
    let text = format!("{:.1}%", alert.current_value);
    if alert.breached {
        text.red().bold().to_string()
    } else {
        text.bold().to_string()
    }
}

/// "48.0°C", or "N/A" when the host has no readable sensor
pub fn format_temperature(temperature_c: Option<f64>) -> String {
    match temperature_c {
        Some(t) => format!("{:.1}°C", t),
        None => "N/A".to_string(),
    }
}

/// Format elapsed seconds as "1m 05.50s" / "12.25s"
pub fn format_elapsed(seconds: f64) -> String {
    if seconds >= 60.0 {
        let minutes = (seconds / 60.0).floor();
        format!("{}m {:05.2}s", minutes as u64, seconds - minutes * 60.0)
    } else {
        format!("{:.2}s", seconds)
    }
}

fn format_current_metrics(state: &PublishedState, snapshot: &Snapshot) -> Vec<String> {
    let mut lines = Vec::new();
    for alert in &state.alerts {
        lines.push(format!(
            "  {:<20} {}",
            format!("{} Usage:", alert.metric),
            format_alert_value(alert)
        ));
    }
    lines.push(format!(
        "  {:<20} {}",
        "Disk Usage:",
        format!("{:.1}%", snapshot.disk_pct).bold()
    ));
    lines.push(format!(
        "  {:<20} {}",
        "Network Activity:",
        format!("{:.2} MB", snapshot.network_mb).bold()
    ));
    lines.push(format!(
        "  {:<20} {}",
        "CPU Temperature:",
        format_temperature(snapshot.temperature_c).bold()
    ));
    lines
}

/// Multi-line view of the latest state: current metrics, alerts, idle time and top processes
pub fn render_state(state: &PublishedState) -> String {
    let Some(snapshot) = state.latest.as_ref() else {
        return "Waiting for the first sample...".dimmed().to_string();
    };

    let mut lines = vec![format!(
        "{} {}",
        "Current Metrics".cyan().bold(),
        format!(
            "(t = {}, tick {})",
            format_elapsed(snapshot.elapsed_seconds),
            state.tick
        )
        .dimmed()
    )];
    lines.extend(format_current_metrics(state, snapshot));

    for alert in state.alerts.iter().filter(|a| a.breached) {
        lines.push(format!("  {}", format!("⚠️  {}", alert.message()).red().bold()));
    }

    lines.push(format!(
        "  {:<20} {}",
        "System Idle Time:",
        format!("{:.2}%", snapshot.idle_frac * 100.0).bold()
    ));

    if !state.top_processes.is_empty() {
        lines.push(String::new());
        lines.push("Top Processes by CPU Usage".cyan().bold().to_string());
        lines.push(format!("  {:<32} {:>8}", "Process".dimmed(), "CPU (%)".dimmed()));
        for process in &state.top_processes {
            lines.push(format!("  {:<32} {:>8.1}", process.name, process.cpu_pct));
        }
    }

    lines.join("\n")
}

/// One-line loop diagnostics; empty while everything is healthy
pub fn render_status(status: &MonitorStatus) -> String {
    if status.state.is_stopped() {
        return status.state.to_string().red().bold().to_string();
    }
    if status.consecutive_misses == 0 {
        return String::new();
    }
    let reason = status.last_error.as_deref().unwrap_or("unknown error");
    format!(
        "{} consecutive missed samples ({} total): {}",
        status.consecutive_misses, status.total_misses, reason
    )
    .yellow()
    .to_string()
}
