use super::metrics::ProcessSample;

pub const DEFAULT_TOP_N: usize = 10;

/// Top `top_n` processes by CPU usage, highest first.
///
/// The sort is stable, so processes with equal usage keep the order the
/// source listed them in. Duplicate names stay separate entries.
pub fn rank(processes: &[ProcessSample], top_n: usize) -> Vec<ProcessSample> {
    if top_n == 0 {
        return Vec::new();
    }

    let mut ranked = processes.to_vec();
    ranked.sort_by(|a, b| b.cpu_pct.total_cmp(&a.cpu_pct));
    ranked.truncate(top_n);
    ranked
}
