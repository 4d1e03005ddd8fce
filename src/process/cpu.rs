//! CPU rate calculation for process metrics.
//!
//! Per-process CPU usage is always a delta between two samples of the
//! cumulative user+system tick counter, divided by the wall-clock interval
//! between them. A process seen for the first time reports 0%.

use once_cell::sync::Lazy;
use std::time::Instant;

/// Get system clock ticks per second (usually 100, but can vary).
fn get_clk_tck() -> f64 {
    // SAFETY: sysconf is safe to call with _SC_CLK_TCK
    // Returns -1 on error, 0 if undefined - both are handled by the > 0 check
    let tck = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if tck > 0 {
        return tck as f64;
    }
    100.0
}

/// System clock ticks per second (for CPU time calculation).
pub static CLK_TCK: Lazy<f64> = Lazy::new(get_clk_tck);

/// Last observed counters of a single process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessBaseline {
    pub ticks: u64,
    /// Start time in ticks since boot, used to detect pid reuse.
    pub start_time: u64,
    pub sampled_at: Instant,
}

/// Percentage of one CPU consumed between two tick readings.
///
/// `100 * (now - prev) / (clk_tck * elapsed_secs)`. Returns 0 when the
/// interval or the tick rate is not positive, or when the counter went
/// backwards.
pub fn cpu_rate_percent(prev_ticks: u64, now_ticks: u64, clk_tck: f64, elapsed_secs: f64) -> f64 {
    let denominator = clk_tck * elapsed_secs;
    if denominator <= 0.0 || now_ticks < prev_ticks {
        return 0.0;
    }
    100.0 * (now_ticks - prev_ticks) as f64 / denominator
}

/// CPU percent for a process given its previous baseline, if any.
///
/// No baseline, a different start time (the pid was reused) or a counter
/// that moved backwards all count as a first observation.
pub fn process_cpu_percent(
    baseline: Option<&ProcessBaseline>,
    ticks: u64,
    start_time: u64,
    now: Instant,
    clk_tck: f64,
) -> f64 {
    match baseline {
        Some(prev) if prev.start_time == start_time && ticks >= prev.ticks => {
            let elapsed = now.saturating_duration_since(prev.sampled_at).as_secs_f64();
            cpu_rate_percent(prev.ticks, ticks, clk_tck, elapsed)
        }
        _ => 0.0,
    }
}

/// Scales a single-CPU percentage to the whole machine and caps it at 100.
pub fn normalize_percent(percent: f64, cpus: usize) -> f64 {
    if cpus == 0 {
        return percent.min(100.0);
    }
    (percent / cpus as f64).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn baseline(ticks: u64, start_time: u64, at: Instant) -> ProcessBaseline {
        ProcessBaseline {
            ticks,
            start_time,
            sampled_at: at,
        }
    }

    #[test]
    fn test_cpu_rate_percent_formula() {
        // 50 ticks over one second at 100 ticks/s
        assert_eq!(cpu_rate_percent(100, 150, 100.0, 1.0), 50.0);
        assert_eq!(cpu_rate_percent(0, 200, 100.0, 2.0), 100.0);
        assert_eq!(cpu_rate_percent(10, 10, 100.0, 1.0), 0.0);
    }

    #[test]
    fn test_cpu_rate_percent_guards() {
        assert_eq!(cpu_rate_percent(100, 150, 100.0, 0.0), 0.0);
        assert_eq!(cpu_rate_percent(100, 150, 0.0, 1.0), 0.0);
        assert_eq!(cpu_rate_percent(150, 100, 100.0, 1.0), 0.0);
    }

    #[test]
    fn test_first_observation_is_zero() {
        let now = Instant::now();
        assert_eq!(process_cpu_percent(None, 5000, 1, now, 100.0), 0.0);
    }

    #[test]
    fn test_second_observation_uses_delta() {
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(1);
        let prev = baseline(100, 7, t0);
        assert_eq!(process_cpu_percent(Some(&prev), 150, 7, t1, 100.0), 50.0);
    }

    #[test]
    fn test_reused_pid_is_first_observation() {
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(1);
        let prev = baseline(100, 7, t0);
        assert_eq!(process_cpu_percent(Some(&prev), 150, 8, t1, 100.0), 0.0);
    }

    #[test]
    fn test_backwards_counter_is_first_observation() {
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_millis(500);
        let prev = baseline(900, 7, t0);
        assert_eq!(process_cpu_percent(Some(&prev), 10, 7, t1, 100.0), 0.0);
    }

    #[test]
    fn test_multi_core_rate_exceeds_100() {
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(1);
        let prev = baseline(0, 1, t0);
        // four busy cores at 100 ticks/s
        assert_eq!(process_cpu_percent(Some(&prev), 400, 1, t1, 100.0), 400.0);
    }

    #[test]
    fn test_normalize_percent() {
        assert_eq!(normalize_percent(400.0, 4), 100.0);
        assert_eq!(normalize_percent(50.0, 2), 25.0);
        assert_eq!(normalize_percent(900.0, 4), 100.0);
        assert_eq!(normalize_percent(150.0, 0), 100.0);
    }

    #[test]
    fn test_clk_tck_positive() {
        assert!(*CLK_TCK > 0.0);
    }
}
