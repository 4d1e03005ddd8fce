//! Per-process sampling.
//!
//! Reading `/proc/<pid>/stat` is side-effect free and may run on any thread.
//! Turning the raw counters into a [`ProcessMetric`] updates the pid's
//! baseline in [`PollState`] and must happen on the polling thread.

use std::path::Path;
use std::time::Instant;

use crate::error::SampleError;
use crate::process::cpu::{normalize_percent, CLK_TCK};
use crate::process::memory::{pages_to_mb, PAGE_SIZE};
use crate::process::stat::{read_pid_stat, PidStat};
use crate::snapshot::ProcessMetric;
use crate::state::PollState;

/// Unit conversion settings for one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleUnits {
    pub clk_tck: f64,
    pub page_size: u64,
    /// When set, CPU percentages are divided by this many CPUs and capped at 100.
    pub normalize_cpus: Option<usize>,
}

impl Default for SampleUnits {
    fn default() -> Self {
        Self {
            clk_tck: *CLK_TCK,
            page_size: *PAGE_SIZE,
            normalize_cpus: None,
        }
    }
}

/// Converts raw counters into a metric row, updating the pid's baseline.
pub fn to_metric(
    stat: &PidStat,
    state: &mut PollState,
    now: Instant,
    units: &SampleUnits,
) -> ProcessMetric {
    let mut cpu = state.observe_process(
        stat.pid,
        stat.total_ticks(),
        stat.start_time,
        now,
        units.clk_tck,
    );
    if let Some(cpus) = units.normalize_cpus {
        cpu = normalize_percent(cpu, cpus);
    }

    ProcessMetric {
        pid: stat.pid,
        name: stat.name.clone(),
        state: stat.state,
        cpu_metric: cpu,
        mem_metric: pages_to_mb(stat.rss_pages, units.page_size),
    }
}

/// Reads and converts one process in a single step.
pub fn sample_process(
    root: &Path,
    pid: u32,
    state: &mut PollState,
    now: Instant,
    units: &SampleUnits,
) -> Result<ProcessMetric, SampleError> {
    let stat = read_pid_stat(root, pid)?;
    Ok(to_metric(&stat, state, now, units))
}
