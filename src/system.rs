//! System-wide metrics collection from /proc filesystem.
//!
//! This module reads the aggregate CPU tick counters from `/proc/stat` and
//! the memory summary from `/proc/meminfo`. CPU usage is a delta against the
//! previous reading held in a [`CpuBaseline`]; memory is a point-in-time value.

use std::fs;
use std::path::Path;

use crate::error::SampleError;
use crate::process::memory::{kb_to_mb, parse_kb_value};

/// Number of tick counters summed into the aggregate total.
pub const CPU_FIELDS: usize = 7;

/// Aggregate CPU tick counters from the `cpu` line of `/proc/stat`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
}

impl CpuTimes {
    /// Sum of all seven counters.
    pub fn total(&self) -> u64 {
        self.user
            .saturating_add(self.nice)
            .saturating_add(self.system)
            .saturating_add(self.idle)
            .saturating_add(self.iowait)
            .saturating_add(self.irq)
            .saturating_add(self.softirq)
    }
}

/// Parsed CPU summary: aggregate counters plus the number of per-core lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuSummary {
    pub times: CpuTimes,
    pub online_cpus: usize,
}

/// Parses the content of `/proc/stat`.
///
/// The aggregate `cpu` line must carry at least seven numeric counters;
/// extra counters (steal, guest, ...) are ignored.
pub fn parse_cpu_summary(path: &Path, content: &str) -> Result<CpuSummary, SampleError> {
    let mut aggregate: Option<CpuTimes> = None;
    let mut online_cpus = 0;

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        let label = match parts.next() {
            Some(l) => l,
            None => continue,
        };

        if label == "cpu" {
            let values: Vec<&str> = parts.take(CPU_FIELDS).collect();
            if values.len() < CPU_FIELDS {
                return Err(SampleError::malformed(
                    path,
                    format!(
                        "cpu line has {} counters, expected at least {}",
                        values.len(),
                        CPU_FIELDS
                    ),
                ));
            }
            let mut nums = [0u64; CPU_FIELDS];
            for (slot, raw) in nums.iter_mut().zip(&values) {
                *slot = raw.parse().map_err(|_| {
                    SampleError::malformed(path, format!("cpu counter '{}' is not numeric", raw))
                })?;
            }
            aggregate = Some(CpuTimes {
                user: nums[0],
                nice: nums[1],
                system: nums[2],
                idle: nums[3],
                iowait: nums[4],
                irq: nums[5],
                softirq: nums[6],
            });
        } else if label.len() > 3
            && label.starts_with("cpu")
            && label[3..].chars().all(|c| c.is_ascii_digit())
        {
            online_cpus += 1;
        }
    }

    match aggregate {
        Some(times) => Ok(CpuSummary { times, online_cpus }),
        None => Err(SampleError::malformed(path, "no aggregate cpu line")),
    }
}

/// Reads the CPU summary from `<root>/stat`.
pub fn read_cpu_summary(root: &Path) -> Result<CpuSummary, SampleError> {
    let path = root.join("stat");
    let content = fs::read_to_string(&path).map_err(|e| SampleError::unavailable(&path, e))?;
    parse_cpu_summary(&path, &content)
}

/// Online CPU count reported by the C library, at least 1.
pub fn sysconf_online_cpus() -> usize {
    // SAFETY: sysconf is safe to call with _SC_NPROCESSORS_ONLN
    let n = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    if n > 0 {
        n as usize
    } else {
        1
    }
}

/// Previous aggregate counters for the system-wide delta. Zeroed at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuBaseline {
    pub prev_total: u64,
    pub prev_idle: u64,
}

impl CpuBaseline {
    /// Computes CPU usage since the previous reading and stores the new one.
    ///
    /// Returns 0 on the first call and whenever the total did not advance.
    /// The baseline is replaced on every call.
    pub fn update(&mut self, times: &CpuTimes) -> f64 {
        let total = times.total();
        let idle = times.idle;

        let percent = if self.prev_total == 0 {
            0.0
        } else {
            busy_percent(
                total.saturating_sub(self.prev_total),
                idle.saturating_sub(self.prev_idle),
            )
        };

        self.prev_total = total;
        self.prev_idle = idle;
        percent
    }
}

/// `100 * (total_diff - idle_diff) / total_diff`, or 0 when `total_diff` is 0.
pub fn busy_percent(total_diff: u64, idle_diff: u64) -> f64 {
    if total_diff == 0 {
        return 0.0;
    }
    100.0 * total_diff.saturating_sub(idle_diff) as f64 / total_diff as f64
}

/// Memory summary fields from `/proc/meminfo`, in kB. Missing fields are 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryInfo {
    pub total_kb: u64,
    pub free_kb: u64,
    pub buffers_kb: u64,
    pub cached_kb: u64,
}

impl MemoryInfo {
    pub fn total_mb(&self) -> f64 {
        kb_to_mb(self.total_kb)
    }

    /// `total - free - buffers - cached`, floored at 0.
    pub fn used_mb(&self) -> f64 {
        kb_to_mb(
            self.total_kb
                .saturating_sub(self.free_kb)
                .saturating_sub(self.buffers_kb)
                .saturating_sub(self.cached_kb),
        )
    }
}

/// Parses the content of `/proc/meminfo`. Unknown lines are skipped.
pub fn parse_meminfo(content: &str) -> MemoryInfo {
    let mut info = MemoryInfo::default();

    for line in content.lines() {
        if let Some(v) = line.strip_prefix("MemTotal:") {
            info.total_kb = parse_kb_value(v).unwrap_or(0);
        } else if let Some(v) = line.strip_prefix("MemFree:") {
            info.free_kb = parse_kb_value(v).unwrap_or(0);
        } else if let Some(v) = line.strip_prefix("Buffers:") {
            info.buffers_kb = parse_kb_value(v).unwrap_or(0);
        } else if let Some(v) = line.strip_prefix("Cached:") {
            info.cached_kb = parse_kb_value(v).unwrap_or(0);
        }
    }

    info
}

/// Reads the memory summary from `<root>/meminfo`.
pub fn read_meminfo(root: &Path) -> Result<MemoryInfo, SampleError> {
    let path = root.join("meminfo");
    let content = fs::read_to_string(&path).map_err(|e| SampleError::unavailable(&path, e))?;
    Ok(parse_meminfo(&content))
}
