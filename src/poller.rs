//! One poll cycle: enumerate, sample, assemble, rank.
//!
//! The poller owns the [`PollState`] for the lifetime of the program. Raw
//! per-process reads may fan out over the rayon pool; converting them into
//! rows (and thereby touching the per-pid baselines) happens afterwards on
//! the calling thread in enumeration order.

use ahash::AHashSet as HashSet;
use chrono::Local;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, instrument, warn};

use crate::error::SampleError;
use crate::poll_stats::{CycleReport, PollStats};
use crate::process::memory::PAGE_SIZE;
use crate::process::{
    enumerate_pids, read_pid_stat, to_metric, PidStat, ProcessFilter, SampleUnits, CLK_TCK,
};
use crate::rank::{rank, SortKey};
use crate::snapshot::{ProcessTable, Snapshot, SystemMetric, DEFAULT_CAPACITY, MAX_CAPACITY};
use crate::state::PollState;
use crate::system::{read_cpu_summary, read_meminfo, sysconf_online_cpus};

/// Poller settings.
#[derive(Debug, Clone)]
pub struct PollerOptions {
    /// Root of the procfs mount.
    pub proc_root: PathBuf,
    /// Maximum number of processes sampled per cycle, capped at `MAX_CAPACITY`.
    pub capacity: usize,
    /// Divide process CPU by the online CPU count and cap at 100.
    pub normalize_cpu: bool,
    /// Read per-process records on the rayon pool.
    pub parallel: bool,
    pub filter: ProcessFilter,
    pub clk_tck: f64,
    pub page_size: u64,
}

impl Default for PollerOptions {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            capacity: DEFAULT_CAPACITY,
            normalize_cpu: false,
            parallel: true,
            filter: ProcessFilter::default(),
            clk_tck: *CLK_TCK,
            page_size: *PAGE_SIZE,
        }
    }
}

type RawSample = (u32, Result<PidStat, SampleError>);

/// Sampling engine carrying state from one cycle to the next.
pub struct Poller {
    options: PollerOptions,
    state: PollState,
    system: SystemMetric,
    online_cpus: usize,
    stats: PollStats,
}

impl Poller {
    pub fn new(mut options: PollerOptions) -> Self {
        if options.capacity > MAX_CAPACITY {
            warn!(
                "Capacity {} exceeds maximum, clamping to {}",
                options.capacity, MAX_CAPACITY
            );
            options.capacity = MAX_CAPACITY;
        }
        Self {
            options,
            state: PollState::new(),
            system: SystemMetric::default(),
            online_cpus: sysconf_online_cpus(),
            stats: PollStats::default(),
        }
    }

    pub fn options(&self) -> &PollerOptions {
        &self.options
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    pub fn stats(&self) -> &PollStats {
        &self.stats
    }

    pub fn online_cpus(&self) -> usize {
        self.online_cpus
    }

    /// Runs one cycle stamped with the current time.
    pub fn poll(&mut self, sort: SortKey) -> Snapshot {
        self.poll_at(sort, Instant::now())
    }

    /// Runs one cycle, using `now` as the sample time for every process.
    #[instrument(level = "debug", skip(self, now))]
    pub fn poll_at(&mut self, sort: SortKey, now: Instant) -> Snapshot {
        let started = Instant::now();
        let root = self.options.proc_root.clone();
        let mut report = CycleReport::default();

        let system = self.sample_system(&root, &mut report);
        let mut table = ProcessTable::with_capacity(self.options.capacity);

        match enumerate_pids(&root, self.options.capacity) {
            Ok(enumeration) => {
                report.enumerated = enumeration.pids.len();
                report.overflow = enumeration.overflow;
                table.add_overflow(enumeration.overflow);
                if enumeration.overflow > 0 {
                    debug!(
                        "Dropped {} processes beyond capacity {}",
                        enumeration.overflow, self.options.capacity
                    );
                }

                let raw = self.read_all(&root, &enumeration.pids);
                let units = self.units();
                let mut seen = HashSet::with_capacity(raw.len());

                for (pid, result) in raw {
                    match result {
                        Ok(stat) => {
                            let row = to_metric(&stat, &mut self.state, now, &units);
                            seen.insert(pid);
                            report.sampled += 1;
                            if self.options.filter.allows(&row.name) {
                                table.push(row);
                            }
                        }
                        Err(e) if e.is_vanished() => {
                            report.vanished += 1;
                            debug!("Skipping pid {}: {}", pid, e);
                        }
                        Err(e) => {
                            report.unreadable += 1;
                            debug!("Failed to sample pid {}: {}", pid, e);
                        }
                    }
                }

                report.evicted = self.state.evict_unseen(&seen);
            }
            Err(e) => {
                // Baselines are kept: nothing was observed, so nothing is known to have exited.
                report.enumeration_failed = true;
                warn!("Process enumeration failed: {}", e);
            }
        }

        rank(table.as_mut_slice(), sort);
        report.shown = table.len();

        let cycle = self.state.finish_cycle();
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.stats.record(report, duration_ms);
        debug!(
            "Cycle {} done in {:.2}ms: {} sampled, {} shown, {} vanished, {} evicted",
            cycle, duration_ms, report.sampled, report.shown, report.vanished, report.evicted
        );

        Snapshot {
            cycle,
            taken_at: Local::now(),
            sort,
            system,
            processes: table,
        }
    }

    /// Reads the system summaries. A failed source keeps its previous value.
    fn sample_system(&mut self, root: &Path, report: &mut CycleReport) -> SystemMetric {
        match read_cpu_summary(root) {
            Ok(summary) => {
                if summary.online_cpus > 0 {
                    self.online_cpus = summary.online_cpus;
                }
                self.system.cpu_percent = self.state.observe_system_cpu(&summary.times);
            }
            Err(e) => {
                report.system_failures += 1;
                warn!("CPU summary unavailable, keeping previous value: {}", e);
            }
        }

        match read_meminfo(root) {
            Ok(info) => {
                self.system.mem_total_mb = info.total_mb();
                self.system.mem_used_mb = info.used_mb();
            }
            Err(e) => {
                report.system_failures += 1;
                warn!("Memory summary unavailable, keeping previous value: {}", e);
            }
        }

        self.system
    }

    fn read_all(&self, root: &Path, pids: &[u32]) -> Vec<RawSample> {
        if self.options.parallel && pids.len() > 1 {
            pids.par_iter()
                .map(|&pid| (pid, read_pid_stat(root, pid)))
                .collect()
        } else {
            pids.iter()
                .map(|&pid| (pid, read_pid_stat(root, pid)))
                .collect()
        }
    }

    fn units(&self) -> SampleUnits {
        SampleUnits {
            clk_tck: self.options.clk_tck,
            page_size: self.options.page_size,
            normalize_cpus: self.options.normalize_cpu.then_some(self.online_cpus),
        }
    }
}
