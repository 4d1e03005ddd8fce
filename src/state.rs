//! Differential state carried between poll cycles.
//!
//! `PollState` is owned by the poller and mutated only between reads, by a
//! single writer. It starts zeroed: the first system-wide reading and the
//! first reading of every pid report 0%.

use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use std::time::Instant;

use crate::process::cpu::{process_cpu_percent, ProcessBaseline};
use crate::system::{CpuBaseline, CpuTimes};

/// Baselines needed to turn cumulative counters into rates.
#[derive(Debug, Clone, Default)]
pub struct PollState {
    system_cpu: CpuBaseline,
    processes: HashMap<u32, ProcessBaseline>,
    cycles: u64,
}

impl PollState {
    pub fn new() -> Self {
        Self::default()
    }

    /// System CPU percent since the previous aggregate reading.
    pub fn observe_system_cpu(&mut self, times: &CpuTimes) -> f64 {
        self.system_cpu.update(times)
    }

    /// CPU percent of one process since its previous reading. The current
    /// reading becomes the new baseline.
    pub fn observe_process(
        &mut self,
        pid: u32,
        ticks: u64,
        start_time: u64,
        now: Instant,
        clk_tck: f64,
    ) -> f64 {
        let percent = process_cpu_percent(self.processes.get(&pid), ticks, start_time, now, clk_tck);
        self.processes.insert(
            pid,
            ProcessBaseline {
                ticks,
                start_time,
                sampled_at: now,
            },
        );
        percent
    }

    /// Drops baselines of pids not seen in the current cycle. Returns the
    /// number of evicted entries.
    pub fn evict_unseen(&mut self, seen: &HashSet<u32>) -> usize {
        let before = self.processes.len();
        self.processes.retain(|pid, _| seen.contains(pid));
        before - self.processes.len()
    }

    /// Marks the end of a cycle.
    pub fn finish_cycle(&mut self) -> u64 {
        self.cycles += 1;
        self.cycles
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn system_baseline(&self) -> &CpuBaseline {
        &self.system_cpu
    }

    pub fn baseline(&self, pid: u32) -> Option<&ProcessBaseline> {
        self.processes.get(&pid)
    }

    pub fn tracked_processes(&self) -> usize {
        self.processes.len()
    }

    pub fn is_tracked(&self, pid: u32) -> bool {
        self.processes.contains_key(&pid)
    }
}
