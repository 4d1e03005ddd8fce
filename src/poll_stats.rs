//! Statistics about the poll loop itself.
//!
//! Tracks cycle timing and how much process churn and source failure the
//! sampler absorbed. Owned by the poller, so no synchronization is needed.

use serde::Serialize;

/// Running statistics for a single metric.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
            self.last = value;
            self.sum = value;
            self.count = 1;
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }

    pub fn last(&self) -> f64 {
        self.last
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

/// Outcome counters of a single cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub enumerated: usize,
    pub sampled: usize,
    pub shown: usize,
    pub vanished: usize,
    pub unreadable: usize,
    pub evicted: usize,
    pub overflow: usize,
    pub enumeration_failed: bool,
    pub system_failures: usize,
}

/// Totals across the program run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PollStats {
    pub cycle_ms: RunningStat,
    pub processes_sampled: RunningStat,
    pub last: CycleReport,
    pub vanished_total: u64,
    pub unreadable_total: u64,
    pub evicted_total: u64,
    pub enumeration_failures: u64,
    pub system_failures: u64,
}

impl PollStats {
    pub fn record(&mut self, report: CycleReport, duration_ms: f64) {
        self.cycle_ms.add(duration_ms);
        self.processes_sampled.add(report.sampled as f64);
        self.vanished_total += report.vanished as u64;
        self.unreadable_total += report.unreadable as u64;
        self.evicted_total += report.evicted as u64;
        self.system_failures += report.system_failures as u64;
        if report.enumeration_failed {
            self.enumeration_failures += 1;
        }
        self.last = report;
    }
}
