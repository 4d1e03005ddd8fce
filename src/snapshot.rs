//! Snapshot types handed from the poller to the renderer.
//!
//! A snapshot holds the ranked process rows of one poll cycle together with
//! the system-wide metrics and the sort key used to rank them.

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::rank::{rank, SortKey};

/// Upper bound for the configurable process capacity.
pub const MAX_CAPACITY: usize = 4096;

/// Default number of processes sampled per cycle.
pub const DEFAULT_CAPACITY: usize = 512;

/// One process row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessMetric {
    pub pid: u32,
    pub name: String,
    /// Kernel state code (R, S, D, Z, ...).
    pub state: char,
    /// CPU usage in percent over the last interval.
    pub cpu_metric: f64,
    /// Resident memory in MB.
    pub mem_metric: f64,
}

/// Whole-machine metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SystemMetric {
    pub cpu_percent: f64,
    pub mem_total_mb: f64,
    pub mem_used_mb: f64,
}

impl SystemMetric {
    /// Used memory as a percentage of total, 0 when the total is unknown.
    pub fn mem_used_percent(&self) -> f64 {
        if self.mem_total_mb <= 0.0 {
            return 0.0;
        }
        100.0 * self.mem_used_mb / self.mem_total_mb
    }
}

/// Process rows with an enforced capacity.
///
/// Pushing into a full table drops the row and counts it as overflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessTable {
    rows: Vec<ProcessMetric>,
    capacity: usize,
    overflow: usize,
}

impl ProcessTable {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity.min(MAX_CAPACITY)),
            capacity,
            overflow: 0,
        }
    }

    /// Appends a row. Returns false if the table was already full.
    pub fn push(&mut self, row: ProcessMetric) -> bool {
        if self.rows.len() >= self.capacity {
            self.overflow += 1;
            return false;
        }
        self.rows.push(row);
        true
    }

    /// Records rows that were dropped before reaching the table.
    pub fn add_overflow(&mut self, count: usize) {
        self.overflow += count;
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn overflow(&self) -> usize {
        self.overflow
    }

    pub fn as_slice(&self) -> &[ProcessMetric] {
        &self.rows
    }

    pub fn as_mut_slice(&mut self) -> &mut [ProcessMetric] {
        &mut self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProcessMetric> {
        self.rows.iter()
    }

    /// The first `n` rows.
    pub fn top(&self, n: usize) -> &[ProcessMetric] {
        &self.rows[..n.min(self.rows.len())]
    }
}

/// Result of one poll cycle.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub cycle: u64,
    pub taken_at: DateTime<Local>,
    pub sort: SortKey,
    pub system: SystemMetric,
    pub processes: ProcessTable,
}

impl Snapshot {
    /// Reorders the rows by another key without re-sampling.
    pub fn rerank(&mut self, key: SortKey) {
        rank(self.processes.as_mut_slice(), key);
        self.sort = key;
    }
}
