//! Ordering of process rows.
//!
//! The sort key is always passed in by the caller; there is no shared
//! "current sort" state.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::snapshot::ProcessMetric;

/// Column a snapshot is ranked by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum SortKey {
    /// Ascending by process id
    #[default]
    #[serde(rename = "pid")]
    #[value(name = "pid")]
    ByPid,
    /// Descending by CPU usage
    #[serde(rename = "cpu")]
    #[value(name = "cpu")]
    ByCpu,
    /// Descending by resident memory
    #[serde(rename = "mem")]
    #[value(name = "mem")]
    ByMem,
}

impl SortKey {
    /// Column label used by the renderer.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ByPid => "PID",
            Self::ByCpu => "CPU%",
            Self::ByMem => "MEM(MB)",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Self::ByPid => Self::ByCpu,
            Self::ByCpu => Self::ByMem,
            Self::ByMem => Self::ByPid,
        }
    }

    /// Total order for two rows under this key. Ties on the metric fall
    /// back to ascending pid.
    pub fn compare(&self, a: &ProcessMetric, b: &ProcessMetric) -> Ordering {
        let primary = match self {
            Self::ByPid => Ordering::Equal,
            Self::ByCpu => b.cpu_metric.total_cmp(&a.cpu_metric),
            Self::ByMem => b.mem_metric.total_cmp(&a.mem_metric),
        };
        primary.then_with(|| a.pid.cmp(&b.pid))
    }
}

/// Sorts rows in place by `key`.
pub fn rank(rows: &mut [ProcessMetric], key: SortKey) {
    rows.sort_by(|a, b| key.compare(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pid: u32, cpu: f64, mem: f64) -> ProcessMetric {
        ProcessMetric {
            pid,
            name: format!("p{}", pid),
            state: 'R',
            cpu_metric: cpu,
            mem_metric: mem,
        }
    }

    fn pids(rows: &[ProcessMetric]) -> Vec<u32> {
        rows.iter().map(|r| r.pid).collect()
    }

    #[test]
    fn test_rank_by_pid() {
        let mut rows = vec![row(5, 0.0, 0.0), row(1, 0.0, 0.0), row(3, 0.0, 0.0)];
        rank(&mut rows, SortKey::ByPid);
        assert_eq!(pids(&rows), vec![1, 3, 5]);
    }

    #[test]
    fn test_rank_by_cpu_descending() {
        let mut rows = vec![row(1, 1.0, 0.0), row(2, 9.0, 0.0), row(3, 5.0, 0.0)];
        rank(&mut rows, SortKey::ByCpu);
        let cpus: Vec<f64> = rows.iter().map(|r| r.cpu_metric).collect();
        assert_eq!(cpus, vec![9.0, 5.0, 1.0]);
    }

    #[test]
    fn test_rank_by_mem_descending() {
        let mut rows = vec![row(1, 0.0, 10.0), row(2, 0.0, 300.0), row(3, 0.0, 42.5)];
        rank(&mut rows, SortKey::ByMem);
        assert_eq!(pids(&rows), vec![2, 3, 1]);
    }

    #[test]
    fn test_ties_are_deterministic() {
        let mut a = vec![row(9, 2.0, 0.0), row(4, 2.0, 0.0), row(7, 2.0, 0.0)];
        let mut b = vec![row(7, 2.0, 0.0), row(9, 2.0, 0.0), row(4, 2.0, 0.0)];
        rank(&mut a, SortKey::ByCpu);
        rank(&mut b, SortKey::ByCpu);
        assert_eq!(pids(&a), vec![4, 7, 9]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_rank_is_idempotent() {
        let mut rows = vec![
            row(3, 0.5, 12.0),
            row(8, 7.25, 1.0),
            row(1, 7.25, 99.0),
            row(2, 0.0, 12.0),
        ];
        for key in [SortKey::ByPid, SortKey::ByCpu, SortKey::ByMem] {
            rank(&mut rows, key);
            let once = rows.clone();
            rank(&mut rows, key);
            assert_eq!(rows, once, "ranking by {:?} twice changed the order", key);
        }
    }

    #[test]
    fn test_nan_does_not_panic() {
        let mut rows = vec![row(1, f64::NAN, 0.0), row(2, 3.0, 0.0)];
        rank(&mut rows, SortKey::ByCpu);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_next_cycles_through_keys() {
        assert_eq!(SortKey::ByPid.next(), SortKey::ByCpu);
        assert_eq!(SortKey::ByCpu.next(), SortKey::ByMem);
        assert_eq!(SortKey::ByMem.next(), SortKey::ByPid);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&SortKey::ByMem).unwrap(), "\"mem\"");
        let key: SortKey = serde_json::from_str("\"cpu\"").unwrap();
        assert_eq!(key, SortKey::ByCpu);
    }
}
