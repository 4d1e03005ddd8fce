//! Snapshot command implementation.
//!
//! Runs poll cycles without the terminal UI and prints the last snapshot.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::thread;

use herakles_top::{Poller, ProcessMetric, Snapshot, SortKey, SystemMetric};

use crate::cli::SnapshotFormat;
use crate::config::Config;

/// Printable view of a snapshot limited to the top rows.
#[derive(Debug, Serialize)]
struct SnapshotReport<'a> {
    cycle: u64,
    taken_at: &'a DateTime<Local>,
    sort: SortKey,
    system: &'a SystemMetric,
    sampled: usize,
    overflow: usize,
    processes: &'a [ProcessMetric],
}

impl<'a> SnapshotReport<'a> {
    fn new(snapshot: &'a Snapshot, top: usize) -> Self {
        Self {
            cycle: snapshot.cycle,
            taken_at: &snapshot.taken_at,
            sort: snapshot.sort,
            system: &snapshot.system,
            sampled: snapshot.processes.len(),
            overflow: snapshot.processes.overflow(),
            processes: snapshot.processes.top(top),
        }
    }
}

/// Runs `iterations` cycles and prints the ranked result of the last one.
pub fn command_snapshot(
    iterations: usize,
    top: Option<usize>,
    format: SnapshotFormat,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut poller = Poller::new(config.poller_options());
    let sort = config.default_sort();
    let interval = config.interval();

    let mut snapshot = poller.poll(sort);
    for _ in 1..iterations {
        thread::sleep(interval);
        snapshot = poller.poll(sort);
    }

    let report = SnapshotReport::new(&snapshot, top.unwrap_or_else(|| config.display_limit()));
    let output = match format {
        SnapshotFormat::Json => serde_json::to_string_pretty(&report)?,
        SnapshotFormat::Yaml => serde_yaml::to_string(&report)?,
        SnapshotFormat::Table => format_table(&report),
    };
    println!("{}", output);

    if iterations < 2 {
        eprintln!("note: CPU rates need at least two cycles, all values are 0");
    }
    Ok(())
}

fn format_table(report: &SnapshotReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "cycle {} at {} | CPU {:.1}% | MEM {:.1}/{:.1} MB | sort {}\n",
        report.cycle,
        report.taken_at.format("%Y-%m-%d %H:%M:%S"),
        report.system.cpu_percent,
        report.system.mem_used_mb,
        report.system.mem_total_mb,
        report.sort.label()
    ));
    out.push_str(&format!(
        "{:>7} {:<31} {:>1} {:>7} {:>9}\n",
        "PID", "NAME", "S", "CPU%", "MEM(MB)"
    ));
    for p in report.processes {
        out.push_str(&format!(
            "{:>7} {:<31} {:>1} {:>7.1} {:>9.1}\n",
            p.pid, p.name, p.state, p.cpu_metric, p.mem_metric
        ));
    }
    if report.overflow > 0 {
        out.push_str(&format!("({} processes over capacity)\n", report.overflow));
    }
    out
}
