//! Herakles Top sampling engine.
//!
//! This library samples the Linux process table and the aggregate CPU and
//! memory counters from procfs and turns them into a ranked snapshot. It
//! carries the differential state needed to report CPU usage as rates.
//!
//! # Usage
//!
//! ```rust,no_run
//! use herakles_top::{Poller, PollerOptions, SortKey};
//!
//! let mut poller = Poller::new(PollerOptions::default());
//!
//! // The first cycle establishes baselines, rates appear from the second on.
//! poller.poll(SortKey::ByCpu);
//! std::thread::sleep(std::time::Duration::from_millis(200));
//! let snapshot = poller.poll(SortKey::ByCpu);
//!
//! println!("CPU {:.1}%", snapshot.system.cpu_percent);
//! for p in snapshot.processes.top(5) {
//!     println!("{:>7} {:<16} {:>6.1} {:>8.1}", p.pid, p.name, p.cpu_metric, p.mem_metric);
//! }
//! ```

pub mod error;
pub mod poll_stats;
pub mod poller;
pub mod process;
pub mod rank;
pub mod snapshot;
pub mod state;
pub mod system;

// Re-export main types for convenience
pub use error::SampleError;
pub use poll_stats::{CycleReport, PollStats};
pub use poller::{Poller, PollerOptions};
pub use process::ProcessFilter;
pub use rank::{rank, SortKey};
pub use snapshot::{
    ProcessMetric, ProcessTable, Snapshot, SystemMetric, DEFAULT_CAPACITY, MAX_CAPACITY,
};
pub use state::PollState;
