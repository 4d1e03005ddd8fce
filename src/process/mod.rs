//! Process-related modules for enumeration, parsing and sampling.
//!
//! This module provides:
//! - `scanner`: Process discovery and name filtering
//! - `stat`: Parsing of `/proc/<pid>/stat`
//! - `cpu`: Clock ticks and delta-based CPU rates
//! - `memory`: Page size and memory unit conversions
//! - `sampler`: Raw counters to metric rows

pub mod cpu;
pub mod memory;
pub mod sampler;
pub mod scanner;
pub mod stat;

// Re-export commonly used types
pub use cpu::{cpu_rate_percent, process_cpu_percent, ProcessBaseline, CLK_TCK};
pub use memory::{pages_to_mb, PAGE_SIZE};
pub use sampler::{sample_process, to_metric, SampleUnits};
pub use scanner::{enumerate_pids, Enumeration, ProcessFilter};
pub use stat::{read_pid_stat, PidStat, MAX_NAME_LEN};
