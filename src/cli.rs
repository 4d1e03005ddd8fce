//! CLI arguments and subcommands for herakles-top.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use herakles_top::SortKey;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Output format for the snapshot subcommand
#[derive(Debug, Clone, ValueEnum)]
pub enum SnapshotFormat {
    Table,
    Json,
    Yaml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "herakles-top",
    about = "Terminal process monitor with ranked per-process CPU and memory usage",
    long_about = "Terminal process monitor with ranked per-process CPU and memory usage.\n\n\
                  Samples the Linux process table from /proc at a fixed interval, computes \
                  per-process CPU rates from tick deltas and ranks the result by pid, CPU or \
                  resident memory.",
    author = "Michael Moll <exporter@herakles.now> - Herakles",
    version = "0.1.0",
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Poll interval in milliseconds
    #[arg(short = 'i', long)]
    pub interval_ms: Option<u64>,

    /// Initial sort key
    #[arg(short = 's', long, value_enum)]
    pub sort: Option<SortKey>,

    /// Number of process rows to display
    #[arg(short = 'n', long)]
    pub display_limit: Option<usize>,

    /// Maximum number of processes to sample per cycle
    #[arg(long)]
    pub max_processes: Option<usize>,

    /// Divide per-process CPU by the number of online CPUs (caps at 100%)
    #[arg(long)]
    pub normalize_cpu: bool,

    /// Root of the procfs mount
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Include only processes matching these names (comma-separated)
    #[arg(long)]
    pub include_names: Option<String>,

    /// Exclude processes matching these names (comma-separated)
    #[arg(long)]
    pub exclude_names: Option<String>,

    /// Parallel sampling threads (0 = auto)
    #[arg(long)]
    pub parallelism: Option<usize>,

    /// Sample processes sequentially on the polling thread
    #[arg(long)]
    pub no_parallel: bool,

    /// Log level [default: info]
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Write logs to this file (the interactive view never logs to the terminal)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration and system requirements
    Check {
        /// Check process sampling
        #[arg(long)]
        proc: bool,

        /// Check CPU and memory summaries
        #[arg(long)]
        system: bool,

        /// Check all system requirements
        #[arg(long)]
        all: bool,
    },

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Run poll cycles without the terminal UI and print the last snapshot
    Snapshot {
        /// Number of poll cycles (the first one only establishes baselines)
        #[arg(short = 'n', long, default_value_t = 2)]
        iterations: usize,

        /// Number of rows to print (defaults to the display limit)
        #[arg(long)]
        top: Option<usize>,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: SnapshotFormat,
    },
}
