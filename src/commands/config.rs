//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = output.unwrap_or_else(|| PathBuf::from("herakles-top.yaml"));

    let mut content = render_config(&config, &format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# Herakles Top Configuration
# ==========================
#
# Sampling
# --------
# proc_root: "/proc"           # Root of the procfs mount
# interval_ms: 200             # Poll interval (minimum 10)
# max_processes: 512           # Processes sampled per cycle (1..4096)
# normalize_cpu: false         # Divide process CPU by online CPUs, cap at 100
# parallelism: null            # Parallel threads (null = auto)
# parallel_sampling: true      # Read process records on the thread pool
# include_names: null          # Include only processes matching these names
# exclude_names: null          # Exclude processes matching these names
#
# Display
# -------
# display_limit: 20            # Rows shown in the process table
# default_sort: pid            # pid, cpu or mem
# cpu_warn_percent: 70.0       # CPU above this is drawn in red
# mem_warn_percent: 70.0       # Memory above this is drawn in red
# highlight_self: true         # Emphasise the monitor's own row
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
# enable_file_logging: false   # Enable file logging
# log_file: null               # Log file path (the interactive view never logs to the terminal)
"#;

    format!("{comments}\n{yaml}")
}
