//! Configuration management for herakles-top.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat, LogLevel};
use clap::ValueEnum;
use herakles_top::{PollerOptions, ProcessFilter, SortKey, DEFAULT_CAPACITY, MAX_CAPACITY};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

// Default configuration constants
pub const DEFAULT_PROC_ROOT: &str = "/proc";
pub const DEFAULT_INTERVAL_MS: u64 = 200;
pub const MIN_INTERVAL_MS: u64 = 10;
pub const DEFAULT_DISPLAY_LIMIT: usize = 20;
pub const DEFAULT_WARN_PERCENT: f64 = 70.0;

/// Enhanced configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Sampling
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,
    #[serde(alias = "interval-ms")]
    pub interval_ms: Option<u64>,
    #[serde(alias = "max-processes")]
    pub max_processes: Option<usize>,
    #[serde(alias = "normalize-cpu")]
    pub normalize_cpu: Option<bool>,
    pub parallelism: Option<usize>,
    #[serde(alias = "parallel-sampling")]
    pub parallel_sampling: Option<bool>,
    #[serde(alias = "include-names")]
    pub include_names: Option<Vec<String>>,
    #[serde(alias = "exclude-names")]
    pub exclude_names: Option<Vec<String>>,

    // Display
    #[serde(alias = "display-limit")]
    pub display_limit: Option<usize>,
    #[serde(alias = "default-sort")]
    pub default_sort: Option<SortKey>,
    #[serde(alias = "cpu-warn-percent")]
    pub cpu_warn_percent: Option<f64>,
    #[serde(alias = "mem-warn-percent")]
    pub mem_warn_percent: Option<f64>,
    #[serde(alias = "highlight-self")]
    pub highlight_self: Option<bool>,

    // Logging
    pub log_level: Option<String>,
    pub enable_file_logging: Option<bool>,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            interval_ms: Some(DEFAULT_INTERVAL_MS),
            max_processes: Some(DEFAULT_CAPACITY),
            normalize_cpu: Some(false),
            parallelism: None,
            parallel_sampling: Some(true),
            include_names: None,
            exclude_names: None,
            display_limit: Some(DEFAULT_DISPLAY_LIMIT),
            default_sort: Some(SortKey::ByPid),
            cpu_warn_percent: Some(DEFAULT_WARN_PERCENT),
            mem_warn_percent: Some(DEFAULT_WARN_PERCENT),
            highlight_self: Some(true),
            log_level: Some("info".into()),
            enable_file_logging: Some(false),
            log_file: None,
        }
    }
}

impl Config {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS))
    }

    pub fn display_limit(&self) -> usize {
        self.display_limit.unwrap_or(DEFAULT_DISPLAY_LIMIT)
    }

    pub fn default_sort(&self) -> SortKey {
        self.default_sort.unwrap_or_default()
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
            .as_deref()
            .and_then(|s| LogLevel::from_str(s, true).ok())
            .unwrap_or(LogLevel::Info)
    }

    /// Builds the sampling engine settings from the effective configuration.
    pub fn poller_options(&self) -> PollerOptions {
        PollerOptions {
            proc_root: self
                .proc_root
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT)),
            capacity: self.max_processes.unwrap_or(DEFAULT_CAPACITY),
            normalize_cpu: self.normalize_cpu.unwrap_or(false),
            parallel: self.parallel_sampling.unwrap_or(true),
            filter: ProcessFilter {
                include: self.include_names.clone().unwrap_or_default(),
                exclude: self.exclude_names.clone().unwrap_or_default(),
            },
            ..PollerOptions::default()
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let interval_ms = cfg.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS);
    if interval_ms < MIN_INTERVAL_MS {
        return Err(format!(
            "interval_ms must be at least {}, got {}",
            MIN_INTERVAL_MS, interval_ms
        )
        .into());
    }

    let capacity = cfg.max_processes.unwrap_or(DEFAULT_CAPACITY);
    if capacity == 0 || capacity > MAX_CAPACITY {
        return Err(format!(
            "max_processes must be between 1 and {}, got {}",
            MAX_CAPACITY, capacity
        )
        .into());
    }

    if cfg.display_limit() == 0 {
        return Err("display_limit must be at least 1".into());
    }

    for (name, value) in [
        ("cpu_warn_percent", cfg.cpu_warn_percent),
        ("mem_warn_percent", cfg.mem_warn_percent),
    ] {
        if let Some(v) = value {
            if !(0.0..=100.0).contains(&v) {
                return Err(format!("{} must be between 0 and 100, got {}", name, v).into());
            }
        }
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if LogLevel::from_str(level, true).is_err() {
            return Err(format!("Invalid log_level '{}'", level).into());
        }
    }

    if cfg.enable_file_logging.unwrap_or(false) && cfg.log_file.is_none() {
        return Err("enable_file_logging is set but log_file is not".into());
    }

    Ok(())
}

fn split_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(interval_ms) = args.interval_ms {
        config.interval_ms = Some(interval_ms);
    }
    if let Some(sort) = args.sort {
        config.default_sort = Some(sort);
    }
    if let Some(limit) = args.display_limit {
        config.display_limit = Some(limit);
    }
    if let Some(max) = args.max_processes {
        config.max_processes = Some(max);
    }
    if args.normalize_cpu {
        config.normalize_cpu = Some(true);
    }
    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }

    // Parse comma-separated include/exclude names
    if let Some(include_str) = &args.include_names {
        config.include_names = Some(split_names(include_str));
    }
    if let Some(exclude_str) = &args.exclude_names {
        config.exclude_names = Some(split_names(exclude_str));
    }

    if let Some(threads) = args.parallelism {
        config.parallelism = Some(threads);
    }
    if args.no_parallel {
        config.parallel_sampling = Some(false);
    }

    if let Some(level) = args.log_level {
        config.log_level = Some(format!("{:?}", level).to_lowercase());
    }
    if let Some(log_file) = &args.log_file {
        config.log_file = Some(log_file.clone());
        config.enable_file_logging = Some(true);
    }

    Ok(config)
}

/// Enhanced configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(format!("Config file not found: {}", p.display()).into());
            }
            p.to_path_buf()
        }
        None => {
            // Try default locations
            let defaults = [
                "/etc/herakles/top.yaml",
                "/etc/herakles/top.yml",
                "/etc/herakles/top.json",
                "./herakles-top.yaml",
                "./herakles-top.yml",
                "./herakles-top.json",
            ];

            match defaults.iter().map(Path::new).find(|p| p.exists()) {
                Some(p) => p.to_path_buf(),
                None => return Ok(Config::default()),
            }
        }
    };

    parse_config_file(&path)
}

fn parse_config_file(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Renders a configuration in the requested format.
pub fn render_config(
    config: &Config,
    format: &ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, &format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_effective_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.interval_ms = Some(1);
        assert!(validate_effective_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.max_processes = Some(0);
        assert!(validate_effective_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.max_processes = Some(MAX_CAPACITY + 1);
        assert!(validate_effective_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.display_limit = Some(0);
        assert!(validate_effective_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.cpu_warn_percent = Some(120.0);
        assert!(validate_effective_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.enable_file_logging = Some(true);
        assert!(validate_effective_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.log_level = Some("loud".into());
        assert!(validate_effective_config(&cfg).is_err());
    }

    #[test]
    fn test_log_level_from_cli() {
        let args = Args::parse_from(["herakles-top", "--no-config", "--log-level", "debug"]);
        let cfg = resolve_config(&args).expect("config resolves");
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
        assert!(matches!(cfg.log_level(), LogLevel::Debug));
    }

    #[test]
    fn test_cli_overrides_defaults() {
        let args = Args::parse_from([
            "herakles-top",
            "--no-config",
            "--sort",
            "cpu",
            "--interval-ms",
            "1000",
            "--max-processes",
            "64",
            "--exclude-names",
            "kworker, ,migration",
            "--no-parallel",
        ]);
        let cfg = resolve_config(&args).expect("config resolves");
        assert_eq!(cfg.default_sort(), SortKey::ByCpu);
        assert_eq!(cfg.interval(), Duration::from_millis(1000));
        assert_eq!(cfg.max_processes, Some(64));
        assert_eq!(
            cfg.exclude_names,
            Some(vec!["kworker".to_string(), "migration".to_string()])
        );

        let options = cfg.poller_options();
        assert_eq!(options.capacity, 64);
        assert!(!options.parallel);
        assert!(!options.filter.allows("kworker/0:1"));
    }

    #[test]
    fn test_load_yaml_with_dashed_aliases() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("top.yaml");
        fs::write(
            &path,
            "interval-ms: 500\ndefault-sort: mem\nnormalize-cpu: true\nproc_root: /host/proc\n",
        )
        .expect("Failed to write config");

        let cfg = load_config(Some(&path)).expect("config loads");
        assert_eq!(cfg.interval_ms, Some(500));
        assert_eq!(cfg.default_sort, Some(SortKey::ByMem));
        assert_eq!(cfg.normalize_cpu, Some(true));
        assert_eq!(cfg.proc_root, Some(PathBuf::from("/host/proc")));
        assert!(cfg.display_limit.is_none());
    }

    #[test]
    fn test_load_json_and_toml() {
        let dir = tempdir().expect("Failed to create temp dir");

        let json = dir.path().join("top.json");
        fs::write(&json, r#"{"display_limit": 5, "default_sort": "cpu"}"#).expect("write json");
        let cfg = load_config(Some(&json)).expect("json loads");
        assert_eq!(cfg.display_limit, Some(5));
        assert_eq!(cfg.default_sort, Some(SortKey::ByCpu));

        let toml_path = dir.path().join("top.toml");
        fs::write(&toml_path, "max_processes = 128\n").expect("write toml");
        let cfg = load_config(Some(&toml_path)).expect("toml loads");
        assert_eq!(cfg.max_processes, Some(128));
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let dir = tempdir().expect("Failed to create temp dir");
        assert!(load_config(Some(&dir.path().join("absent.yaml"))).is_err());
    }

    #[test]
    fn test_render_all_formats() {
        let cfg = Config::default();
        for format in [ConfigFormat::Yaml, ConfigFormat::Json, ConfigFormat::Toml] {
            let out = render_config(&cfg, &format).expect("renders");
            assert!(out.contains("interval_ms"));
        }
    }
}
