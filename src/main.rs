//! herakles-top - version 0.1.0
//!
//! Terminal process monitor with tracing logging.
//! This is the main entry point that initializes the monitor and handles subcommands.

mod app;
mod cli;
mod commands;
mod config;
mod startup_checks;
mod ui;

use clap::Parser;
use herakles_top::Poller;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info};
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use app::App;
use cli::{Args, Commands, LogLevel};
use commands::{command_check, command_config, command_snapshot};
use config::{
    resolve_config, show_config, validate_effective_config, Config, DEFAULT_PROC_ROOT,
    DEFAULT_WARN_PERCENT,
};
use ui::UiOptions;

fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}

/// Initializes tracing logging subsystem with configured log level.
///
/// The interactive view owns the terminal, so it logs to the configured file
/// or not at all. Headless commands log to stderr.
fn setup_logging(config: &Config, interactive: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut level = level_filter(config.log_level());

    let file = match (&config.log_file, config.enable_file_logging.unwrap_or(false)) {
        (Some(path), true) => Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| format!("Cannot open log file {}: {}", path.display(), e))?,
        ),
        _ => None,
    };

    let ansi = !interactive && file.is_none();
    let writer = match file {
        Some(file) => BoxMakeWriter::new(Mutex::new(file)),
        None if interactive => {
            level = LevelFilter::OFF;
            BoxMakeWriter::new(std::io::sink)
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| format!("Failed to set tracing subscriber: {}", e))?;

    info!("Logging initialized with level: {}", level);
    Ok(())
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Configure parallel processing
fn configure_thread_pool(config: &Config) {
    if let Some(threads) = config.parallelism {
        if threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()
                .unwrap_or_else(|e| error!("Failed to set rayon thread pool: {}", e));
            debug!("Rayon thread pool configured with {} threads", threads);
        }
    }
}

/// Main application entry point.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format);
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        if let Commands::Config {
            output,
            format,
            commented,
        } = command
        {
            return command_config(output.clone(), format.clone(), *commented);
        }

        let config = load_validated_config(&args)?;
        setup_logging(&config, false)?;
        configure_thread_pool(&config);

        return match command {
            Commands::Check { proc, system, all } => command_check(*proc, *system, *all, &config),
            Commands::Snapshot {
                iterations,
                top,
                format,
            } => command_snapshot(*iterations, *top, format.clone(), &config),
            Commands::Config { .. } => unreachable!("Config handled above"),
        };
    }

    let config = load_validated_config(&args)?;
    setup_logging(&config, true)?;
    configure_thread_pool(&config);

    let proc_root = config
        .proc_root
        .clone()
        .unwrap_or_else(|| Path::new(DEFAULT_PROC_ROOT).to_path_buf());

    // The terminal is not ours yet, so failures are still reported on stderr.
    if let Err(e) = startup_checks::validate_requirements(&proc_root) {
        eprintln!("❌ Startup validation failed: {}", e);
        std::process::exit(1);
    }

    info!("Starting herakles-top");

    let poller = Poller::new(config.poller_options());
    let ui_options = UiOptions {
        display_limit: config.display_limit(),
        cpu_warn_percent: config.cpu_warn_percent.unwrap_or(DEFAULT_WARN_PERCENT),
        mem_warn_percent: config.mem_warn_percent.unwrap_or(DEFAULT_WARN_PERCENT),
        highlight_pid: config
            .highlight_self
            .unwrap_or(true)
            .then(std::process::id),
    };
    let app = App::new(poller, config.default_sort(), config.interval(), ui_options);

    app::run_tui(app)?;
    Ok(())
}
