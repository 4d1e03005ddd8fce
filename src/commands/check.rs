//! Check command implementation.
//!
//! Validates procfs access and configuration.

use std::path::Path;

use herakles_top::process::{enumerate_pids, read_pid_stat};
use herakles_top::system::{read_cpu_summary, read_meminfo};

use crate::config::{validate_effective_config, Config, DEFAULT_PROC_ROOT};

/// Validates system requirements and configuration.
pub fn command_check(
    proc: bool,
    system: bool,
    all: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Herakles Top - System Check");
    println!("==============================");

    let root = config
        .proc_root
        .as_deref()
        .unwrap_or_else(|| Path::new(DEFAULT_PROC_ROOT));
    let mut all_ok = true;

    if proc || all {
        println!("\n📁 Checking process table under {}...", root.display());
        all_ok &= check_processes(root);
    }

    if system || all {
        println!("\n💾 Checking CPU and memory summaries...");
        all_ok &= check_system(root);
    }

    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => println!("   ✅ Configuration is valid"),
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}

fn check_processes(root: &Path) -> bool {
    let enumeration = match enumerate_pids(root, herakles_top::MAX_CAPACITY) {
        Ok(e) => e,
        Err(e) => {
            println!("   ❌ Cannot enumerate processes: {}", e);
            return false;
        }
    };
    if enumeration.pids.is_empty() {
        println!("   ❌ No process entries found");
        return false;
    }
    println!("   ✅ Found {} process entries", enumeration.pids.len());
    if enumeration.overflow > 0 {
        println!(
            "   ⚠️  {} more processes than the maximum capacity",
            enumeration.overflow
        );
    }

    let mut readable = 0;
    let mut failed = 0;
    for &pid in &enumeration.pids {
        match read_pid_stat(root, pid) {
            Ok(_) => readable += 1,
            Err(e) if e.is_vanished() => {}
            Err(e) => {
                if failed == 0 {
                    println!("   ⚠️  {}", e);
                }
                failed += 1;
            }
        }
    }
    println!("   ✅ Parsed {} stat records ({} failed)", readable, failed);
    readable > 0
}

fn check_system(root: &Path) -> bool {
    let mut ok = true;

    match read_cpu_summary(root) {
        Ok(summary) => println!(
            "   ✅ CPU summary parsed: {} online CPUs, {} total ticks",
            summary.online_cpus,
            summary.times.total()
        ),
        Err(e) => {
            println!("   ❌ CPU summary unavailable: {}", e);
            ok = false;
        }
    }

    match read_meminfo(root) {
        Ok(info) => println!(
            "   ✅ Memory summary parsed: {:.1} MB used of {:.1} MB",
            info.used_mb(),
            info.total_mb()
        ),
        Err(e) => {
            println!("   ❌ Memory summary unavailable: {}", e);
            ok = false;
        }
    }

    ok
}
