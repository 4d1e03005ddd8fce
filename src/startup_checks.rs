//! Startup requirement validation for herakles-top.
//!
//! Confirms that the procfs root exists before the first cycle runs. A
//! missing procfs root is the only hard failure. Unreadable summary or
//! per-process sources are logged; the poller degrades those metrics.

use nix::unistd::geteuid;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Validate all runtime requirements
pub fn validate_requirements(proc_root: &Path) -> Result<(), ValidationError> {
    info!("Validating runtime requirements under {}", proc_root.display());

    check_user_privileges();
    check_proc_root(proc_root)?;
    check_summary_sources(proc_root);
    check_process_access(proc_root);

    info!("All runtime requirements validated");
    Ok(())
}

/// Processes of other users stay visible in /proc/<pid>/stat, so this only
/// records the effective uid.
fn check_user_privileges() {
    if geteuid().is_root() {
        debug!("Running as root (uid=0)");
    } else {
        debug!("Running as uid={}", geteuid());
    }
}

fn check_proc_root(proc_root: &Path) -> Result<(), ValidationError> {
    if !proc_root.is_dir() {
        error!("{} is not a directory - is procfs mounted?", proc_root.display());
        return Err(ValidationError::ProcNotMounted(proc_root.display().to_string()));
    }
    Ok(())
}

/// An unreadable CPU or memory summary only leaves that metric at 0.
fn check_summary_sources(proc_root: &Path) {
    for name in ["stat", "meminfo"] {
        let path = proc_root.join(name);
        match fs::File::open(&path) {
            Ok(_) => debug!("Summary source readable at {}", path.display()),
            Err(e) => warn!(
                "Cannot read {}: {} - the metric will stay at 0",
                path.display(),
                e
            ),
        }
    }
}

/// Checks that the stat record of our own process is readable.
fn check_process_access(proc_root: &Path) {
    let path = proc_root.join(std::process::id().to_string()).join("stat");
    match fs::metadata(&path) {
        Ok(_) => debug!("Per-process stat readable at {}", path.display()),
        Err(e) => {
            // A fake root used for testing does not contain our own pid.
            warn!("Could not access {}: {}", path.display(), e);
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("procfs not found at {0}")]
    ProcNotMounted(String),
}
