//! Process discovery for the /proc filesystem.
//!
//! This module lists live process identifiers from a procfs root and
//! provides the name filter applied to sampled rows.

use std::fs;
use std::path::Path;

use crate::error::SampleError;

/// Result of one enumeration pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enumeration {
    /// Process ids in discovery order, at most `capacity` entries.
    pub pids: Vec<u32>,
    /// Number of further process ids seen after the capacity was reached.
    pub overflow: usize,
}

/// Parses a directory name as a process id. Only non-empty, all-digit,
/// positive names qualify.
pub fn parse_pid(name: &str) -> Option<u32> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    match name.parse::<u32>() {
        Ok(0) | Err(_) => None,
        Ok(pid) => Some(pid),
    }
}

/// Scans a procfs root for numeric process directories.
///
/// Stops collecting once `capacity` ids were found; the remaining numeric
/// entries are only counted. Fails with `SourceUnavailable` when the root
/// itself cannot be listed.
pub fn enumerate_pids(root: &Path, capacity: usize) -> Result<Enumeration, SampleError> {
    let entries = fs::read_dir(root).map_err(|e| SampleError::unavailable(root, e))?;

    let mut out = Enumeration::default();
    for entry in entries.flatten() {
        let name = entry.file_name();
        let pid = match name.to_str().and_then(parse_pid) {
            Some(v) => v,
            None => continue,
        };
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        if out.pids.len() >= capacity {
            out.overflow += 1;
            continue;
        }
        out.pids.push(pid);
    }
    Ok(out)
}

/// Substring filters on process names. Exclusion takes priority over inclusion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessFilter {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl ProcessFilter {
    /// Determines if a process should be shown based on its name.
    pub fn allows(&self, name: &str) -> bool {
        if self.exclude.iter().any(|s| name.contains(s.as_str())) {
            return false;
        }
        if !self.include.is_empty() {
            return self.include.iter().any(|s| name.contains(s.as_str()));
        }
        true
    }
}
