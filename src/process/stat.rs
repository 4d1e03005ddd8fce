//! Parser for `/proc/<pid>/stat`.
//!
//! The command name is wrapped in parentheses and may itself contain spaces
//! or parentheses, so the record is split at the last `)` and the remaining
//! fields are addressed relative to the state field.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SampleError;

/// Maximum number of characters kept for a process name.
pub const MAX_NAME_LEN: usize = 31;

// Offsets into the fields following the closing parenthesis.
// Field 3 (state) is at offset 0.
const STATE: usize = 0;
const UTIME: usize = 11;
const STIME: usize = 12;
const STARTTIME: usize = 19;
const RSS: usize = 21;

/// Raw counters of one process as reported by the kernel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidStat {
    pub pid: u32,
    pub name: String,
    pub state: char,
    /// User time in clock ticks.
    pub utime: u64,
    /// Kernel time in clock ticks.
    pub stime: u64,
    /// Start time in clock ticks since boot.
    pub start_time: u64,
    /// Resident set size in pages.
    pub rss_pages: u64,
}

impl PidStat {
    /// Accumulated user and kernel ticks.
    pub fn total_ticks(&self) -> u64 {
        self.utime.saturating_add(self.stime)
    }
}

/// Truncates a name to `MAX_NAME_LEN` characters.
pub fn truncate_name(name: &str) -> String {
    name.chars().take(MAX_NAME_LEN).collect()
}

/// Path of the stat record for `pid` under `root`.
pub fn stat_path(root: &Path, pid: u32) -> PathBuf {
    root.join(pid.to_string()).join("stat")
}

/// Parses the content of a stat record.
pub fn parse_pid_stat(path: &Path, content: &str) -> Result<PidStat, SampleError> {
    let open = content
        .find('(')
        .ok_or_else(|| SampleError::malformed(path, "missing '(' before command name"))?;
    let close = content
        .rfind(')')
        .filter(|&c| c > open)
        .ok_or_else(|| SampleError::malformed(path, "missing ')' after command name"))?;

    let pid: u32 = content[..open]
        .trim()
        .parse()
        .map_err(|_| SampleError::malformed(path, "pid field is not numeric"))?;
    let name = truncate_name(&content[open + 1..close]);

    let fields: Vec<&str> = content[close + 1..].split_whitespace().collect();
    if fields.len() <= RSS {
        return Err(SampleError::malformed(
            path,
            format!(
                "expected at least {} fields after command name, got {}",
                RSS + 1,
                fields.len()
            ),
        ));
    }

    let mut state_chars = fields[STATE].chars();
    let state = match (state_chars.next(), state_chars.next()) {
        (Some(c), None) => c,
        _ => {
            return Err(SampleError::malformed(
                path,
                format!("state field '{}' is not a single character", fields[STATE]),
            ))
        }
    };

    let number = |idx: usize, label: &str| -> Result<u64, SampleError> {
        fields[idx].parse::<u64>().map_err(|_| {
            SampleError::malformed(path, format!("{} field '{}' is not numeric", label, fields[idx]))
        })
    };

    Ok(PidStat {
        pid,
        name,
        state,
        utime: number(UTIME, "utime")?,
        stime: number(STIME, "stime")?,
        start_time: number(STARTTIME, "starttime")?,
        rss_pages: number(RSS, "rss")?,
    })
}

/// Reads and parses the stat record for `pid`.
pub fn read_pid_stat(root: &Path, pid: u32) -> Result<PidStat, SampleError> {
    let path = stat_path(root, pid);
    let content =
        fs::read_to_string(&path).map_err(|e| SampleError::from_process_io(pid, &path, e))?;
    let stat = parse_pid_stat(&path, &content)?;
    if stat.pid != pid {
        return Err(SampleError::malformed(
            &path,
            format!("record belongs to pid {}", stat.pid),
        ));
    }
    Ok(stat)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1234 (test_process) S 1 1234 1234 0 -1 4194304 100 0 0 0 1000 500 0 0 20 0 1 0 12345 12345678 1234 18446744073709551615 4194304 4238788 140736466511168 0 0 0 0 0 0 0 0 0 17 1 0 0 0 0 0";

    fn parse(content: &str) -> Result<PidStat, SampleError> {
        parse_pid_stat(Path::new("/proc/1234/stat"), content)
    }

    #[test]
    fn test_parse_pid_stat() {
        let stat = parse(SAMPLE).expect("valid record");
        assert_eq!(stat.pid, 1234);
        assert_eq!(stat.name, "test_process");
        assert_eq!(stat.state, 'S');
        assert_eq!(stat.utime, 1000);
        assert_eq!(stat.stime, 500);
        assert_eq!(stat.total_ticks(), 1500);
        assert_eq!(stat.start_time, 12345);
        assert_eq!(stat.rss_pages, 1234);
    }

    #[test]
    fn test_parse_name_with_spaces_and_parens() {
        let content = SAMPLE.replace("(test_process)", "(tmux: server (1))");
        let stat = parse(&content).expect("valid record");
        assert_eq!(stat.name, "tmux: server (1)");
        assert_eq!(stat.utime, 1000);
        assert_eq!(stat.rss_pages, 1234);
    }

    #[test]
    fn test_parse_truncates_long_names() {
        let long = "x".repeat(80);
        let content = SAMPLE.replace("test_process", &long);
        let stat = parse(&content).expect("valid record");
        assert_eq!(stat.name.chars().count(), MAX_NAME_LEN);
    }

    #[test]
    fn test_parse_too_few_fields() {
        let result = parse("1234 (test) S 1 2 3");
        assert!(matches!(result, Err(SampleError::MalformedRecord { .. })));
    }

    #[test]
    fn test_parse_missing_parens() {
        assert!(parse("1234 test S 1 2 3").is_err());
        assert!(parse("1234 (test S 1 2 3").is_err());
    }

    #[test]
    fn test_parse_non_numeric_counter() {
        let content = SAMPLE.replace(" 1000 500 ", " abc 500 ");
        let err = parse(&content).expect_err("utime is garbage");
        assert!(err.to_string().contains("utime"));
    }

    #[test]
    fn test_parse_bad_state() {
        let content = SAMPLE.replace(") S ", ") SR ");
        assert!(parse(&content).is_err());
    }

    #[test]
    fn test_parse_zero_values() {
        let content = "1 (idle) I 0 0 0 0 -1 0 0 0 0 0 0 0 0 0 20 0 1 0 5 0 0";
        let stat = parse(content).expect("valid record");
        assert_eq!(stat.state, 'I');
        assert_eq!(stat.total_ticks(), 0);
        assert_eq!(stat.rss_pages, 0);
    }

    #[test]
    fn test_read_missing_process_is_vanished() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let result = read_pid_stat(dir.path(), 999);
        assert!(matches!(result, Err(SampleError::ProcessVanished { pid: 999 })));
    }
}
