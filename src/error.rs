//! Error taxonomy for the sampling engine.
//!
//! Every failure here is local to one source or one process. None of them
//! abort a poll cycle: the poller degrades the affected metric and moves on.

use std::io;
use std::path::{Path, PathBuf};

/// Errors raised while reading kernel counters.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    /// A required interface could not be opened or read this cycle.
    #[error("source {} unavailable: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The process exited between enumeration and sampling.
    #[error("process {pid} vanished")]
    ProcessVanished { pid: u32 },

    /// A counter record did not have the expected shape.
    #[error("malformed record in {}: {reason}", path.display())]
    MalformedRecord { path: PathBuf, reason: String },
}

impl SampleError {
    pub fn unavailable(path: &Path, source: io::Error) -> Self {
        Self::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Maps an I/O error on a per-process file. A missing entry or `ESRCH`
    /// means the process is gone, anything else is an unavailable source.
    pub fn from_process_io(pid: u32, path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound || err.raw_os_error() == Some(libc::ESRCH) {
            Self::ProcessVanished { pid }
        } else {
            Self::unavailable(path, err)
        }
    }

    pub fn is_vanished(&self) -> bool {
        matches!(self, Self::ProcessVanished { .. })
    }
}
