//! Memory unit conversions for process and system metrics.

use once_cell::sync::Lazy;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

fn get_page_size() -> u64 {
    // SAFETY: sysconf is safe to call with _SC_PAGESIZE
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 {
        return size as u64;
    }
    4096
}

/// System page size in bytes.
pub static PAGE_SIZE: Lazy<u64> = Lazy::new(get_page_size);

/// Converts a resident page count to megabytes.
pub fn pages_to_mb(pages: u64, page_size: u64) -> f64 {
    (pages as f64 * page_size as f64) / BYTES_PER_MB
}

/// Converts kilobytes to megabytes.
pub fn kb_to_mb(kb: u64) -> f64 {
    kb as f64 / 1024.0
}

/// Parses kilobyte values from `Key:   1234 kB` style lines.
pub fn parse_kb_value(v: &str) -> Option<u64> {
    v.split_whitespace().next()?.parse().ok()
}
