//! Process memory sampling.
//!
//! Reads resident set size from `/proc/self/statm` on Linux. On platforms
//! without procfs the sample is simply unavailable; callers treat `None` as
//! "no sample", not as zero.

/// Returns the current resident set size in KiB, if it can be determined.
pub(crate) fn resident_kb() -> Option<u64> {
    let content = std::fs::read_to_string("/proc/self/statm").ok()?;
    let pages: u64 = content.split_whitespace().nth(1)?.parse().ok()?;
    // Pages are typically 4KB
    Some(pages * 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(target_os = "linux")]
    fn test_resident_kb_reports_nonzero() {
        let kb = resident_kb().expect("procfs available on linux");
        assert!(kb > 0);
    }
}
