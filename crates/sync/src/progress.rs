//! Percentage scraping from rsync output
//!
//! rsync's `--progress` output has no formal contract; we mine it for
//! `<digits>%` tokens as a coarse progress proxy. Lines without a
//! marker, repeated values, and values arriving out of order are all
//! normal and never an error.

use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::unwrap_used)] // the pattern is a compile-time constant
static PERCENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)%").unwrap());

/// Extract a percentage marker from one line of tool output.
///
/// Returns the last marker on the line (rsync rewrites in-place lines
/// where the rightmost value is the current one), clamped to 100.
pub fn scan_percentage(line: &str) -> Option<u8> {
    let caps = PERCENT.captures_iter(line).last()?;
    let value: u64 = caps[1].parse().ok()?;
    u8::try_from(value.min(100)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_marker_in_typical_rsync_line() {
        let line = "      1,234,567  42%    1.2MB/s    0:00:05";
        assert_eq!(scan_percentage(line), Some(42));
    }

    #[test]
    fn last_marker_wins() {
        assert_eq!(scan_percentage(" 10% ... 55%"), Some(55));
    }

    #[test]
    fn plain_lines_have_no_marker() {
        assert_eq!(scan_percentage("sending incremental file list"), None);
        assert_eq!(scan_percentage(""), None);
        assert_eq!(scan_percentage("100 files transferred"), None);
    }

    #[test]
    fn values_above_100_are_clamped() {
        assert_eq!(scan_percentage("9001%"), Some(100));
    }

    #[test]
    fn zero_and_hundred_are_valid() {
        assert_eq!(scan_percentage("0%"), Some(0));
        assert_eq!(scan_percentage("100%"), Some(100));
    }
}
