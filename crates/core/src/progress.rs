//! Progress reporting types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Which side is the source for one rsync invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// Remote to local, restricted to the configured pull paths
    Pull,
    /// Local to remote, excluding the pull paths
    Push,
    /// Local to remote with no pull-path exclusion: a deliberate full
    /// overwrite, only ever selected explicitly
    ForcedPush,
}

impl Direction {
    /// True for either push variant.
    pub fn is_push(self) -> bool {
        matches!(self, Self::Push | Self::ForcedPush)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pull => write!(f, "pull"),
            Self::Push => write!(f, "push"),
            Self::ForcedPush => write!(f, "forced push"),
        }
    }
}

/// A coarse progress observation scraped from rsync output.
///
/// Percentages are parsed opportunistically from free-form tool
/// output: repeated or out-of-order values are normal and consumers
/// must tolerate them. A successful phase always ends with one event
/// at 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// The direction currently running
    pub direction: Direction,
    /// 0..=100
    pub percentage: u8,
}

/// Caller-supplied progress sink.
///
/// Invoked zero or more times per phase plus exactly once at 100% per
/// phase that actually ran. Invocations are best-effort; a panicking
/// or slow callback must not be able to break the process-output path,
/// so implementations should be cheap and infallible.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_display_names() {
        assert_eq!(Direction::Pull.to_string(), "pull");
        assert_eq!(Direction::Push.to_string(), "push");
        assert_eq!(Direction::ForcedPush.to_string(), "forced push");
    }

    #[test]
    fn push_variants() {
        assert!(!Direction::Pull.is_push());
        assert!(Direction::Push.is_push());
        assert!(Direction::ForcedPush.is_push());
    }
}
