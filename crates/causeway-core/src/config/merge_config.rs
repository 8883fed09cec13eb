//! Configuration for the causal merger.
//!
//! # Examples
//!
//! ```
//! use causeway_core::config::{MergeConfig, SelectorPolicy};
//!
//! let config = MergeConfig::default();
//! assert_eq!(config.stall_timeout_ms, 1_000);
//! assert_eq!(config.default_selector, SelectorPolicy::FirstReady);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Tie-break policy used when no explicit candidate selector is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorPolicy {
    /// Emit the ready candidate with the lowest feed id.
    #[default]
    FirstReady,
    /// Rotate across feeds so a busy feed cannot starve the others.
    RoundRobin,
}

impl std::str::FromStr for SelectorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first_ready" => Ok(Self::FirstReady),
            "round_robin" => Ok(Self::RoundRobin),
            other => Err(format!("unknown selector policy: {other}")),
        }
    }
}

/// Merger tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Milliseconds a wait may last before the merger reports a stall. Default: 1000.
    pub stall_timeout_ms: u64,
    /// Age in seconds after which a blocked candidate counts as a livelock suspect. Default: 10.
    pub blocked_report_threshold_secs: u64,
    /// Tie-break used by `CausalMerger::with_config`. Default: first_ready.
    pub default_selector: SelectorPolicy,
}

impl MergeConfig {
    pub fn stall_timeout(&self) -> Duration {
        Duration::from_millis(self.stall_timeout_ms)
    }

    pub fn blocked_report_threshold(&self) -> Duration {
        Duration::from_secs(self.blocked_report_threshold_secs)
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            stall_timeout_ms: defaults::DEFAULT_STALL_TIMEOUT_MS,
            blocked_report_threshold_secs: defaults::DEFAULT_BLOCKED_REPORT_THRESHOLD_SECS,
            default_selector: SelectorPolicy::default(),
        }
    }
}
