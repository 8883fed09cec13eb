//! Waiting for a merger to catch up with a target frontier.

use std::time::Duration;

use causeway_frontier::VectorFrontier;

/// Options for `CausalMerger::wait_for_target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetWait {
    /// Give up after this long. `None` waits until reached, stalled or closed.
    pub timeout: Option<Duration>,
    /// Return as soon as the merger reports a new stall.
    pub break_on_stall: bool,
}

impl Default for TargetWait {
    fn default() -> Self {
        Self {
            timeout: None,
            break_on_stall: true,
        }
    }
}

impl TargetWait {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn break_on_stall(mut self, enabled: bool) -> Self {
        self.break_on_stall = enabled;
        self
    }
}

/// How a target wait ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    /// The running frontier covers the target.
    Reached,
    /// A stall was reported before the target was reached.
    Stalled,
    /// The timeout elapsed; `missing` is the part of the target not yet covered.
    TimedOut { missing: VectorFrontier },
}

impl TargetOutcome {
    pub fn is_reached(&self) -> bool {
        matches!(self, Self::Reached)
    }
}
