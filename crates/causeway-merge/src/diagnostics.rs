//! Point-in-time view of a merger for livelock and stall investigation.
//!
//! A block whose dependencies reference a feed the merger never tracks is
//! held back forever. That is not an error, so it only shows up here: every
//! blocked feed head is listed with the dependency delta it is waiting for
//! and how long it has been waiting.

use std::time::Duration;

use causeway_core::{FeedId, Seq};
use causeway_frontier::VectorFrontier;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::block::BlockReason;
use crate::state::MergerState;

/// A feed head that is present but not causally ready.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockedCandidate {
    pub feed_id: FeedId,
    pub seq: Seq,
    pub reason: BlockReason,
    /// When this head was first seen blocked.
    pub blocked_since: DateTime<Utc>,
    pub blocked_for_ms: u64,
}

impl BlockedCandidate {
    pub fn blocked_for(&self) -> Duration {
        Duration::from_millis(self.blocked_for_ms)
    }
}

/// Read position of one tracked feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedCursor {
    pub feed_id: FeedId,
    pub partition: Option<String>,
    /// Index of the next block the merger will read.
    pub next_index: Seq,
    /// Blocks available in the feed when the snapshot was taken.
    pub length: u64,
}

impl FeedCursor {
    /// Blocks available but not yet emitted.
    pub fn backlog(&self) -> u64 {
        self.length.saturating_sub(self.next_index)
    }
}

/// Overall condition derived from a diagnostics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    /// Waiting for data or paused; nothing has been blocked long enough to worry.
    Waiting,
    /// At least one candidate has been blocked past the report threshold.
    Stalled,
    Closed,
}

impl HealthStatus {
    pub fn classify(state: MergerState, blocked: &[BlockedCandidate], threshold: Duration) -> Self {
        if state.is_closed() {
            return Self::Closed;
        }
        if blocked.iter().any(|b| b.blocked_for() >= threshold) {
            return Self::Stalled;
        }
        match state {
            MergerState::WaitingForData | MergerState::Paused => Self::Waiting,
            _ => Self::Healthy,
        }
    }
}

/// Snapshot returned by `CausalMerger::diagnostics`.
#[derive(Debug, Clone, Serialize)]
pub struct MergerDiagnostics {
    pub merger_id: Uuid,
    pub state: MergerState,
    pub frontier: VectorFrontier,
    pub feeds: Vec<FeedCursor>,
    pub blocked: Vec<BlockedCandidate>,
    /// Waits that outlasted the stall timeout since the merger was built.
    pub stalls: u64,
    pub emitted: u64,
    pub health: HealthStatus,
    pub taken_at: DateTime<Utc>,
}

impl MergerDiagnostics {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn is_blocked(&self, feed: &FeedId) -> bool {
        self.blocked.iter().any(|b| &b.feed_id == feed)
    }
}
