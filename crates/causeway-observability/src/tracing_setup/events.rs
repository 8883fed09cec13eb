//! Structured log events for merger operations.
//!
//! Each function emits a `tracing` event with structured fields.

use causeway_core::{FeedId, Seq};

/// A feed passed admission and is now tracked.
pub fn feed_admitted(merger: &str, feed: &FeedId, start_index: Seq) {
    tracing::debug!(
        event = "feed_admitted",
        merger = %merger,
        feed = %feed.short(),
        start_index = start_index,
        "feed admitted"
    );
}

/// A feed was rejected by the admission policy.
pub fn feed_rejected(merger: &str, feed: &FeedId) {
    tracing::debug!(
        event = "feed_rejected",
        merger = %merger,
        feed = %feed.short(),
        "feed rejected by admission policy"
    );
}

/// A block was selected and handed to the consumer.
pub fn block_emitted(merger: &str, feed: &FeedId, seq: Seq, candidates: usize) {
    tracing::trace!(
        event = "block_emitted",
        merger = %merger,
        feed = %feed.short(),
        seq = seq,
        candidates = candidates,
        "block emitted"
    );
}

/// A block without a parseable dependency frontier was found at a feed head.
pub fn malformed_block(merger: &str, feed: &FeedId, seq: Seq) {
    tracing::warn!(
        event = "malformed_block",
        merger = %merger,
        feed = %feed.short(),
        seq = seq,
        "block has no dependency frontier; holding it back"
    );
}

/// A wait lasted longer than the stall timeout.
pub fn merger_stalled(merger: &str, feeds: usize, blocked: usize, waited_ms: u128) {
    tracing::warn!(
        event = "merger_stalled",
        merger = %merger,
        feeds = feeds,
        blocked = blocked,
        waited_ms = waited_ms,
        "merger stalled"
    );
}

/// The merger was closed.
pub fn merger_closed(merger: &str, emitted: u64) {
    tracing::info!(
        event = "merger_closed",
        merger = %merger,
        emitted = emitted,
        "merger closed"
    );
}
