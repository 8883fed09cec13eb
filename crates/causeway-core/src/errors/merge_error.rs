//! Errors surfaced by the causal merger.

use super::error_code::{self, CausewayErrorCode};
use super::FeedError;

/// Outcome of a merge step that did not yield a block.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// The merger was closed; a pending or later step resolves with this.
    #[error("merge cancelled")]
    Cancelled,

    /// A mutating call (e.g. adding a feed) was made after close.
    #[error("merger is closed")]
    Closed,

    /// Repositioning was requested while a step may be running.
    #[error("merger must be paused or idle to move its cursor")]
    NotPaused,

    /// A feed source failed while its next block was being read.
    #[error(transparent)]
    Feed(#[from] FeedError),
}

impl MergeError {
    /// True when the merger stopped because it was closed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Closed)
    }
}

impl CausewayErrorCode for MergeError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Cancelled => error_code::CANCELLED,
            Self::Closed => error_code::MERGER_CLOSED,
            Self::NotPaused => error_code::MERGER_NOT_PAUSED,
            Self::Feed(e) => e.error_code(),
        }
    }
}
