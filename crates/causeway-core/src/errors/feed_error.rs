//! Errors reported by feed sources.

use super::error_code::{self, CausewayErrorCode};
use crate::feed_id::{FeedId, Seq};

/// Failures of the storage or transport behind a feed.
///
/// The merger never retries these; they surface from the step that hit them.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("feed {feed:?} unavailable: {reason}")]
    Unavailable { feed: FeedId, reason: String },

    #[error("feed {feed:?} returned block {found} when asked for index {expected}")]
    SequenceMismatch {
        feed: FeedId,
        expected: Seq,
        found: Seq,
    },
}

impl CausewayErrorCode for FeedError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => error_code::FEED_UNAVAILABLE,
            Self::SequenceMismatch { .. } => error_code::SEQUENCE_MISMATCH,
        }
    }
}
