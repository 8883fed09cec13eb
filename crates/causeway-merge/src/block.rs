//! Feed blocks and the readiness test applied to them.

use causeway_core::{FeedId, Seq};
use causeway_frontier::VectorFrontier;
use serde::{Deserialize, Serialize};

/// One entry of an append-only feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedBlock<P> {
    pub feed_id: FeedId,
    pub seq: Seq,
    pub payload: P,
    /// What the writer had observed when it wrote this block.
    ///
    /// `None` means the frontier could not be decoded; such a block is held
    /// back forever instead of being guessed at.
    pub depends_on: Option<VectorFrontier>,
}

/// Why a candidate cannot be emitted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockReason {
    /// The block carries no dependency frontier.
    Malformed,
    /// Entries of the block's frontier the merger has not reached yet.
    MissingDependencies { missing: VectorFrontier },
}

impl<P> FeedBlock<P> {
    pub fn new(feed_id: FeedId, seq: Seq, payload: P, depends_on: VectorFrontier) -> Self {
        Self {
            feed_id,
            seq,
            payload,
            depends_on: Some(depends_on),
        }
    }

    /// A block whose dependency frontier is missing or undecodable.
    pub fn malformed(feed_id: FeedId, seq: Seq, payload: P) -> Self {
        Self {
            feed_id,
            seq,
            payload,
            depends_on: None,
        }
    }

    pub fn meta(&self) -> BlockMeta {
        BlockMeta {
            feed_id: self.feed_id,
            seq: self.seq,
        }
    }

    /// `None` when `current` covers this block's dependencies.
    pub fn blocked_by(&self, current: &VectorFrontier) -> Option<BlockReason> {
        match &self.depends_on {
            None => Some(BlockReason::Malformed),
            Some(depends_on) => {
                let missing = VectorFrontier::dependencies(depends_on, current);
                if missing.is_empty() {
                    None
                } else {
                    Some(BlockReason::MissingDependencies { missing })
                }
            }
        }
    }
}

/// Position of a block: which feed, which index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockMeta {
    pub feed_id: FeedId,
    pub seq: Seq,
}

/// A block handed to the consumer by the merger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedBlock<P> {
    pub meta: BlockMeta,
    pub data: P,
    /// Dependency frontier the block was admitted with. Exposed for debugging.
    pub depends_on: VectorFrontier,
}

impl<P> From<FeedBlock<P>> for EmittedBlock<P> {
    fn from(block: FeedBlock<P>) -> Self {
        Self {
            meta: BlockMeta {
                feed_id: block.feed_id,
                seq: block.seq,
            },
            data: block.payload,
            depends_on: block.depends_on.unwrap_or_default(),
        }
    }
}
