//! Vector frontier: the highest processed sequence number per feed.
//!
//! Sequence numbers are zero-based, so a frontier entry `{A: 2}` accounts for
//! blocks 0, 1 and 2 of feed `A`.
//!
//! # Examples
//!
//! ```
//! use causeway_core::FeedId;
//! use causeway_frontier::VectorFrontier;
//!
//! let a = FeedId::derive("a");
//! let b = FeedId::derive("b");
//!
//! let written_with = VectorFrontier::from_frames([(a, 3), (b, 1)]);
//! let current = VectorFrontier::from_frames([(a, 3)]);
//!
//! // The writer had seen b:1 which `current` has not processed yet.
//! let missing = VectorFrontier::dependencies(&written_with, &current);
//! assert_eq!(missing.frames(), vec![(b, 1)]);
//! assert!(!current.covers(&written_with));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use causeway_core::{FeedId, Seq};
use serde::{Deserialize, Serialize};

/// Mapping from feed id to the last processed sequence number of that feed.
///
/// Backed by an ordered map: equality, iteration and serialization do not
/// depend on the order entries were inserted in. Merge is pointwise max.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorFrontier {
    frames: BTreeMap<FeedId, Seq>,
}

impl VectorFrontier {
    /// Create an empty frontier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frontier from `(feed, seq)` pairs. Later duplicates overwrite earlier ones.
    pub fn from_frames<I>(frames: I) -> Self
    where
        I: IntoIterator<Item = (FeedId, Seq)>,
    {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Sequence number recorded for `feed`, if any.
    pub fn get(&self, feed: &FeedId) -> Option<Seq> {
        self.frames.get(feed).copied()
    }

    /// Insert or overwrite the entry for `feed`.
    ///
    /// Does not enforce monotonicity; callers advancing a running frontier
    /// must never move an entry backwards.
    pub fn set(&mut self, feed: FeedId, seq: Seq) {
        self.frames.insert(feed, seq);
    }

    /// Snapshot of all entries, ordered by feed id.
    pub fn frames(&self) -> Vec<(FeedId, Seq)> {
        self.iter().collect()
    }

    /// Borrowing iterator over entries, ordered by feed id.
    pub fn iter(&self) -> impl Iterator<Item = (FeedId, Seq)> + '_ {
        self.frames.iter().map(|(id, seq)| (*id, *seq))
    }

    /// Feed ids present in this frontier.
    pub fn feeds(&self) -> impl Iterator<Item = &FeedId> + '_ {
        self.frames.keys()
    }

    /// Number of distinct feeds.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of messages this frontier accounts for: Σ(seq + 1), saturating at `u64::MAX`.
    pub fn total_messages(&self) -> u64 {
        self.frames
            .values()
            .fold(0, |total: u64, seq| total.saturating_add(seq.saturating_add(1)))
    }

    /// Index of the first block of `feed` not covered by this frontier.
    ///
    /// Saturates at `Seq::MAX`, so a frontier decoded from untrusted input
    /// can never overflow here.
    pub fn next_index(&self, feed: &FeedId) -> Seq {
        self.get(feed).map_or(0, |seq| seq.saturating_add(1))
    }

    /// Copy of this frontier without the given feeds (e.g. revoked writers).
    pub fn without_keys<'a, I>(&self, feeds: I) -> Self
    where
        I: IntoIterator<Item = &'a FeedId>,
    {
        let mut result = self.clone();
        for feed in feeds {
            result.frames.remove(feed);
        }
        result
    }

    /// Join `other` into `self`: pointwise max.
    pub fn join(&mut self, other: &Self) {
        for (feed, &seq) in &other.frames {
            self.frames
                .entry(*feed)
                .and_modify(|current| *current = (*current).max(seq))
                .or_insert(seq);
        }
    }

    /// Pointwise maximum of all inputs (vector clock join).
    ///
    /// Commutative, associative and idempotent. A feed missing from one input
    /// is simply ignored for that input.
    pub fn merge<'a, I>(frontiers: I) -> Self
    where
        I: IntoIterator<Item = &'a VectorFrontier>,
    {
        let mut result = Self::new();
        for frontier in frontiers {
            result.join(frontier);
        }
        result
    }

    /// Entries of `a` that `b` does not cover.
    ///
    /// A feed is included (with `a`'s sequence number) when `b` has no entry
    /// for it or `b`'s entry is strictly lower. An empty result means
    /// everything `a` knows about has already been processed by `b`.
    pub fn dependencies(a: &Self, b: &Self) -> Self {
        Self {
            frames: a
                .frames
                .iter()
                .map(|(feed, seq)| (*feed, *seq))
                .filter(|(feed, seq)| b.get(feed).map_or(true, |have| have < *seq))
                .collect(),
        }
    }

    /// True when every entry of `other` is at or below this frontier.
    pub fn covers(&self, other: &Self) -> bool {
        Self::dependencies(other, self).is_empty()
    }
}

impl fmt::Display for VectorFrontier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (feed, seq)) in self.frames.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}:{}", feed.short(), seq)?;
        }
        f.write_str("}")
    }
}

impl FromIterator<(FeedId, Seq)> for VectorFrontier {
    fn from_iter<I: IntoIterator<Item = (FeedId, Seq)>>(iter: I) -> Self {
        Self::from_frames(iter)
    }
}

impl Extend<(FeedId, Seq)> for VectorFrontier {
    fn extend<I: IntoIterator<Item = (FeedId, Seq)>>(&mut self, iter: I) {
        self.frames.extend(iter);
    }
}

impl<'a> IntoIterator for &'a VectorFrontier {
    type Item = (&'a FeedId, &'a Seq);
    type IntoIter = std::collections::btree_map::Iter<'a, FeedId, Seq>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}
