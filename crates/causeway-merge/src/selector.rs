//! Admission and tie-break policies injected into the merger.
//!
//! [`FeedAdmission`] decides which discovered feeds are in scope.
//! [`CandidateSelector`] picks one block among the causally-ready candidates;
//! it only ever sees blocks whose dependencies are already satisfied.
//!
//! Plain closures implement both traits.

use causeway_core::config::SelectorPolicy;
use causeway_core::FeedId;

use crate::block::FeedBlock;
use crate::source::FeedDescriptor;

/// Decides whether a newly discovered feed is merged.
pub trait FeedAdmission<P>: Send + Sync {
    fn admit(&self, descriptor: &FeedDescriptor<P>) -> bool;
}

impl<P, F> FeedAdmission<P> for F
where
    F: Fn(&FeedDescriptor<P>) -> bool + Send + Sync,
{
    fn admit(&self, descriptor: &FeedDescriptor<P>) -> bool {
        self(descriptor)
    }
}

/// Picks the next block to emit.
///
/// `candidates` holds at most one block per feed, ordered by feed id, and is
/// never empty. Returning `None` makes the merger wait for new data even
/// though candidates exist. Returning an index outside `candidates` is a
/// contract violation and panics the merger.
pub trait CandidateSelector<P>: Send {
    fn select(&mut self, candidates: &[FeedBlock<P>]) -> Option<usize>;
}

impl<P, F> CandidateSelector<P> for F
where
    F: FnMut(&[FeedBlock<P>]) -> Option<usize> + Send,
{
    fn select(&mut self, candidates: &[FeedBlock<P>]) -> Option<usize> {
        self(candidates)
    }
}

/// Admits every feed.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdmitAll;

impl<P> FeedAdmission<P> for AdmitAll {
    fn admit(&self, _descriptor: &FeedDescriptor<P>) -> bool {
        true
    }
}

/// Admits feeds belonging to one partition (e.g. a space).
#[derive(Debug, Clone)]
pub struct AdmitPartition {
    partition: String,
}

impl AdmitPartition {
    pub fn new(partition: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
        }
    }
}

impl<P> FeedAdmission<P> for AdmitPartition {
    fn admit(&self, descriptor: &FeedDescriptor<P>) -> bool {
        descriptor.partition() == Some(self.partition.as_str())
    }
}

/// Emits the ready candidate with the lowest feed id. Deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstReady;

impl<P> CandidateSelector<P> for FirstReady {
    fn select(&mut self, candidates: &[FeedBlock<P>]) -> Option<usize> {
        candidates
            .iter()
            .enumerate()
            .min_by_key(|(_, block)| block.feed_id)
            .map(|(i, _)| i)
    }
}

/// Rotates across feeds: after emitting from feed `X`, prefers the next
/// ready feed with an id greater than `X`, wrapping around.
#[derive(Debug, Clone, Default)]
pub struct RoundRobin {
    last: Option<FeedId>,
}

impl<P> CandidateSelector<P> for RoundRobin {
    fn select(&mut self, candidates: &[FeedBlock<P>]) -> Option<usize> {
        let lowest = candidates
            .iter()
            .enumerate()
            .min_by_key(|(_, block)| block.feed_id)
            .map(|(i, _)| i)?;
        let after_last = self.last.and_then(|last| {
            candidates
                .iter()
                .enumerate()
                .filter(|(_, block)| block.feed_id > last)
                .min_by_key(|(_, block)| block.feed_id)
                .map(|(i, _)| i)
        });
        let chosen = after_last.unwrap_or(lowest);
        self.last = Some(candidates[chosen].feed_id);
        Some(chosen)
    }
}

/// Boxed selector for a configured policy.
pub fn selector_for<P: 'static>(policy: SelectorPolicy) -> Box<dyn CandidateSelector<P>> {
    match policy {
        SelectorPolicy::FirstReady => Box::new(FirstReady),
        SelectorPolicy::RoundRobin => Box::new(RoundRobin::default()),
    }
}
