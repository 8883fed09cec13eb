//! Running frontier of a merger.
//!
//! The clock starts at the merger's starting frontier and advances by one
//! entry per emitted block. Observers can wait for it to reach a target.
//!
//! # Examples
//!
//! ```
//! use causeway_core::FeedId;
//! use causeway_frontier::VectorFrontier;
//! use causeway_merge::FrontierClock;
//!
//! let a = FeedId::derive("a");
//! let clock = FrontierClock::new(VectorFrontier::new());
//! clock.advance(a, 0);
//! assert!(clock.has_reached(&VectorFrontier::from_frames([(a, 0)])));
//! ```

use causeway_core::{FeedId, Seq};
use causeway_frontier::VectorFrontier;
use tokio::sync::watch;

/// Frontier of everything emitted so far, observable through a watch channel.
#[derive(Debug)]
pub struct FrontierClock {
    frontier: watch::Sender<VectorFrontier>,
}

impl FrontierClock {
    pub fn new(start: VectorFrontier) -> Self {
        let (frontier, _) = watch::channel(start);
        Self { frontier }
    }

    /// Snapshot of the current frontier.
    pub fn frontier(&self) -> VectorFrontier {
        self.frontier.borrow().clone()
    }

    /// Record that block `seq` of `feed` has been emitted.
    pub fn advance(&self, feed: FeedId, seq: Seq) {
        self.frontier.send_modify(|frontier| frontier.set(feed, seq));
    }

    /// Replace the frontier wholesale, e.g. when a merger is repositioned.
    ///
    /// May move entries backwards; waiters re-evaluate against the new value.
    pub fn reset(&self, frontier: VectorFrontier) {
        self.frontier.send_replace(frontier);
    }

    /// True when the current frontier covers `target`.
    pub fn has_reached(&self, target: &VectorFrontier) -> bool {
        self.frontier.borrow().covers(target)
    }

    pub fn subscribe(&self) -> watch::Receiver<VectorFrontier> {
        self.frontier.subscribe()
    }

    /// Resolves once the current frontier covers `target`.
    ///
    /// Never resolves if `target` references blocks that are never emitted;
    /// callers race it against a timeout or cancellation.
    pub async fn wait_until_reached(&self, target: &VectorFrontier) {
        let mut rx = self.frontier.subscribe();
        // The sender lives as long as `self`, so `wait_for` cannot fail here.
        let _ = rx.wait_for(|frontier| frontier.covers(target)).await;
    }
}
