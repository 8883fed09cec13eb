//! Causal merger: one delivery order over many concurrently written feeds.
//!
//! Each step gathers the next unread block of every tracked feed, keeps the
//! ones whose dependency frontier is covered by the running frontier, and
//! asks the candidate selector to pick one. When nothing is ready the step
//! suspends until a tracked feed grows, a feed is added, or the merger is
//! closed.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use causeway_core::FeedId;
//! use causeway_frontier::VectorFrontier;
//! use causeway_merge::{CausalMerger, FeedDescriptor, InMemoryFeed};
//!
//! # tokio_test_block(async {
//! let a = Arc::new(InMemoryFeed::new(FeedId::derive("a")));
//! let b = Arc::new(InMemoryFeed::new(FeedId::derive("b")));
//!
//! // b's first block was written after its author had seen a:0.
//! b.append("reply", VectorFrontier::from_frames([(a.id(), 0)]));
//! a.append("hello", VectorFrontier::new());
//!
//! let merger: CausalMerger<&str> = CausalMerger::new();
//! for feed in [&a, &b] {
//!     let descriptor: FeedDescriptor<&str> = FeedDescriptor::new(feed.clone());
//!     merger.add_feed(descriptor).unwrap();
//! }
//!
//! assert_eq!(merger.next().await.unwrap().data, "hello");
//! assert_eq!(merger.next().await.unwrap().data, "reply");
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use causeway_core::config::MergeConfig;
use causeway_core::errors::{FeedError, MergeError};
use causeway_core::{CausewayConfig, FeedId, Seq};
use causeway_frontier::VectorFrontier;
use causeway_observability::events;
use chrono::{DateTime, Utc};
use futures_util::future::select_all;
use futures_util::Stream;
use tokio::sync::{mpsc, watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::block::{BlockReason, EmittedBlock, FeedBlock};
use crate::cancellation::CancellationToken;
use crate::clock::FrontierClock;
use crate::diagnostics::{BlockedCandidate, FeedCursor, HealthStatus, MergerDiagnostics};
use crate::selector::{selector_for, AdmitAll, CandidateSelector, FeedAdmission};
use crate::source::FeedDescriptor;
use crate::state::MergerState;
use crate::target::{TargetOutcome, TargetWait};

pub type MergeResult<T> = Result<T, MergeError>;

/// Merges tracked feeds into a causally consistent sequence of blocks.
///
/// Every emitted block's dependency frontier is covered by the frontier of
/// everything emitted before it (plus the starting frontier). Order among
/// blocks that are ready at the same time is the selector's decision.
///
/// Dropping the merger closes it.
pub struct CausalMerger<P> {
    shared: Arc<Shared<P>>,
}

struct Shared<P> {
    id: Uuid,
    /// Short form of `id` used in log events.
    label: String,
    config: MergeConfig,
    admission: Box<dyn FeedAdmission<P>>,
    /// Held for the whole of a step, so steps never interleave.
    selector: tokio::sync::Mutex<Box<dyn CandidateSelector<P>>>,
    registry: Mutex<Registry<P>>,
    feed_added: Notify,
    clock: Arc<FrontierClock>,
    cancel: CancellationToken,
    state: watch::Sender<MergerState>,
    paused: watch::Sender<bool>,
    stalls: watch::Sender<u64>,
    emitted: AtomicU64,
}

struct Registry<P> {
    feeds: BTreeMap<FeedId, TrackedFeed<P>>,
    rejected: BTreeSet<FeedId>,
    /// Heads found blocked by the last gathering round.
    blocked: BTreeMap<FeedId, BlockedHead>,
    /// Bumped whenever the tracked set changes.
    generation: u64,
    /// Bumped by `set_cursor`; rounds gathered under an older epoch are discarded.
    epoch: u64,
    /// Frontier the merger started from, or was last repositioned to.
    start: VectorFrontier,
    /// Frontier `wait_for_target` waits for.
    target: Option<VectorFrontier>,
    closed: bool,
}

struct TrackedFeed<P> {
    descriptor: FeedDescriptor<P>,
    /// Index of the next block to read.
    cursor: Seq,
    length: watch::Receiver<u64>,
}

struct BlockedHead {
    seq: Seq,
    reason: BlockReason,
    since: DateTime<Utc>,
    since_instant: Instant,
}

/// Result of one gathering round.
struct Round<P> {
    ready: Vec<FeedBlock<P>>,
    watches: Vec<watch::Receiver<u64>>,
    generation: u64,
    epoch: u64,
    tracked: usize,
    blocked: usize,
}

/// Builder for [`CausalMerger`].
pub struct CausalMergerBuilder<P> {
    admission: Box<dyn FeedAdmission<P>>,
    selector: Option<Box<dyn CandidateSelector<P>>>,
    starting_frontier: VectorFrontier,
    config: MergeConfig,
}

impl<P: Clone + Send + Sync + 'static> CausalMergerBuilder<P> {
    fn new() -> Self {
        Self {
            admission: Box::new(AdmitAll),
            selector: None,
            starting_frontier: VectorFrontier::new(),
            config: MergeConfig::default(),
        }
    }

    /// Policy deciding which added feeds are tracked. Default: [`AdmitAll`].
    pub fn admission(mut self, admission: impl FeedAdmission<P> + 'static) -> Self {
        self.admission = Box::new(admission);
        self
    }

    /// Tie-break among ready candidates. Default: the policy named by
    /// `MergeConfig::default_selector`.
    pub fn selector(mut self, selector: impl CandidateSelector<P> + 'static) -> Self {
        self.selector = Some(Box::new(selector));
        self
    }

    /// Frontier already processed by a previous run. Blocks at or below it
    /// are skipped.
    pub fn starting_frontier(mut self, frontier: VectorFrontier) -> Self {
        self.starting_frontier = frontier;
        self
    }

    pub fn config(mut self, config: MergeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> CausalMerger<P> {
        let id = Uuid::new_v4();
        let label = id.simple().to_string()[..8].to_string();
        let selector = self
            .selector
            .unwrap_or_else(|| selector_for(self.config.default_selector));
        debug!(
            merger = %label,
            starting_frontier = %self.starting_frontier,
            "merger created"
        );

        let (state, _) = watch::channel(MergerState::Idle);
        let (paused, _) = watch::channel(false);
        let (stalls, _) = watch::channel(0);
        CausalMerger {
            shared: Arc::new(Shared {
                id,
                label,
                config: self.config,
                admission: self.admission,
                selector: tokio::sync::Mutex::new(selector),
                registry: Mutex::new(Registry {
                    feeds: BTreeMap::new(),
                    rejected: BTreeSet::new(),
                    blocked: BTreeMap::new(),
                    generation: 0,
                    epoch: 0,
                    start: self.starting_frontier.clone(),
                    target: None,
                    closed: false,
                }),
                feed_added: Notify::new(),
                clock: Arc::new(FrontierClock::new(self.starting_frontier)),
                cancel: CancellationToken::new(),
                state,
                paused,
                stalls,
                emitted: AtomicU64::new(0),
            }),
        }
    }
}

impl<P: Clone + Send + Sync + 'static> CausalMerger<P> {
    pub fn builder() -> CausalMergerBuilder<P> {
        CausalMergerBuilder::new()
    }

    /// Merger admitting every feed, starting from an empty frontier.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Merger admitting every feed, tuned by `config`.
    pub fn with_config(config: &CausewayConfig) -> Self {
        Self::builder().config(config.merge.clone()).build()
    }

    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    /// Offer a feed to the merger.
    ///
    /// Returns `Ok(true)` when the feed is now tracked, `Ok(false)` when it
    /// was already tracked or the admission policy rejects it (now or
    /// earlier). Safe to call while a step is waiting; the new feed is seen
    /// by the next gathering round.
    pub fn add_feed(&self, descriptor: FeedDescriptor<P>) -> MergeResult<bool> {
        self.shared.add_feed(descriptor)
    }

    /// Stop tracking a feed. Blocks already emitted stay in the frontier.
    pub fn remove_feed(&self, feed: &FeedId) -> bool {
        let removed = {
            let mut registry = self.shared.lock_registry();
            let removed = registry.feeds.remove(feed).is_some();
            if removed {
                registry.blocked.remove(feed);
                registry.generation += 1;
            }
            removed
        };
        if removed {
            debug!(merger = %self.shared.label, feed = %feed.short(), "feed removed");
            self.shared.feed_added.notify_waiters();
        }
        removed
    }

    /// Emit the next causally ready block.
    ///
    /// Suspends while no tracked feed has a ready block. Resolves with
    /// [`MergeError::Cancelled`] once the merger is closed, including when
    /// the close happens during the wait.
    ///
    /// # Panics
    ///
    /// Panics if the candidate selector returns an index outside the
    /// candidates it was given.
    #[instrument(skip(self), fields(merger = %self.shared.label))]
    pub async fn next(&self) -> MergeResult<EmittedBlock<P>> {
        let shared = &*self.shared;
        if shared.cancel.is_cancelled() {
            return Err(MergeError::Cancelled);
        }
        let mut selector = tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => return Err(MergeError::Cancelled),
            guard = shared.selector.lock() => guard,
        };

        let mut waiting_since: Option<Instant> = None;
        let mut stall_reported = false;
        loop {
            if shared.cancel.is_cancelled() {
                return Err(MergeError::Cancelled);
            }
            shared.wait_while_paused().await?;
            shared.set_state(MergerState::Reading);

            let mut round = shared.gather()?;
            if !round.ready.is_empty() {
                if let Some(index) = selector.select(&round.ready) {
                    let candidates = round.ready.len();
                    assert!(
                        index < candidates,
                        "candidate selector returned index {index} for {candidates} candidates"
                    );
                    let block = round.ready.swap_remove(index);
                    if shared.commit(&block, candidates, round.epoch)? {
                        return Ok(block.into());
                    }
                    // Repositioned while this round was in flight.
                    continue;
                }
            }

            shared.set_state(MergerState::WaitingForData);
            let started = *waiting_since.get_or_insert_with(Instant::now);
            let stall_at = (!stall_reported).then(|| started + shared.config.stall_timeout());
            if shared.wait_for_change(round, stall_at).await? {
                stall_reported = true;
            }
        }
    }

    /// Stream of emitted blocks.
    ///
    /// Ends when the merger is closed. A feed error is yielded once and then
    /// ends the stream too, since the failing source would fail again on the
    /// next step; call [`next`](Self::next) directly to retry.
    pub fn stream(&self) -> impl Stream<Item = MergeResult<EmittedBlock<P>>> + '_ {
        futures_util::stream::unfold(Some(self), |merger| async move {
            let merger = merger?;
            match merger.next().await {
                Ok(block) => Some((Ok(block), Some(merger))),
                Err(e) if e.is_cancelled() => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    /// Close the merger. Idempotent.
    ///
    /// A pending [`next`](Self::next) resolves with `Cancelled`; later calls
    /// to `next` do the same and `add_feed` returns `Closed`.
    pub fn close(&self) {
        self.shared.close();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.cancel.is_cancelled()
    }

    /// Hold the merger before its next gathering round.
    pub fn pause(&self) {
        self.shared.paused.send_replace(true);
        self.shared.set_state(MergerState::Paused);
        debug!(merger = %self.shared.label, "merger paused");
    }

    pub fn resume(&self) {
        self.shared.paused.send_replace(false);
        self.shared.state.send_if_modified(|state| {
            let was_paused = *state == MergerState::Paused;
            if was_paused {
                *state = MergerState::Idle;
            }
            was_paused
        });
        debug!(merger = %self.shared.label, "merger resumed");
    }

    pub fn is_paused(&self) -> bool {
        *self.shared.paused.borrow()
    }

    /// Snapshot of the running frontier.
    pub fn frontier(&self) -> VectorFrontier {
        self.shared.clock.frontier()
    }

    pub fn clock(&self) -> Arc<FrontierClock> {
        Arc::clone(&self.shared.clock)
    }

    /// Frontier of the last block currently present in every tracked feed.
    ///
    /// The merger may never reach it if some of those blocks depend on
    /// feeds it does not track.
    pub fn end_frontier(&self) -> VectorFrontier {
        let registry = self.shared.lock_registry();
        registry
            .feeds
            .iter()
            .filter_map(|(id, feed)| {
                let len = feed.descriptor.source().len();
                (len > 0).then(|| (*id, len - 1))
            })
            .collect()
    }

    /// Resolves once the running frontier covers `target`.
    pub async fn wait_until_reached(&self, target: &VectorFrontier) -> MergeResult<()> {
        let shared = &*self.shared;
        if shared.clock.has_reached(target) {
            return Ok(());
        }
        tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => Err(MergeError::Cancelled),
            _ = shared.clock.wait_until_reached(target) => Ok(()),
        }
    }

    /// Frontier the merger started from, or was last repositioned to.
    pub fn start_frontier(&self) -> VectorFrontier {
        self.shared.lock_registry().start.clone()
    }

    /// Move the merger to a new starting frontier.
    ///
    /// Every tracked feed resumes after its entry in `frontier` (from index 0
    /// if absent) and the running frontier is replaced by `frontier`. Only
    /// allowed while paused or before the first step; otherwise returns
    /// [`MergeError::NotPaused`]. A step held by `pause()` picks up the new
    /// position on `resume()`.
    pub fn set_cursor(&self, frontier: VectorFrontier) -> MergeResult<()> {
        let shared = &*self.shared;
        {
            let mut guard = shared.lock_registry();
            let registry = &mut *guard;
            if registry.closed {
                return Err(MergeError::Closed);
            }
            if !self.is_paused() && self.state() != MergerState::Idle {
                return Err(MergeError::NotPaused);
            }
            for (id, feed) in registry.feeds.iter_mut() {
                feed.cursor = frontier.next_index(id);
            }
            registry.blocked.clear();
            registry.start = frontier.clone();
            registry.epoch += 1;
            registry.generation += 1;
            shared.clock.reset(frontier.clone());
        }
        debug!(merger = %shared.label, start = %frontier, "cursor moved");
        shared.feed_added.notify_waiters();
        Ok(())
    }

    /// Record the frontier [`wait_for_target`](Self::wait_for_target) waits for.
    pub fn set_target(&self, target: VectorFrontier) {
        self.shared.lock_registry().target = Some(target);
    }

    /// Target frontier; empty when none was set.
    pub fn target_frontier(&self) -> VectorFrontier {
        self.shared
            .lock_registry()
            .target
            .clone()
            .unwrap_or_default()
    }

    /// Wait until the running frontier covers the target frontier.
    ///
    /// With `break_on_stall`, returns [`TargetOutcome::Stalled`] as soon as
    /// the merger reports a stall after this call started. On timeout, logs
    /// the entries still missing and returns them.
    pub async fn wait_for_target(&self, options: TargetWait) -> MergeResult<TargetOutcome> {
        let shared = &*self.shared;
        let target = self.target_frontier();
        if shared.clock.has_reached(&target) {
            return Ok(TargetOutcome::Reached);
        }

        // Subscribing marks the current count seen, so only new stalls count.
        let mut stalls = shared.stalls.subscribe();
        let stalled = async {
            if options.break_on_stall && stalls.changed().await.is_ok() {
                return;
            }
            std::future::pending::<()>().await
        };
        let deadline = async {
            match options.timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => Err(MergeError::Cancelled),
            _ = shared.clock.wait_until_reached(&target) => Ok(TargetOutcome::Reached),
            _ = stalled => Ok(TargetOutcome::Stalled),
            _ = deadline => {
                let current = shared.clock.frontier();
                let missing = VectorFrontier::dependencies(&target, &current);
                warn!(
                    merger = %shared.label,
                    timeout_ms = options.timeout.map_or(0, |t| t.as_millis()),
                    current = %current,
                    target = %target,
                    dependencies = %missing,
                    "timed out waiting for target frontier"
                );
                Ok(TargetOutcome::TimedOut { missing })
            }
        }
    }

    pub fn state(&self) -> MergerState {
        *self.shared.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<MergerState> {
        self.shared.state.subscribe()
    }

    /// Number of waits that outlasted the stall timeout.
    pub fn subscribe_stalls(&self) -> watch::Receiver<u64> {
        self.shared.stalls.subscribe()
    }

    /// Tracked feed ids, ordered.
    pub fn feeds(&self) -> Vec<FeedId> {
        self.shared.lock_registry().feeds.keys().copied().collect()
    }

    /// Candidates found blocked by the last gathering round for at least `min_age`.
    pub fn blocked_candidates(&self, min_age: Duration) -> Vec<BlockedCandidate> {
        let registry = self.shared.lock_registry();
        blocked_candidates(&registry, min_age)
    }

    pub fn diagnostics(&self) -> MergerDiagnostics {
        let shared = &*self.shared;
        let state = *shared.state.borrow();
        let (feeds, blocked) = {
            let registry = shared.lock_registry();
            let feeds = registry
                .feeds
                .iter()
                .map(|(id, feed)| FeedCursor {
                    feed_id: *id,
                    partition: feed.descriptor.partition().map(str::to_string),
                    next_index: feed.cursor,
                    length: feed.descriptor.source().len(),
                })
                .collect();
            (feeds, blocked_candidates(&registry, Duration::ZERO))
        };
        let health =
            HealthStatus::classify(state, &blocked, shared.config.blocked_report_threshold());
        MergerDiagnostics {
            merger_id: shared.id,
            state,
            frontier: shared.clock.frontier(),
            feeds,
            blocked,
            stalls: *shared.stalls.borrow(),
            emitted: shared.emitted.load(Ordering::Relaxed),
            health,
            taken_at: Utc::now(),
        }
    }

    /// Feed every descriptor received on `discovered` into [`add_feed`](Self::add_feed)
    /// until the channel or the merger closes.
    ///
    /// Must be called from within a tokio runtime.
    pub fn attach_discovery(
        &self,
        mut discovered: mpsc::UnboundedReceiver<FeedDescriptor<P>>,
    ) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            loop {
                let descriptor = tokio::select! {
                    biased;
                    _ = shared.cancel.cancelled() => break,
                    descriptor = discovered.recv() => match descriptor {
                        Some(descriptor) => descriptor,
                        None => break,
                    },
                };
                if shared.add_feed(descriptor).is_err() {
                    break;
                }
            }
            debug!(merger = %shared.label, "feed discovery stopped");
        })
    }
}

impl<P: Clone + Send + Sync + 'static> Default for CausalMerger<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Drop for CausalMerger<P> {
    fn drop(&mut self) {
        self.shared.close();
    }
}

fn blocked_candidates<P>(registry: &Registry<P>, min_age: Duration) -> Vec<BlockedCandidate> {
    registry
        .blocked
        .iter()
        .filter_map(|(id, head)| {
            let age = head.since_instant.elapsed();
            (age >= min_age).then(|| BlockedCandidate {
                feed_id: *id,
                seq: head.seq,
                reason: head.reason.clone(),
                blocked_since: head.since,
                blocked_for_ms: u64::try_from(age.as_millis()).unwrap_or(u64::MAX),
            })
        })
        .collect()
}

impl<P> Shared<P> {
    fn lock_registry(&self) -> MutexGuard<'_, Registry<P>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: MergerState) {
        self.state.send_if_modified(|state| {
            if state.is_closed() || *state == next {
                return false;
            }
            *state = next;
            true
        });
    }

    fn close(&self) {
        let first = {
            let mut registry = self.lock_registry();
            !std::mem::replace(&mut registry.closed, true)
        };
        self.cancel.cancel();
        if first {
            self.state.send_replace(MergerState::Closed);
            events::merger_closed(&self.label, self.emitted.load(Ordering::Relaxed));
        }
    }
}

impl<P: Clone + Send + Sync + 'static> Shared<P> {
    fn add_feed(&self, descriptor: FeedDescriptor<P>) -> MergeResult<bool> {
        let id = descriptor.feed_id();
        {
            let registry = self.lock_registry();
            if registry.closed {
                return Err(MergeError::Closed);
            }
            if registry.feeds.contains_key(&id) || registry.rejected.contains(&id) {
                return Ok(false);
            }
        }

        // Admission runs unlocked; it is user code.
        let admitted = self.admission.admit(&descriptor);

        let start_index = {
            let mut registry = self.lock_registry();
            if registry.closed {
                return Err(MergeError::Closed);
            }
            if registry.feeds.contains_key(&id) || registry.rejected.contains(&id) {
                return Ok(false);
            }
            if !admitted {
                registry.rejected.insert(id);
                drop(registry);
                events::feed_rejected(&self.label, &id);
                return Ok(false);
            }
            let cursor = self.clock.frontier().next_index(&id);
            let length = descriptor.source().subscribe();
            registry.feeds.insert(
                id,
                TrackedFeed {
                    descriptor,
                    cursor,
                    length,
                },
            );
            registry.generation += 1;
            cursor
        };

        events::feed_admitted(&self.label, &id, start_index);
        self.feed_added.notify_waiters();
        Ok(true)
    }

    async fn wait_while_paused(&self) -> MergeResult<()> {
        if !*self.paused.borrow() {
            return Ok(());
        }
        self.set_state(MergerState::Paused);
        let mut paused = self.paused.subscribe();
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(MergeError::Cancelled),
            _ = paused.wait_for(|paused| !*paused) => Ok(()),
        }
    }

    /// Probe the head of every tracked feed and split ready from blocked.
    fn gather(&self) -> MergeResult<Round<P>> {
        let current = self.clock.frontier();
        let mut guard = self.lock_registry();
        let registry = &mut *guard;

        let mut ready = Vec::new();
        let mut watches = Vec::with_capacity(registry.feeds.len());
        for (id, feed) in registry.feeds.iter_mut() {
            // Mark the length seen before probing so a later append wakes the wait.
            let _ = feed.length.borrow_and_update();
            watches.push(feed.length.clone());

            let Some(block) = feed.descriptor.source().get(feed.cursor)? else {
                registry.blocked.remove(id);
                continue;
            };
            if block.seq != feed.cursor {
                return Err(FeedError::SequenceMismatch {
                    feed: *id,
                    expected: feed.cursor,
                    found: block.seq,
                }
                .into());
            }

            match block.blocked_by(&current) {
                None => {
                    registry.blocked.remove(id);
                    ready.push(block);
                }
                Some(reason) => match registry.blocked.get_mut(id) {
                    Some(head) if head.seq == block.seq => head.reason = reason,
                    _ => {
                        if reason == BlockReason::Malformed {
                            events::malformed_block(&self.label, id, block.seq);
                        }
                        registry.blocked.insert(
                            *id,
                            BlockedHead {
                                seq: block.seq,
                                reason,
                                since: Utc::now(),
                                since_instant: Instant::now(),
                            },
                        );
                    }
                },
            }
        }

        Ok(Round {
            ready,
            watches,
            generation: registry.generation,
            epoch: registry.epoch,
            tracked: registry.feeds.len(),
            blocked: registry.blocked.len(),
        })
    }

    /// Apply a selected block to the cursor and the running frontier.
    ///
    /// Returns `false` without applying anything when the merger was
    /// repositioned after the round was gathered.
    fn commit(&self, block: &FeedBlock<P>, candidates: usize, epoch: u64) -> MergeResult<bool> {
        {
            let mut registry = self.lock_registry();
            // A round that finishes after close is discarded.
            if registry.closed {
                return Err(MergeError::Cancelled);
            }
            if registry.epoch != epoch {
                return Ok(false);
            }
            if let Some(feed) = registry.feeds.get_mut(&block.feed_id) {
                feed.cursor = block.seq.saturating_add(1);
            }
            registry.blocked.remove(&block.feed_id);
            self.clock.advance(block.feed_id, block.seq);
        }
        self.emitted.fetch_add(1, Ordering::Relaxed);
        events::block_emitted(&self.label, &block.feed_id, block.seq, candidates);
        Ok(true)
    }

    /// Suspend until something may have changed. Returns `true` if the stall
    /// deadline fired.
    async fn wait_for_change(&self, round: Round<P>, stall_at: Option<Instant>) -> MergeResult<bool> {
        let feed_added = self.feed_added.notified();
        tokio::pin!(feed_added);
        feed_added.as_mut().enable();
        if self.lock_registry().generation != round.generation {
            return Ok(false);
        }

        let mut watches = round.watches;
        let any_grew = async {
            if watches.is_empty() {
                return std::future::pending::<()>().await;
            }
            let changes = watches.iter_mut().map(|length| {
                Box::pin(async move {
                    // A dropped feed never grows again.
                    if length.changed().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                })
            });
            select_all(changes).await;
        };
        let stall = async {
            match stall_at {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(MergeError::Cancelled),
            _ = &mut feed_added => Ok(false),
            _ = any_grew => Ok(false),
            _ = stall => {
                let waited = stall_at.map_or(Duration::ZERO, |at| {
                    at.elapsed() + self.config.stall_timeout()
                });
                self.stalls.send_modify(|count| *count += 1);
                events::merger_stalled(&self.label, round.tracked, round.blocked, waited.as_millis());
                Ok(true)
            }
        }
    }
}
