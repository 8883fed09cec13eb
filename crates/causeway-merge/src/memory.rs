//! In-memory feeds and a feed store that announces newly opened feeds.
//!
//! Used by tests and by embedders that keep feeds in process. Both types are
//! cheap to share behind `Arc`; several mergers may read the same feeds.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use causeway_core::errors::FeedError;
use causeway_core::{FeedId, Seq};
use causeway_frontier::VectorFrontier;
use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::block::FeedBlock;
use crate::source::{FeedDescriptor, FeedSink, FeedSource};

/// Append-only feed held in memory.
pub struct InMemoryFeed<P> {
    id: FeedId,
    blocks: RwLock<Vec<FeedBlock<P>>>,
    length: watch::Sender<u64>,
}

impl<P: Clone + Send + Sync> InMemoryFeed<P> {
    pub fn new(id: FeedId) -> Self {
        let (length, _) = watch::channel(0);
        Self {
            id,
            blocks: RwLock::new(Vec::new()),
            length,
        }
    }

    pub fn id(&self) -> FeedId {
        self.id
    }

    /// Append a block that depends on `depends_on`. Returns its sequence number.
    pub fn append(&self, payload: P, depends_on: VectorFrontier) -> Seq {
        self.push(payload, Some(depends_on))
    }

    /// Append a block with no dependency frontier, as a corrupt writer would.
    pub fn append_malformed(&self, payload: P) -> Seq {
        self.push(payload, None)
    }

    fn push(&self, payload: P, depends_on: Option<VectorFrontier>) -> Seq {
        let (seq, len) = {
            let mut blocks = self.blocks.write().unwrap_or_else(PoisonError::into_inner);
            let seq = blocks.len() as Seq;
            blocks.push(FeedBlock {
                feed_id: self.id,
                seq,
                payload,
                depends_on,
            });
            (seq, blocks.len() as u64)
        };
        // Publish after the block is visible so a woken reader always finds it.
        self.length.send_replace(len);
        seq
    }
}

impl<P: Clone + Send + Sync> FeedSource<P> for InMemoryFeed<P> {
    fn feed_id(&self) -> FeedId {
        self.id
    }

    fn len(&self) -> u64 {
        self.blocks.read().unwrap_or_else(PoisonError::into_inner).len() as u64
    }

    fn get(&self, index: Seq) -> Result<Option<FeedBlock<P>>, FeedError> {
        let blocks = self.blocks.read().unwrap_or_else(PoisonError::into_inner);
        let Ok(index) = usize::try_from(index) else {
            return Ok(None);
        };
        Ok(blocks.get(index).cloned())
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.length.subscribe()
    }
}

impl<P: Clone + Send + Sync> FeedSink<P> for InMemoryFeed<P> {
    fn feed_id(&self) -> FeedId {
        self.id
    }

    fn append(&self, payload: P, depends_on: VectorFrontier) -> Result<Seq, FeedError> {
        Ok(InMemoryFeed::append(self, payload, depends_on))
    }
}

struct StoreEntry<P> {
    feed: Arc<InMemoryFeed<P>>,
    partition: String,
}

impl<P: Clone + Send + Sync + 'static> StoreEntry<P> {
    fn descriptor(&self) -> FeedDescriptor<P> {
        let source: Arc<dyn FeedSource<P>> = self.feed.clone();
        FeedDescriptor::new(source).with_partition(self.partition.clone())
    }
}

/// Registry of in-memory feeds grouped by partition.
///
/// Subscribers receive a descriptor for every feed already open and for every
/// feed opened later, which is what `CausalMerger::attach_discovery` consumes.
pub struct FeedStore<P> {
    feeds: RwLock<BTreeMap<FeedId, StoreEntry<P>>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<FeedDescriptor<P>>>>,
}

impl<P: Clone + Send + Sync + 'static> FeedStore<P> {
    pub fn new() -> Self {
        Self {
            feeds: RwLock::new(BTreeMap::new()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Open (or create) the feed `id` in `partition`.
    ///
    /// Creating a feed announces it to every live subscriber. Reopening an
    /// existing feed returns it unchanged and announces nothing.
    pub fn open_feed(&self, id: FeedId, partition: &str) -> Arc<InMemoryFeed<P>> {
        // Lock order: feeds, then subscribers (same as `subscribe`).
        let mut feeds = self.feeds.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = feeds.get(&id) {
            return Arc::clone(&entry.feed);
        }
        let entry = StoreEntry {
            feed: Arc::new(InMemoryFeed::new(id)),
            partition: partition.to_string(),
        };
        let descriptor = entry.descriptor();
        let feed = Arc::clone(&entry.feed);
        feeds.insert(id, entry);

        debug!(feed = %id.short(), partition, "feed opened");
        let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(descriptor.clone()).is_ok());
        feed
    }

    pub fn get(&self, id: &FeedId) -> Option<Arc<InMemoryFeed<P>>> {
        let feeds = self.feeds.read().unwrap_or_else(PoisonError::into_inner);
        feeds.get(id).map(|entry| Arc::clone(&entry.feed))
    }

    /// Descriptors of all open feeds, ordered by feed id.
    pub fn descriptors(&self) -> Vec<FeedDescriptor<P>> {
        let feeds = self.feeds.read().unwrap_or_else(PoisonError::into_inner);
        feeds.values().map(StoreEntry::descriptor).collect()
    }

    /// Subscribe to feed announcements, starting with every feed already open.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<FeedDescriptor<P>> {
        let (tx, rx) = mpsc::unbounded_channel();
        // Hold the feed map while registering so no feed is announced twice or missed.
        let feeds = self.feeds.read().unwrap_or_else(PoisonError::into_inner);
        for entry in feeds.values() {
            let _ = tx.send(entry.descriptor());
        }
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    pub fn len(&self) -> usize {
        self.feeds.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P: Clone + Send + Sync + 'static> Default for FeedStore<P> {
    fn default() -> Self {
        Self::new()
    }
}
