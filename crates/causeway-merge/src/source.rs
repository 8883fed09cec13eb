//! Boundary to the storage that holds feeds.
//!
//! The merger only reads: it asks a feed for the block at an index and
//! subscribes to length changes. Storage, replication and retries live on the
//! other side of [`FeedSource`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use causeway_core::errors::FeedError;
use causeway_core::{FeedId, Seq};
use causeway_frontier::VectorFrontier;
use tokio::sync::watch;

use crate::block::FeedBlock;

/// Read access to one feed.
pub trait FeedSource<P>: Send + Sync {
    fn feed_id(&self) -> FeedId;

    /// Number of blocks currently available.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Non-blocking lookup of the block at `index`; `Ok(None)` if not yet available.
    fn get(&self, index: Seq) -> Result<Option<FeedBlock<P>>, FeedError>;

    /// Watch channel carrying the feed length, updated on every append.
    fn subscribe(&self) -> watch::Receiver<u64>;
}

/// Write access to one feed.
pub trait FeedSink<P>: Send + Sync {
    fn feed_id(&self) -> FeedId;

    /// Append a block and return its sequence number.
    fn append(&self, payload: P, depends_on: VectorFrontier) -> Result<Seq, FeedError>;
}

/// A discovered feed offered to the merger.
///
/// The merger only looks at the id and the source; partition and labels are
/// there for admission policies.
pub struct FeedDescriptor<P> {
    feed_id: FeedId,
    partition: Option<String>,
    labels: BTreeMap<String, String>,
    source: Arc<dyn FeedSource<P>>,
}

impl<P> FeedDescriptor<P> {
    pub fn new(source: Arc<dyn FeedSource<P>>) -> Self {
        Self {
            feed_id: source.feed_id(),
            partition: None,
            labels: BTreeMap::new(),
            source,
        }
    }

    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn feed_id(&self) -> FeedId {
        self.feed_id
    }

    pub fn partition(&self) -> Option<&str> {
        self.partition.as_deref()
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    pub fn source(&self) -> &Arc<dyn FeedSource<P>> {
        &self.source
    }
}

impl<P> Clone for FeedDescriptor<P> {
    fn clone(&self) -> Self {
        Self {
            feed_id: self.feed_id,
            partition: self.partition.clone(),
            labels: self.labels.clone(),
            source: Arc::clone(&self.source),
        }
    }
}

impl<P> fmt::Debug for FeedDescriptor<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedDescriptor")
            .field("feed_id", &self.feed_id)
            .field("partition", &self.partition)
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}
