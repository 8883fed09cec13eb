//! Writer that stamps every block with the local frontier.

use std::sync::Arc;

use causeway_core::errors::FeedError;
use causeway_core::Seq;

use crate::clock::FrontierClock;
use crate::source::FeedSink;

/// Appends payloads to a feed, recording the clock's current frontier as
/// each block's dependencies.
///
/// Pair it with the clock of the merger that consumes the same partition:
/// every write then depends on everything this peer has already processed.
pub struct FrontierWriter<P> {
    sink: Arc<dyn FeedSink<P>>,
    clock: Arc<FrontierClock>,
}

impl<P> FrontierWriter<P> {
    pub fn new(sink: Arc<dyn FeedSink<P>>, clock: Arc<FrontierClock>) -> Self {
        Self { sink, clock }
    }

    pub fn write(&self, payload: P) -> Result<Seq, FeedError> {
        let depends_on = self.clock.frontier();
        let seq = self.sink.append(payload, depends_on)?;
        tracing::trace!(feed = %self.sink.feed_id().short(), seq, "block written");
        Ok(seq)
    }
}
