//! Property tests for the causal merger over randomly interleaved writers.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;

use causeway_core::{FeedId, Seq};
use causeway_frontier::VectorFrontier;
use causeway_merge::{
    CausalMerger, EmittedBlock, FeedDescriptor, FeedSource, InMemoryFeed, RoundRobin,
};

#[derive(Debug, Clone)]
enum Op {
    /// Writer `w` appends a block stamped with everything it has seen.
    Write(usize),
    /// Writer `w` observes the current head of feed `r`.
    Read(usize, usize),
}

fn ops_strategy(feeds: usize) -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        (0..feeds).prop_map(Op::Write),
        (0..feeds, 0..feeds).prop_map(|(w, r)| Op::Read(w, r)),
    ];
    prop::collection::vec(op, 1..60)
}

/// Feeds written according to `ops`, each block depending on what its writer had read.
fn write_feeds(count: usize, ops: &[Op]) -> Vec<Arc<InMemoryFeed<u32>>> {
    let feeds: Vec<_> = (0..count)
        .map(|i| Arc::new(InMemoryFeed::new(FeedId::derive(&format!("writer-{i}")))))
        .collect();
    let mut seen = vec![VectorFrontier::new(); count];
    for (n, op) in ops.iter().enumerate() {
        match *op {
            Op::Write(w) => {
                let seq = feeds[w].append(n as u32, seen[w].clone());
                seen[w].set(feeds[w].id(), seq);
            }
            Op::Read(w, r) => {
                let len = feeds[r].len();
                if len > 0 {
                    let head = VectorFrontier::from_frames([(feeds[r].id(), len - 1)]);
                    seen[w].join(&head);
                }
            }
        }
    }
    feeds
}

fn run_merge(
    feeds: &[Arc<InMemoryFeed<u32>>],
    add_order: &[usize],
    round_robin: bool,
) -> Vec<EmittedBlock<u32>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime");
    runtime.block_on(async {
        let merger: CausalMerger<u32> = if round_robin {
            CausalMerger::builder().selector(RoundRobin::default()).build()
        } else {
            CausalMerger::new()
        };
        for &i in add_order {
            let source: Arc<dyn FeedSource<u32>> = feeds[i].clone();
            merger.add_feed(FeedDescriptor::new(source)).expect("open");
        }
        let total: u64 = feeds.iter().map(|f| f.len()).sum();
        let mut emitted = Vec::new();
        for _ in 0..total {
            let block = tokio::time::timeout(Duration::from_secs(5), merger.next())
                .await
                .expect("every written block becomes ready")
                .expect("merger open");
            emitted.push(block);
        }
        emitted
    })
}

/// Shuffle-free permutation derived from a rotation and optional reversal.
fn add_order(count: usize, rotate: usize, reverse: bool) -> Vec<usize> {
    let mut order: Vec<usize> = (0..count).collect();
    order.rotate_left(rotate % count);
    if reverse {
        order.reverse();
    }
    order
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_block_is_emitted_exactly_once(
        count in 2_usize..5,
        ops in ops_strategy(4),
        rotate in 0_usize..5,
        reverse in any::<bool>(),
        round_robin in any::<bool>(),
    ) {
        let ops: Vec<Op> = ops.into_iter().map(|op| clamp(op, count)).collect();
        let feeds = write_feeds(count, &ops);
        let emitted = run_merge(&feeds, &add_order(count, rotate, reverse), round_robin);

        let expected: BTreeSet<(FeedId, Seq)> = feeds
            .iter()
            .flat_map(|f| (0..f.len()).map(move |seq| (f.id(), seq)))
            .collect();
        let delivered: BTreeSet<(FeedId, Seq)> =
            emitted.iter().map(|b| (b.meta.feed_id, b.meta.seq)).collect();
        prop_assert_eq!(delivered.len(), emitted.len());
        prop_assert_eq!(delivered, expected);
    }

    #[test]
    fn emitted_blocks_respect_causal_precedence(
        count in 2_usize..5,
        ops in ops_strategy(4),
        round_robin in any::<bool>(),
    ) {
        let ops: Vec<Op> = ops.into_iter().map(|op| clamp(op, count)).collect();
        let feeds = write_feeds(count, &ops);
        let emitted = run_merge(&feeds, &add_order(count, 0, false), round_robin);

        let mut current = VectorFrontier::new();
        for block in &emitted {
            prop_assert!(
                current.covers(&block.depends_on),
                "{}:{} emitted at {} before its dependencies {}",
                block.meta.feed_id.short(),
                block.meta.seq,
                current,
                block.depends_on
            );
            prop_assert_eq!(current.next_index(&block.meta.feed_id), block.meta.seq);
            current.set(block.meta.feed_id, block.meta.seq);
        }
    }
}

fn clamp(op: Op, count: usize) -> Op {
    match op {
        Op::Write(w) => Op::Write(w % count),
        Op::Read(w, r) => Op::Read(w % count, r % count),
    }
}
