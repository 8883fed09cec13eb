//! Property tests for VectorFrontier join and dependency delta.

use proptest::prelude::*;

use causeway_core::FeedId;
use causeway_frontier::VectorFrontier;

/// Frontiers over a small pool of feeds so inputs overlap often.
fn frontier_strategy() -> impl Strategy<Value = VectorFrontier> {
    prop::collection::vec((0_u8..6, 0_u64..50), 0..8).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(feed, seq)| (FeedId::derive(&format!("feed-{feed}")), seq))
            .collect()
    })
}

proptest! {
    #[test]
    fn merge_is_idempotent(a in frontier_strategy()) {
        prop_assert_eq!(VectorFrontier::merge([&a, &a]), a);
    }

    #[test]
    fn merge_is_commutative(a in frontier_strategy(), b in frontier_strategy()) {
        prop_assert_eq!(VectorFrontier::merge([&a, &b]), VectorFrontier::merge([&b, &a]));
    }

    #[test]
    fn merge_is_associative(
        a in frontier_strategy(),
        b in frontier_strategy(),
        c in frontier_strategy()
    ) {
        let left = VectorFrontier::merge([&VectorFrontier::merge([&a, &b]), &c]);
        let right = VectorFrontier::merge([&a, &VectorFrontier::merge([&b, &c])]);
        prop_assert_eq!(left, right);
    }

    #[test]
    fn merge_covers_every_input(a in frontier_strategy(), b in frontier_strategy()) {
        let joined = VectorFrontier::merge([&a, &b]);
        prop_assert!(joined.covers(&a));
        prop_assert!(joined.covers(&b));
    }

    #[test]
    fn dependencies_of_self_is_empty(a in frontier_strategy()) {
        prop_assert!(VectorFrontier::dependencies(&a, &a).is_empty());
    }

    #[test]
    fn dependencies_is_subset_of_first_argument(
        a in frontier_strategy(),
        b in frontier_strategy()
    ) {
        let delta = VectorFrontier::dependencies(&a, &b);
        for (feed, seq) in delta.iter() {
            prop_assert_eq!(a.get(&feed), Some(seq));
            prop_assert!(b.get(&feed).map_or(true, |have| have < seq));
        }
    }

    #[test]
    fn total_messages_is_sum_of_seq_plus_one(
        seqs in prop::collection::vec(0_u64..1_000, 0..10)
    ) {
        let frontier: VectorFrontier = seqs
            .iter()
            .enumerate()
            .map(|(i, seq)| (FeedId::derive(&format!("distinct-{i}")), *seq))
            .collect();
        let expected: u64 = seqs.iter().map(|s| s + 1).sum();
        prop_assert_eq!(frontier.total_messages(), expected);
    }
}
