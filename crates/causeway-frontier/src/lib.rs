//! # causeway-frontier
//!
//! Vector frontier for causal ordering across independent append-only feeds.
//!
//! A [`VectorFrontier`] records, per feed, the highest sequence number already
//! processed. Blocks embed the frontier their writer had observed; a block is
//! ready for delivery once the reader's frontier covers it.
//!
//! ## Guarantees
//!
//! [`VectorFrontier::merge`] satisfies:
//! 1. **Commutativity**: `merge(A, B) == merge(B, A)`
//! 2. **Associativity**: `merge(A, merge(B, C)) == merge(merge(A, B), C)`
//! 3. **Idempotency**: `merge(A, A) == A`

pub mod frontier;

pub use frontier::VectorFrontier;
