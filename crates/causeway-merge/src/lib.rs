//! # causeway-merge
//!
//! Online causal merge of many append-only feeds into one delivery order.
//!
//! Every block carries the [`VectorFrontier`] its writer had observed. The
//! [`CausalMerger`] only emits a block once its own running frontier covers
//! that dependency frontier, so a block is never delivered before anything it
//! causally depends on. Feeds can be attached while the merge is running.
//!
//! ## Modules
//!
//! - [`block`]: `FeedBlock`, `EmittedBlock`, readiness checks
//! - [`source`]: `FeedSource` / `FeedSink` collaborator boundary and `FeedDescriptor`
//! - [`memory`]: In-memory feeds and a feed store that announces new feeds
//! - [`selector`]: Admission and tie-break policies
//! - [`clock`]: `FrontierClock`, the merger's running frontier
//! - [`writer`]: `FrontierWriter`, stamps writes with the local frontier
//! - [`state`]: `MergerState` lifecycle
//! - [`cancellation`]: token used to cancel pending waits on close
//! - [`target`]: options and outcome of waiting for a target frontier
//! - [`diagnostics`]: Blocked-candidate introspection and health
//! - [`merger`]: `CausalMerger`
//!
//! [`VectorFrontier`]: causeway_frontier::VectorFrontier

pub mod block;
pub mod cancellation;
pub mod clock;
pub mod diagnostics;
pub mod memory;
pub mod merger;
pub mod selector;
pub mod source;
pub mod state;
pub mod target;
pub mod writer;

pub use block::{BlockMeta, BlockReason, EmittedBlock, FeedBlock};
pub use clock::FrontierClock;
pub use cancellation::CancellationToken;
pub use diagnostics::{BlockedCandidate, FeedCursor, HealthStatus, MergerDiagnostics};
pub use memory::{FeedStore, InMemoryFeed};
pub use merger::{CausalMerger, CausalMergerBuilder, MergeResult};
pub use selector::{AdmitAll, AdmitPartition, CandidateSelector, FeedAdmission, FirstReady, RoundRobin};
pub use source::{FeedDescriptor, FeedSink, FeedSource};
pub use state::MergerState;
pub use target::{TargetOutcome, TargetWait};
pub use writer::FrontierWriter;
