//! # causeway-core
//!
//! Foundation crate for the Causeway causal ordering engine.
//! Defines feed identity, sequence numbers, errors, config, and defaults.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod errors;
pub mod feed_id;

// Re-export the most commonly used types at the crate root.
pub use config::CausewayConfig;
pub use errors::{CausewayError, CausewayResult};
pub use feed_id::{FeedId, Seq};
