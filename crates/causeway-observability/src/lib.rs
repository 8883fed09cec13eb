//! # causeway-observability
//!
//! Structured logging for the Causeway causal ordering engine.
//!
//! ## Modules
//!
//! - [`tracing_setup`]: subscriber initialization and structured event helpers

pub mod tracing_setup;

pub use tracing_setup::events;
pub use tracing_setup::{init_tracing, init_tracing_from_config};
