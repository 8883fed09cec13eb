//! Configuration system for Causeway.
//! TOML-based, 3-layer resolution: env > project file > defaults.

pub mod causeway_config;
pub mod defaults;
pub mod merge_config;
pub mod observability_config;

pub use causeway_config::CausewayConfig;
pub use merge_config::{MergeConfig, SelectorPolicy};
pub use observability_config::ObservabilityConfig;
