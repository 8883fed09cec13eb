// Single source of truth for all default values.

// --- Files ---
pub const DEFAULT_CONFIG_FILENAME: &str = "causeway.toml";
pub const ENV_PREFIX: &str = "CAUSEWAY_";

// --- Merge ---
pub const DEFAULT_STALL_TIMEOUT_MS: u64 = 1_000;
pub const DEFAULT_BLOCKED_REPORT_THRESHOLD_SECS: u64 = 10;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = false;
pub const LOG_FILTER_ENV: &str = "CAUSEWAY_LOG";
