//! Stable error codes for embedding applications.

/// Every error enum implements this to expose a structured code string
/// that survives formatting changes of the human-readable message.
pub trait CausewayErrorCode {
    /// Returns the error code string (e.g., "FEED_UNAVAILABLE").
    fn error_code(&self) -> &'static str;

    /// Returns `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const CANCELLED: &str = "CANCELLED";
pub const MERGER_CLOSED: &str = "MERGER_CLOSED";
pub const MERGER_NOT_PAUSED: &str = "MERGER_NOT_PAUSED";
pub const FEED_UNAVAILABLE: &str = "FEED_UNAVAILABLE";
pub const SEQUENCE_MISMATCH: &str = "SEQUENCE_MISMATCH";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
