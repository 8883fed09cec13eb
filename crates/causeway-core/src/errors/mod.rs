//! Error handling for Causeway.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod config_error;
pub mod error_code;
pub mod feed_error;
pub mod merge_error;

pub use config_error::ConfigError;
pub use error_code::CausewayErrorCode;
pub use feed_error::FeedError;
pub use merge_error::MergeError;

/// Top-level error aggregating every subsystem error.
#[derive(Debug, thiserror::Error)]
pub enum CausewayError {
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("merge error: {0}")]
    Merge(#[from] MergeError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl CausewayErrorCode for CausewayError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Feed(e) => e.error_code(),
            Self::Merge(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
        }
    }
}

/// Convenience alias used across the workspace.
pub type CausewayResult<T> = Result<T, CausewayError>;
