//! Error types for splitlab
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Splitlab error types
#[derive(Error, Debug)]
pub enum Error {
    /// Traffic allocation does not sum to 100 (data-integrity violation)
    #[error("Invalid traffic allocation: control={control} + variant={variant} != 100\nFix the experiment definition; allocations are never normalized.")]
    InvalidAllocation {
        /// Control share in percent
        control: u8,
        /// Variant share in percent
        variant: u8,
    },

    /// Malformed input on the write path
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Experiment is missing or not accepting events
    #[error("Experiment not found or not running: {0}")]
    ExperimentNotFound(String),

    /// Every event in a batch was rejected
    #[error("No valid events to track")]
    NoValidEvents,

    /// Experiment store or event log failure (retryable)
    #[error("Store error: {0}\nThe operation was not applied; retry the request.")]
    StoreError(String),

    /// Cache backend failure
    #[error("Cache error: {0}")]
    CacheError(String),

    /// Cached results payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the caller may retry the operation unchanged.
    ///
    /// Only store and event log failures qualify; the core never retries itself.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreError(_))
    }
}
