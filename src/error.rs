//! Error types for the distributed multiplication.
use thiserror::Error;

/// Errors that can abort a run.
///
/// Every error is fatal for the whole run: a worker that drops out of
/// the round schedule leaves its partners waiting forever.
#[derive(Debug, Error)]
pub enum FoxError {
    /// Worker count, matrix size or matrix shape do not fit the grid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A block or message buffer could not be allocated.
    #[error("Allocation error: could not reserve {elements} elements")]
    Allocation {
        /// Number of entries requested
        elements: usize,
    },

    /// A scoped exchange failed.
    #[error("Communication error: {0}")]
    Communication(String),
}

impl FoxError {
    pub(crate) fn config<S: Into<String>>(msg: S) -> Self {
        FoxError::Configuration(msg.into())
    }

    pub(crate) fn comm<S: Into<String>>(msg: S) -> Self {
        FoxError::Communication(msg.into())
    }
}

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, FoxError>;
