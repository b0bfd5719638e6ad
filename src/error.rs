// src/error.rs

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PcaError>;

/// Errors raised while validating inputs, fitting, or using a PCA model.
///
/// Every failure is detected eagerly and reported synchronously. None of them
/// is transient: calling again with the same inputs fails the same way.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PcaError {
    /// Two lengths that must agree do not.
    #[error("dimension mismatch for {what}: expected {expected}, found {found}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        found: usize,
    },

    /// A parameter or derived quantity lies outside its admissible range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A structural precondition on an integer parameter was violated.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The eigendecomposition or SVD routine reported a failure.
    #[error("decomposition failed: {0}")]
    Decomposition(String),

    /// Saving or loading a model failed.
    #[error("model persistence failed: {0}")]
    Persistence(String),
}

impl PcaError {
    pub(crate) fn dimension_mismatch(what: impl Into<String>, expected: usize, found: usize) -> Self {
        PcaError::DimensionMismatch {
            what: what.into(),
            expected,
            found,
        }
    }
}
