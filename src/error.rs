//! Error types for label validation, decomposition and allocation.

use thiserror::Error;

/// Result type alias using [`LabelError`].
pub type Result<T> = std::result::Result<T, LabelError>;

/// Contract violations reported by the label algebra.
///
/// None of these are transient: every variant means the caller passed data
/// that can never succeed, so retrying is pointless.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LabelError {
    /// Input is not a canonical label (embedded NUL or odd final byte).
    #[error("invalid label: {label}")]
    InvalidLabel {
        /// Hex rendering of the offending bytes.
        label: String,
    },

    /// Two labels or a count that do not satisfy an allocation precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The root label has no parent and no ancestors.
    #[error("the root label has no parent")]
    NoParent,

    /// The root label has no finite descendant bound.
    #[error("the root label has no descendant bound (every other label is a descendant)")]
    NoDescendantBound,

    /// Label does not fit a fixed-width column.
    #[error("label of {len} bytes does not fit a {width}-byte column")]
    TooWide {
        /// Length of the label in bytes.
        len: usize,
        /// Width of the column in bytes.
        width: usize,
    },
}

impl LabelError {
    /// Create an invalid label error for the given bytes.
    pub fn invalid_label(bytes: &[u8]) -> Self {
        LabelError::InvalidLabel {
            label: hex::encode(bytes),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        LabelError::InvalidArgument(msg.into())
    }
}
