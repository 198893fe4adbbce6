//! Error types for the stride vector-store harness.
//!
//! Every variant signals a violated API precondition or an exhausted
//! resource. None of them are transient: callers propagate them with `?`
//! and never retry.

use std::error::Error;
use std::fmt;

/// Errors from vector-store operations.
///
/// Shared by all store kinds so that code driving a `dyn`-free generic
/// [`VectorStore`](crate::VectorStore) sees one error vocabulary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// The requested shape is unusable: zero dimension, or an element
    /// count that does not fit in `usize`.
    InvalidShape {
        /// Requested number of vectors.
        capacity: usize,
        /// Requested vector dimension.
        dim: usize,
    },
    /// A vector passed to `write` does not have the store's dimension.
    DimensionMismatch {
        /// The store's dimension.
        expected: usize,
        /// Length of the rejected vector.
        actual: usize,
    },
    /// A reshape would change the total element count.
    ShapeMismatch {
        /// `(capacity, dim)` of the source view.
        from: (usize, usize),
        /// `(capacity, dim)` that was requested.
        to: (usize, usize),
    },
    /// An index or range bound lies outside `[0, len)`.
    IndexOutOfRange {
        /// The offending index (or range end).
        index: usize,
        /// Number of vectors in the store.
        len: usize,
    },
    /// No vector is stored under the given key.
    KeyNotFound {
        /// The missing key.
        key: usize,
    },
    /// A backing file opened read-only is shorter than the shape requires.
    FileTooSmall {
        /// Bytes required by `capacity * dim * ELEMENT_SIZE`.
        required: u64,
        /// Actual file length in bytes.
        actual: u64,
    },
    /// Write attempted on a store opened read-only.
    ReadOnlyViolation,
    /// Operation attempted on a mapped store after `close()`.
    UseAfterClose,
    /// The allocator or the filesystem could not supply the requested space.
    ResourceExhausted {
        /// Size of the failed request in bytes.
        requested_bytes: u64,
    },
    /// A write was attempted while a view into the same shared buffer is
    /// still borrowed.
    BufferInUse,
    /// An I/O failure outside the contract errors above.
    Io {
        /// The operation that failed (`"open"`, `"set_len"`, `"map"`, ...).
        op: &'static str,
        /// The underlying OS error message.
        reason: String,
    },
}

impl StoreError {
    /// Translate an I/O error, folding out-of-space and out-of-memory
    /// conditions into [`StoreError::ResourceExhausted`].
    pub fn from_io(op: &'static str, err: &std::io::Error, requested_bytes: u64) -> Self {
        match err.kind() {
            std::io::ErrorKind::StorageFull | std::io::ErrorKind::OutOfMemory => {
                Self::ResourceExhausted { requested_bytes }
            }
            _ => Self::Io {
                op,
                reason: err.to_string(),
            },
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidShape { capacity, dim } => {
                write!(f, "invalid shape: capacity {capacity}, dim {dim}")
            }
            Self::DimensionMismatch { expected, actual } => {
                write!(f, "dimension mismatch: expected {expected}, got {actual}")
            }
            Self::ShapeMismatch { from, to } => write!(
                f,
                "cannot reshape {}x{} into {}x{}: element count differs",
                from.0, from.1, to.0, to.1
            ),
            Self::IndexOutOfRange { index, len } => {
                write!(f, "index {index} out of range for store of {len} vectors")
            }
            Self::KeyNotFound { key } => write!(f, "key {key} not found"),
            Self::FileTooSmall { required, actual } => write!(
                f,
                "backing file too small: requires {required} bytes, found {actual}"
            ),
            Self::ReadOnlyViolation => write!(f, "store is read-only"),
            Self::UseAfterClose => write!(f, "store used after close"),
            Self::ResourceExhausted { requested_bytes } => {
                write!(f, "resource exhausted allocating {requested_bytes} bytes")
            }
            Self::BufferInUse => write!(f, "shared buffer is borrowed by a live view"),
            Self::Io { op, reason } => write!(f, "{op} failed: {reason}"),
        }
    }
}

impl Error for StoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_full_maps_to_resource_exhausted() {
        let err = std::io::Error::from(std::io::ErrorKind::StorageFull);
        assert_eq!(
            StoreError::from_io("set_len", &err, 4096),
            StoreError::ResourceExhausted {
                requested_bytes: 4096
            }
        );
    }

    #[test]
    fn other_io_errors_keep_their_operation() {
        let err = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        match StoreError::from_io("open", &err, 0) {
            StoreError::Io { op, .. } => assert_eq!(op, "open"),
            other => panic!("expected Io, got {other:?}"),
        }
    }

    #[test]
    fn display_mentions_both_shapes() {
        let msg = StoreError::ShapeMismatch {
            from: (4, 2),
            to: (3, 3),
        }
        .to_string();
        assert!(msg.contains("4x2"));
        assert!(msg.contains("3x3"));
    }
}
