//! Error types shared by both trie flavours.

use std::fmt;

use thiserror::Error;

/// Result type for radix tree operations.
pub type Result<T> = std::result::Result<T, RadixError>;

/// Errors returned by [`ByteTrie`](crate::ByteTrie) and
/// [`IndexTree`](crate::IndexTree) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RadixError {
    /// The key (or integer index) already holds an entry.
    #[error("duplicate key")]
    DuplicateKey,

    /// The key, index or leaf handle is not a member of the tree.
    #[error("key not found")]
    NotFound,

    /// A caller-supplied argument is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Node or leaf storage could not be grown.
    #[error("allocation failure")]
    AllocationFailure,
}

impl From<std::collections::TryReserveError> for RadixError {
    fn from(_: std::collections::TryReserveError) -> Self {
        RadixError::AllocationFailure
    }
}

/// A failed [`ByteTrie::insert`](crate::ByteTrie::insert).
///
/// The rejected leaf is handed back so the caller keeps ownership.
pub struct InsertError<T> {
    /// Why the insert was rejected.
    pub kind: RadixError,
    /// The leaf that was not inserted.
    pub leaf: T,
}

impl<T> InsertError<T> {
    pub(crate) fn new(kind: RadixError, leaf: T) -> Self {
        Self { kind, leaf }
    }

    /// Discard the leaf and keep only the error kind.
    pub fn into_kind(self) -> RadixError {
        self.kind
    }
}

impl<T> fmt::Debug for InsertError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InsertError")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<T> fmt::Display for InsertError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "insert rejected: {}", self.kind)
    }
}

impl<T> std::error::Error for InsertError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

impl<T> From<InsertError<T>> for RadixError {
    fn from(err: InsertError<T>) -> Self {
        err.kind
    }
}
