//! Database-collaborator error types.
//!
//! These are the errors a [`crate::Database`] implementation surfaces.
//! The snapshot engine propagates them verbatim - no wrapping, no retries.

use thiserror::Error;

/// Errors raised by a database collaborator.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// A unique index rejected a document.
    #[error("duplicate key for unique index {index:?} on {collection}: {value}")]
    DuplicateKey {
        /// Collection the insert targeted
        collection: String,
        /// Name of the violated index
        index: String,
        /// Canonical encoding of the offending key value
        value: String,
    },

    /// A document with the same `_id` already exists.
    #[error("duplicate document id {id} in {collection}")]
    DuplicateId {
        /// Collection the insert targeted
        collection: String,
        /// The colliding identifier
        id: String,
    },

    /// A document's `_id` field holds a non-identifier value.
    #[error("document _id field in {collection} is not a document id")]
    InvalidId {
        /// Collection the insert targeted
        collection: String,
    },

    /// The named collection does not exist.
    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    /// An index with the same name but a different definition exists.
    #[error("index {index:?} on {collection} already exists with a different definition")]
    IndexConflict {
        /// Collection the index targeted
        collection: String,
        /// The conflicting index name
        index: String,
    },

    /// Any other backend failure.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type for database-collaborator operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this is a uniqueness violation.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Error::DuplicateKey { .. })
    }

    /// Check if this is an unknown-collection error.
    pub fn is_unknown_collection(&self) -> bool {
        matches!(self, Error::UnknownCollection(_))
    }
}
