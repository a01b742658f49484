//! Unified error types for docsnap.
//!
//! Format errors carry the 1-based line number of the offending record so a
//! corrupt snapshot can be diagnosed by position. Database-collaborator
//! errors pass through transparent and unwrapped. No error is retried
//! anywhere: each one aborts the enclosing `write`/`read`/`erase`.

use thiserror::Error;

/// All docsnap errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A line of the snapshot is not a valid encoded record.
    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord {
        /// 1-based line number in the snapshot
        line: u64,
        /// What the codec rejected
        reason: String,
    },

    /// A record's metaType is not one of the four recognized kinds.
    #[error("unknown record kind {kind:?} at line {line}")]
    UnknownRecordKind {
        /// 1-based line number in the snapshot
        line: u64,
        /// The unrecognized kind tag
        kind: String,
    },

    /// The version marker is present but not the supported value.
    #[error("unsupported snapshot version {found} at line {line} (expected 1)")]
    UnsupportedVersion {
        /// 1-based line number in the snapshot
        line: u64,
        /// The version the file declared
        found: i64,
    },

    /// An index/doc/collection record appeared before its governing record.
    #[error("out-of-order {kind} record at line {line}: {reason}")]
    OutOfOrderRecord {
        /// 1-based line number in the snapshot
        line: u64,
        /// Kind of the misplaced record
        kind: &'static str,
        /// Which governing record was missing
        reason: &'static str,
    },

    /// Database-collaborator failure, propagated verbatim.
    #[error(transparent)]
    Database(#[from] docsnap_core::Error),

    /// Source/destination I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for docsnap operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this is a snapshot-format error (as opposed to a database
    /// or I/O failure).
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            Error::MalformedRecord { .. }
                | Error::UnknownRecordKind { .. }
                | Error::UnsupportedVersion { .. }
                | Error::OutOfOrderRecord { .. }
        )
    }

    /// Check if this is a database-collaborator error.
    pub fn is_database(&self) -> bool {
        matches!(self, Error::Database(_))
    }
}
