//! # docsnap
//!
//! Bounded-memory snapshot/restore for document databases.
//!
//! docsnap serializes an entire database - collections, documents, and
//! secondary indexes - into a single ordered, line-delimited file, and
//! reconstructs a database from such a file. Documents flow through in
//! fixed-size batches and encoded records drain through a bounded buffer,
//! so peak memory stays at one batch plus one buffer no matter how large
//! the database is.
//!
//! ## Quick Start
//!
//! ```ignore
//! use docsnap::prelude::*;
//!
//! let db = MemoryDb::new();
//! db.insert_one("docs", my_document)?;
//!
//! // Snapshot the whole database to one file
//! docsnap::write(&db, "backup.snapshot")?;
//!
//! // Reset and restore
//! docsnap::erase(&db)?;
//! docsnap::read(&db, "backup.snapshot")?;
//! ```
//!
//! ## File format
//!
//! UTF-8 text, one extended-JSON record per line, shaped
//! `{"metaType": <kind>, "value": <payload>}`. The first record is always
//! the `version` marker; each `collection` record opens a contiguous run of
//! that collection's `index` and `doc` records. See [`docsnap_wire`] for
//! the value wrappers that keep datetimes, binary data, decimals, and
//! document identifiers lossless.
//!
//! ## Guarantees and non-guarantees
//!
//! A snapshot of a live database is a best-effort point-in-time view:
//! documents deleted mid-write are skipped, not errored. A failed `write`
//! may leave a truncated file; a failed `read` may leave a partial restore.
//! Callers needing atomicity stage to a temporary location themselves.

#![warn(missing_docs)]

mod error;
mod snapshot;

pub mod prelude;

pub use error::{Error, Result};
pub use snapshot::{
    erase, read, write, SnapshotReader, SnapshotWriter, DEFAULT_BATCH_SIZE,
    DEFAULT_HIGH_WATER_MARK,
};

// Re-export the member crates' public surface
pub use docsnap_core::{
    document_id, Database, Document, DocumentId, IndexSpec, Value, ID_FIELD,
};
pub use docsnap_store::MemoryDb;
pub use docsnap_wire::{Record, SNAPSHOT_VERSION};
