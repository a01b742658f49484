//! Database collaborator contract.
//!
//! The snapshot engine never talks to a concrete database. It talks to this
//! trait: enumerate collections, enumerate indexes and document ids, fetch
//! and insert documents in batches, create indexes, drop collections. Any
//! store implementing these seven operations can be snapshotted and
//! restored.

use crate::error::Result;
use crate::types::{Document, DocumentId, IndexSpec};

/// Contract a document database exposes to the snapshot engine.
///
/// Enumeration order of [`collection_names`](Database::collection_names) and
/// [`document_ids`](Database::document_ids) need not be stable across
/// invocations, but must be internally consistent within one call.
pub trait Database {
    /// List every collection name.
    fn collection_names(&self) -> Result<Vec<String>>;

    /// List the index descriptors of one collection.
    fn list_indexes(&self, collection: &str) -> Result<Vec<IndexSpec>>;

    /// Enumerate the identifiers of every document currently in the
    /// collection.
    fn document_ids(&self, collection: &str) -> Result<Vec<DocumentId>>;

    /// Fetch documents by identifier, preserving the order of `ids`.
    ///
    /// Identifiers that no longer resolve (deleted since enumeration) are
    /// silently skipped, not an error. The result may therefore be shorter
    /// than `ids`.
    fn fetch_documents(&self, collection: &str, ids: &[DocumentId]) -> Result<Vec<Document>>;

    /// Insert a batch of documents in order, creating the collection if it
    /// does not exist.
    ///
    /// Fails fast: on a constraint violation, documents earlier in the
    /// batch stay inserted and the error propagates.
    fn insert_documents(&self, collection: &str, docs: Vec<Document>) -> Result<()>;

    /// Create one index, creating the collection if it does not exist.
    fn create_index(&self, collection: &str, spec: &IndexSpec) -> Result<()>;

    /// Drop one collection and everything in it.
    fn drop_collection(&self, collection: &str) -> Result<()>;
}
