//! In-memory document database for docsnap.
//!
//! [`MemoryDb`] implements the [`Database`] collaborator contract: named
//! collections of documents with secondary indexes, uniqueness enforcement
//! included. It is the reference target for snapshot round-trips and a
//! usable store in its own right for tests and tooling.
//!
//! ## Thread Safety
//!
//! `MemoryDb` is `Send + Sync`; the collection map lives behind a
//! `parking_lot::RwLock`. Each operation takes the lock once, so a batch
//! insert is atomic with respect to other callers, but the fail-fast
//! contract still holds: documents earlier in a failed batch stay inserted.

#![warn(missing_docs)]

mod collection;

pub use collection::ENGINE_INDEX_VERSION;

use collection::Collection;
use docsnap_core::{Database, Document, DocumentId, Error, IndexSpec, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use tracing::debug;

/// In-memory document database.
#[derive(Debug, Default)]
pub struct MemoryDb {
    collections: RwLock<BTreeMap<String, Collection>>,
}

impl MemoryDb {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one document, returning its (possibly freshly assigned) id.
    pub fn insert_one(&self, collection: &str, doc: Document) -> Result<DocumentId> {
        let mut collections = self.collections.write();
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(collection, doc)
    }

    /// Remove one document by id.
    pub fn remove_document(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>> {
        let mut collections = self.collections.write();
        let coll = collections
            .get_mut(collection)
            .ok_or_else(|| Error::UnknownCollection(collection.to_string()))?;
        Ok(coll.remove(id))
    }

    /// All documents of a collection, insertion order.
    pub fn documents(&self, collection: &str) -> Result<Vec<Document>> {
        let collections = self.collections.read();
        let coll = collections
            .get(collection)
            .ok_or_else(|| Error::UnknownCollection(collection.to_string()))?;
        Ok(coll.documents())
    }

    /// Number of documents in a collection; zero if it does not exist.
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, Collection::len)
    }

    /// Whether the database holds no collections at all.
    pub fn is_empty(&self) -> bool {
        self.collections.read().is_empty()
    }
}

impl Database for MemoryDb {
    fn collection_names(&self) -> Result<Vec<String>> {
        Ok(self.collections.read().keys().cloned().collect())
    }

    fn list_indexes(&self, collection: &str) -> Result<Vec<IndexSpec>> {
        let collections = self.collections.read();
        let coll = collections
            .get(collection)
            .ok_or_else(|| Error::UnknownCollection(collection.to_string()))?;
        Ok(coll.indexes())
    }

    fn document_ids(&self, collection: &str) -> Result<Vec<DocumentId>> {
        let collections = self.collections.read();
        let coll = collections
            .get(collection)
            .ok_or_else(|| Error::UnknownCollection(collection.to_string()))?;
        Ok(coll.ids())
    }

    fn fetch_documents(&self, collection: &str, ids: &[DocumentId]) -> Result<Vec<Document>> {
        let collections = self.collections.read();
        let coll = collections
            .get(collection)
            .ok_or_else(|| Error::UnknownCollection(collection.to_string()))?;
        Ok(coll.fetch(ids))
    }

    fn insert_documents(&self, collection: &str, docs: Vec<Document>) -> Result<()> {
        let mut collections = self.collections.write();
        let coll = collections.entry(collection.to_string()).or_default();
        // Fail fast: earlier documents of the batch stay inserted
        for doc in docs {
            coll.insert(collection, doc)?;
        }
        Ok(())
    }

    fn create_index(&self, collection: &str, spec: &IndexSpec) -> Result<()> {
        debug!(collection, index = %spec.name(), "creating index");
        let mut collections = self.collections.write();
        let coll = collections.entry(collection.to_string()).or_default();
        coll.create_index(collection, spec)
    }

    fn drop_collection(&self, collection: &str) -> Result<()> {
        debug!(collection, "dropping collection");
        let mut collections = self.collections.write();
        collections
            .remove(collection)
            .map(|_| ())
            .ok_or_else(|| Error::UnknownCollection(collection.to_string()))
    }
}
