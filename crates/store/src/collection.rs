//! One collection: insertion-ordered documents plus secondary indexes.

use docsnap_core::{document_id, Document, DocumentId, Error, IndexSpec, Result, Value, ID_FIELD};
use docsnap_wire::encode_value;
use std::collections::HashMap;

/// A named grouping of documents with its secondary indexes.
///
/// Documents keep insertion order so id enumeration is deterministic within
/// one process. Every unique index maintains a map from the canonical
/// encoding of its indexed field values to the owning document id; the
/// canonical encoder is deterministic, so equal keys always collide.
#[derive(Debug, Default)]
pub struct Collection {
    docs: HashMap<DocumentId, Document>,
    order: Vec<DocumentId>,
    indexes: Vec<IndexSpec>,
    unique: HashMap<String, HashMap<String, DocumentId>>,
}

/// Index format version this engine stamps on every index it creates.
/// Incoming versions (e.g. from a snapshot replay) are discarded.
pub const ENGINE_INDEX_VERSION: i64 = 2;

impl Collection {
    /// Number of documents.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the collection holds no documents.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Document ids in insertion order.
    pub fn ids(&self) -> Vec<DocumentId> {
        self.order.clone()
    }

    /// Documents for the given ids, preserving id order, skipping ids that
    /// no longer resolve.
    pub fn fetch(&self, ids: &[DocumentId]) -> Vec<Document> {
        ids.iter()
            .filter_map(|id| self.docs.get(id).cloned())
            .collect()
    }

    /// All documents in insertion order.
    pub fn documents(&self) -> Vec<Document> {
        self.fetch(&self.order)
    }

    /// Fetch one document.
    pub fn get(&self, id: &DocumentId) -> Option<&Document> {
        self.docs.get(id)
    }

    /// The index descriptors, in creation order.
    pub fn indexes(&self) -> Vec<IndexSpec> {
        self.indexes.clone()
    }

    /// Insert one document, assigning a fresh `_id` if it has none.
    pub fn insert(&mut self, name: &str, mut doc: Document) -> Result<DocumentId> {
        let id = match doc.get(ID_FIELD) {
            None => {
                let id = DocumentId::new();
                doc.insert(ID_FIELD.to_string(), Value::Id(id));
                id
            }
            Some(Value::Id(id)) => *id,
            Some(_) => {
                return Err(Error::InvalidId {
                    collection: name.to_string(),
                })
            }
        };

        if self.docs.contains_key(&id) {
            return Err(Error::DuplicateId {
                collection: name.to_string(),
                id: id.to_string(),
            });
        }

        // Check every unique index before touching any state
        let mut staged: Vec<(String, String)> = Vec::new();
        for spec in self.indexes.iter().filter(|s| s.is_unique()) {
            if let Some(key) = index_key(spec, &doc) {
                let index_name = spec.name();
                if self
                    .unique
                    .get(&index_name)
                    .is_some_and(|entries| entries.contains_key(&key))
                {
                    return Err(Error::DuplicateKey {
                        collection: name.to_string(),
                        index: index_name,
                        value: key,
                    });
                }
                staged.push((index_name, key));
            }
        }

        for (index_name, key) in staged {
            self.unique.entry(index_name).or_default().insert(key, id);
        }
        self.docs.insert(id, doc);
        self.order.push(id);
        Ok(id)
    }

    /// Remove one document, unwinding its unique index entries.
    pub fn remove(&mut self, id: &DocumentId) -> Option<Document> {
        let doc = self.docs.remove(id)?;
        self.order.retain(|existing| existing != id);
        for spec in self.indexes.iter().filter(|s| s.is_unique()) {
            if let Some(key) = index_key(spec, &doc) {
                if let Some(entries) = self.unique.get_mut(&spec.name()) {
                    entries.remove(&key);
                }
            }
        }
        Some(doc)
    }

    /// Create an index, backfilling from existing documents.
    ///
    /// Re-creating an index with an identical selector and options is a
    /// no-op; the same name with a different definition is a conflict. A
    /// unique index over data that already violates it fails without
    /// registering the index.
    pub fn create_index(&mut self, name: &str, spec: &IndexSpec) -> Result<()> {
        let index_name = spec.name();

        if let Some(existing) = self.indexes.iter().find(|s| s.name() == index_name) {
            if existing.keys == spec.keys && existing.options == spec.options {
                return Ok(());
            }
            return Err(Error::IndexConflict {
                collection: name.to_string(),
                index: index_name,
            });
        }

        if spec.is_unique() {
            let mut entries: HashMap<String, DocumentId> = HashMap::new();
            for id in &self.order {
                let doc = &self.docs[id];
                if let Some(key) = index_key(spec, doc) {
                    if entries.insert(key.clone(), *id).is_some() {
                        return Err(Error::DuplicateKey {
                            collection: name.to_string(),
                            index: index_name,
                            value: key,
                        });
                    }
                }
            }
            self.unique.insert(index_name, entries);
        }

        let mut stored = spec.for_replay();
        stored.version = Some(ENGINE_INDEX_VERSION);
        self.indexes.push(stored);
        Ok(())
    }
}

/// Canonical uniqueness key of a document under an index, or `None` when a
/// sparse index skips the document (every indexed field missing).
fn index_key(spec: &IndexSpec, doc: &Document) -> Option<String> {
    if spec.is_sparse() && spec.keys.iter().all(|(field, _)| !doc.contains_key(field)) {
        return None;
    }
    let values: Vec<Value> = spec
        .keys
        .iter()
        .map(|(field, _)| doc.get(field).cloned().unwrap_or(Value::Null))
        .collect();
    Some(encode_value(&Value::Array(values)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(field: &str, value: &str) -> Document {
        let mut doc = Document::new();
        doc.insert(field.to_string(), Value::String(value.to_string()));
        doc
    }

    #[test]
    fn test_insert_assigns_id_and_keeps_order() {
        let mut coll = Collection::default();
        let a = coll.insert("c", doc("n", "a")).unwrap();
        let b = coll.insert("c", doc("n", "b")).unwrap();

        assert_eq!(coll.ids(), vec![a, b]);
        assert_eq!(document_id(coll.get(&a).unwrap()), Some(a));
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let mut coll = Collection::default();
        let id = coll.insert("c", doc("n", "a")).unwrap();

        let mut dup = doc("n", "b");
        dup.insert(ID_FIELD.to_string(), Value::Id(id));
        let err = coll.insert("c", dup).unwrap_err();
        assert!(matches!(err, Error::DuplicateId { .. }));
        assert_eq!(coll.len(), 1);
    }

    #[test]
    fn test_insert_rejects_non_id_identifier() {
        let mut coll = Collection::default();
        let mut bad = doc("n", "a");
        bad.insert(ID_FIELD.to_string(), Value::Int(7));
        assert!(matches!(
            coll.insert("c", bad),
            Err(Error::InvalidId { .. })
        ));
    }

    #[test]
    fn test_unique_index_blocks_duplicates() {
        let mut coll = Collection::default();
        coll.create_index("c", &IndexSpec::new(vec![("n".to_string(), 1)]).unique())
            .unwrap();
        coll.insert("c", doc("n", "a")).unwrap();

        let err = coll.insert("c", doc("n", "a")).unwrap_err();
        assert!(err.is_duplicate_key());
        assert_eq!(coll.len(), 1);
    }

    #[test]
    fn test_unique_index_backfill_detects_violation() {
        let mut coll = Collection::default();
        coll.insert("c", doc("n", "a")).unwrap();
        coll.insert("c", doc("n", "a")).unwrap();

        let err = coll
            .create_index("c", &IndexSpec::new(vec![("n".to_string(), 1)]).unique())
            .unwrap_err();
        assert!(err.is_duplicate_key());
        // Failed index must not enforce anything afterwards
        assert!(coll.insert("c", doc("n", "a")).is_ok());
    }

    #[test]
    fn test_recreating_identical_index_is_noop() {
        let mut coll = Collection::default();
        let spec = IndexSpec::new(vec![("n".to_string(), 1)]).unique();
        coll.create_index("c", &spec).unwrap();
        coll.create_index("c", &spec).unwrap();
        assert_eq!(coll.indexes().len(), 1);
    }

    #[test]
    fn test_index_name_conflict() {
        let mut coll = Collection::default();
        let spec = IndexSpec::new(vec![("n".to_string(), 1)]);
        coll.create_index("c", &spec).unwrap();

        let changed = spec.clone().unique();
        assert!(matches!(
            coll.create_index("c", &changed),
            Err(Error::IndexConflict { .. })
        ));
    }

    #[test]
    fn test_sparse_unique_index_skips_missing_fields() {
        let mut coll = Collection::default();
        let spec = IndexSpec::new(vec![("email".to_string(), 1)])
            .unique()
            .with_option("sparse", Value::Bool(true));
        coll.create_index("c", &spec).unwrap();

        // Two documents without the field both pass
        coll.insert("c", doc("n", "a")).unwrap();
        coll.insert("c", doc("n", "b")).unwrap();
        assert_eq!(coll.len(), 2);
    }

    #[test]
    fn test_remove_unwinds_unique_entries() {
        let mut coll = Collection::default();
        coll.create_index("c", &IndexSpec::new(vec![("n".to_string(), 1)]).unique())
            .unwrap();
        let id = coll.insert("c", doc("n", "a")).unwrap();
        coll.remove(&id).unwrap();

        // Value is free again
        assert!(coll.insert("c", doc("n", "a")).is_ok());
    }

    #[test]
    fn test_fetch_skips_missing_ids() {
        let mut coll = Collection::default();
        let a = coll.insert("c", doc("n", "a")).unwrap();
        let ghost = DocumentId::new();

        let docs = coll.fetch(&[a, ghost]);
        assert_eq!(docs.len(), 1);
    }
}
