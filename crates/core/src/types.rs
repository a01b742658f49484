//! Document and index types
//!
//! A document is a string-keyed map of [`Value`]s whose primary identifier
//! lives in the reserved `_id` field. An [`IndexSpec`] describes one
//! secondary index: a field selector, pass-through options, and the
//! engine-assigned index version that a snapshot carries but never replays.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Reserved field holding a document's primary identifier.
pub const ID_FIELD: &str = "_id";

/// Unique identifier for a document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        DocumentId(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        DocumentId(uuid)
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(DocumentId(Uuid::parse_str(s)?))
    }
}

/// A stored document: field name to value, identifier included under
/// [`ID_FIELD`].
pub type Document = HashMap<String, Value>;

/// Extract a document's identifier, if present and well-typed.
pub fn document_id(doc: &Document) -> Option<DocumentId> {
    match doc.get(ID_FIELD) {
        Some(Value::Id(id)) => Some(*id),
        _ => None,
    }
}

/// Descriptor for one secondary index.
///
/// `keys` is the field selector in canonical (sorted-by-field) order, each
/// entry a field name and a direction (`1` ascending, `-1` descending).
/// `options` carries every other index option unchanged - uniqueness,
/// sparsity, a custom name, whatever the source database attached.
/// `version` is the engine-assigned index format version: a snapshot
/// preserves it verbatim, but replay always strips it because the target
/// engine assigns its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Field selector, canonical sorted-by-field order
    pub keys: Vec<(String, i64)>,
    /// Pass-through options (unique, sparse, name, ...)
    pub options: HashMap<String, Value>,
    /// Engine-assigned index version, stripped on replay
    pub version: Option<i64>,
}

impl IndexSpec {
    /// Build a spec from a field selector. Keys are normalized to canonical
    /// sorted order.
    pub fn new(keys: Vec<(String, i64)>) -> Self {
        let mut keys = keys;
        keys.sort_by(|a, b| a.0.cmp(&b.0));
        IndexSpec {
            keys,
            options: HashMap::new(),
            version: None,
        }
    }

    /// Attach one pass-through option.
    pub fn with_option(mut self, name: impl Into<String>, value: Value) -> Self {
        self.options.insert(name.into(), value);
        self
    }

    /// Mark the index unique.
    pub fn unique(mut self) -> Self {
        self.options
            .insert("unique".to_string(), Value::Bool(true));
        self
    }

    /// Whether this index enforces uniqueness.
    pub fn is_unique(&self) -> bool {
        matches!(self.options.get("unique"), Some(Value::Bool(true)))
    }

    /// Whether this index skips documents missing every indexed field.
    pub fn is_sparse(&self) -> bool {
        matches!(self.options.get("sparse"), Some(Value::Bool(true)))
    }

    /// The explicit index name, if one was set in the options.
    pub fn explicit_name(&self) -> Option<&str> {
        match self.options.get("name") {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// The index name: the explicit one, or the conventional
    /// `field_direction` form derived from the selector (e.g. `tull_1`).
    pub fn name(&self) -> String {
        if let Some(name) = self.explicit_name() {
            return name.to_string();
        }
        self.keys
            .iter()
            .map(|(field, dir)| format!("{}_{}", field, dir))
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Copy of this spec with the engine version stripped, as replayed into
    /// a target database.
    pub fn for_replay(&self) -> IndexSpec {
        IndexSpec {
            keys: self.keys.clone(),
            options: self.options.clone(),
            version: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_display_parse_round_trip() {
        let id = DocumentId::new();
        let parsed: DocumentId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_document_id_extraction() {
        let id = DocumentId::new();
        let mut doc = Document::new();
        doc.insert(ID_FIELD.to_string(), Value::Id(id));
        assert_eq!(document_id(&doc), Some(id));

        doc.insert(ID_FIELD.to_string(), Value::Int(7));
        assert_eq!(document_id(&doc), None);
    }

    #[test]
    fn test_index_spec_canonical_key_order() {
        let spec = IndexSpec::new(vec![("b".to_string(), 1), ("a".to_string(), -1)]);
        assert_eq!(
            spec.keys,
            vec![("a".to_string(), -1), ("b".to_string(), 1)]
        );
    }

    #[test]
    fn test_index_spec_derived_name() {
        let spec = IndexSpec::new(vec![("tull".to_string(), 1)]);
        assert_eq!(spec.name(), "tull_1");

        let named = spec.with_option("name", Value::String("custom".to_string()));
        assert_eq!(named.name(), "custom");
    }

    #[test]
    fn test_index_spec_unique_and_sparse_flags() {
        let spec = IndexSpec::new(vec![("f".to_string(), 1)]).unique();
        assert!(spec.is_unique());
        assert!(!spec.is_sparse());
    }

    #[test]
    fn test_for_replay_strips_version() {
        let mut spec = IndexSpec::new(vec![("f".to_string(), 1)]).unique();
        spec.version = Some(2);

        let replayed = spec.for_replay();
        assert_eq!(replayed.version, None);
        assert_eq!(replayed.keys, spec.keys);
        assert_eq!(replayed.options, spec.options);
    }
}
