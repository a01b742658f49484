//! Format validation: the reader rejects malformed, unknown, out-of-order,
//! and wrong-version records, and the writer tolerates documents disappearing
//! mid-snapshot.

use docsnap::prelude::*;
use std::io::Cursor;

fn read_str(db: &MemoryDb, input: &str) -> Result<()> {
    SnapshotReader::new().read_from(db, Cursor::new(input.to_string()))
}

fn doc(fields: Vec<(&str, Value)>) -> Document {
    fields
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

// === Version gate ===

#[test]
fn future_version_is_rejected_and_nothing_is_applied() {
    let db = MemoryDb::new();
    let input = concat!(
        "{\"metaType\":\"version\",\"value\":2}\n",
        "{\"metaType\":\"collection\",\"value\":\"c\"}\n",
        "{\"metaType\":\"doc\",\"value\":{\"n\":1}}\n",
    );
    match read_str(&db, input).unwrap_err() {
        Error::UnsupportedVersion { line, found } => {
            assert_eq!(line, 1);
            assert_eq!(found, 2);
        }
        other => panic!("expected UnsupportedVersion, got {:?}", other),
    }
    assert!(db.is_empty());
}

#[test]
fn version_record_must_come_first() {
    let db = MemoryDb::new();
    let input = concat!(
        "{\"metaType\":\"collection\",\"value\":\"c\"}\n",
        "{\"metaType\":\"version\",\"value\":1}\n",
    );
    match read_str(&db, input).unwrap_err() {
        Error::OutOfOrderRecord { line, kind, .. } => {
            assert_eq!(line, 1);
            assert_eq!(kind, "collection");
        }
        other => panic!("expected OutOfOrderRecord, got {:?}", other),
    }
    assert!(db.is_empty());
}

// === Ordering ===

#[test]
fn index_before_any_collection_is_rejected() {
    let db = MemoryDb::new();
    let input = concat!(
        "{\"metaType\":\"version\",\"value\":1}\n",
        "{\"metaType\":\"index\",\"value\":{\"key\":{\"a\":1}}}\n",
    );
    match read_str(&db, input).unwrap_err() {
        Error::OutOfOrderRecord { line, kind, .. } => {
            assert_eq!(line, 2);
            assert_eq!(kind, "index");
        }
        other => panic!("expected OutOfOrderRecord, got {:?}", other),
    }
    assert!(db.is_empty());
}

#[test]
fn doc_before_any_collection_is_rejected() {
    let db = MemoryDb::new();
    let input = concat!(
        "{\"metaType\":\"version\",\"value\":1}\n",
        "{\"metaType\":\"doc\",\"value\":{\"n\":1}}\n",
    );
    match read_str(&db, input).unwrap_err() {
        Error::OutOfOrderRecord { line, kind, .. } => {
            assert_eq!(line, 2);
            assert_eq!(kind, "doc");
        }
        other => panic!("expected OutOfOrderRecord, got {:?}", other),
    }
    assert!(db.is_empty());
}

// === Malformed input ===

#[test]
fn malformed_line_reports_its_line_number() {
    let db = MemoryDb::new();
    let input = concat!(
        "{\"metaType\":\"version\",\"value\":1}\n",
        "{\"metaType\":\"collection\",\"value\":\"c\"}\n",
        "{\"metaType\":\"doc\",\"value\"\n",
    );
    match read_str(&db, input).unwrap_err() {
        Error::MalformedRecord { line, .. } => assert_eq!(line, 3),
        other => panic!("expected MalformedRecord, got {:?}", other),
    }
}

#[test]
fn unknown_record_kind_is_rejected() {
    let db = MemoryDb::new();
    let input = concat!(
        "{\"metaType\":\"version\",\"value\":1}\n",
        "{\"metaType\":\"checkpoint\",\"value\":7}\n",
    );
    match read_str(&db, input).unwrap_err() {
        Error::UnknownRecordKind { line, kind } => {
            assert_eq!(line, 2);
            assert_eq!(kind, "checkpoint");
        }
        other => panic!("expected UnknownRecordKind, got {:?}", other),
    }
}

#[test]
fn format_errors_are_classified() {
    let db = MemoryDb::new();
    let err = read_str(&db, "{\"metaType\":\"version\",\"value\":9}\n").unwrap_err();
    assert!(err.is_format());
    assert!(!err.is_database());
}

// === Skip-on-delete ===

/// Database view that hides one document from [`Database::fetch_documents`],
/// simulating a concurrent delete between id enumeration and batch fetch.
struct DeleteRace<'a> {
    inner: &'a MemoryDb,
    hidden: DocumentId,
}

impl Database for DeleteRace<'_> {
    fn collection_names(&self) -> docsnap_core::Result<Vec<String>> {
        self.inner.collection_names()
    }

    fn list_indexes(&self, collection: &str) -> docsnap_core::Result<Vec<IndexSpec>> {
        self.inner.list_indexes(collection)
    }

    fn document_ids(&self, collection: &str) -> docsnap_core::Result<Vec<DocumentId>> {
        self.inner.document_ids(collection)
    }

    fn fetch_documents(
        &self,
        collection: &str,
        ids: &[DocumentId],
    ) -> docsnap_core::Result<Vec<Document>> {
        let visible: Vec<DocumentId> = ids
            .iter()
            .copied()
            .filter(|id| *id != self.hidden)
            .collect();
        self.inner.fetch_documents(collection, &visible)
    }

    fn insert_documents(
        &self,
        collection: &str,
        docs: Vec<Document>,
    ) -> docsnap_core::Result<()> {
        self.inner.insert_documents(collection, docs)
    }

    fn create_index(&self, collection: &str, spec: &IndexSpec) -> docsnap_core::Result<()> {
        self.inner.create_index(collection, spec)
    }

    fn drop_collection(&self, collection: &str) -> docsnap_core::Result<()> {
        self.inner.drop_collection(collection)
    }
}

#[test]
fn documents_deleted_mid_snapshot_are_skipped_not_fatal() {
    let db = MemoryDb::new();
    let mut ids = Vec::new();
    for i in 0..7 {
        ids.push(db.insert_one("c", doc(vec![("n", Value::Int(i))])).unwrap());
    }

    let racy = DeleteRace {
        inner: &db,
        hidden: ids[3],
    };

    let mut buffer = Vec::new();
    SnapshotWriter::new().write_to(&racy, &mut buffer).unwrap();

    let target = MemoryDb::new();
    SnapshotReader::new()
        .read_from(&target, Cursor::new(buffer))
        .unwrap();

    assert_eq!(target.count("c"), 6);
    let mut ns: Vec<i64> = target
        .documents("c")
        .unwrap()
        .iter()
        .map(|d| d.get("n").and_then(Value::as_int).unwrap())
        .collect();
    ns.sort();
    assert_eq!(ns, vec![0, 1, 2, 4, 5, 6]);
}

// === Database failures during restore ===

#[test]
fn constraint_violation_during_restore_surfaces_the_database_error() {
    // Build a snapshot whose documents collide under a unique index
    let source = MemoryDb::new();
    source
        .insert_one("c", doc(vec![("k", Value::from("same"))]))
        .unwrap();
    source
        .insert_one("c", doc(vec![("k", Value::from("same"))]))
        .unwrap();

    let mut snapshot = String::from("{\"metaType\":\"version\",\"value\":1}\n");
    snapshot.push_str("{\"metaType\":\"collection\",\"value\":\"c\"}\n");
    snapshot.push_str("{\"metaType\":\"index\",\"value\":{\"key\":{\"k\":1},\"unique\":true}}\n");
    let mut buffer = Vec::new();
    SnapshotWriter::new().write_to(&source, &mut buffer).unwrap();
    // Reuse only the doc lines from the real snapshot
    for line in String::from_utf8(buffer).unwrap().lines() {
        if line.contains("\"metaType\":\"doc\"") {
            snapshot.push_str(line);
            snapshot.push('\n');
        }
    }

    let target = MemoryDb::new();
    let err = read_str(&target, &snapshot).unwrap_err();
    assert!(err.is_database());
    match err {
        Error::Database(inner) => assert!(inner.is_duplicate_key()),
        other => panic!("expected Database error, got {:?}", other),
    }
}
