//! Snapshot write path.
//!
//! The writer walks the database one collection at a time: collection
//! record, index records, then documents. Document identifiers are
//! enumerated up front and fetched in fixed-size batches, so at no point
//! does more than one batch of documents sit in memory. Encoded records are
//! staged into a bounded buffer that drains to the destination whenever it
//! reaches its high-water mark - the destination's absorption rate, not the
//! database's size, governs memory use.

use crate::error::Result;
use docsnap_core::Database;
use docsnap_wire::{encode_record, Record, SNAPSHOT_VERSION};
use std::io::{self, Write};
use tracing::debug;

/// Documents fetched and emitted per batch.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Staged bytes before the writer drains to the destination.
pub const DEFAULT_HIGH_WATER_MARK: usize = 64 * 1024;

/// Streams a database into a snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    batch_size: usize,
    high_water_mark: usize,
}

impl SnapshotWriter {
    /// Writer with default batch size and high-water mark.
    pub fn new() -> Self {
        SnapshotWriter {
            batch_size: DEFAULT_BATCH_SIZE,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
        }
    }

    /// Set the document batch size (minimum 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the staging buffer's high-water mark in bytes (minimum 1).
    pub fn with_high_water_mark(mut self, high_water_mark: usize) -> Self {
        self.high_water_mark = high_water_mark.max(1);
        self
    }

    /// Write an entire database to `dest` as one snapshot stream.
    ///
    /// Aborts on the first database or I/O failure; the destination may be
    /// left truncated and must then be treated as not a valid snapshot.
    /// Documents deleted between id enumeration and fetch are skipped
    /// silently - the snapshot is a best-effort point-in-time view.
    pub fn write_to<D: Database, W: Write>(&self, db: &D, dest: W) -> Result<()> {
        let mut out = BoundedWriter::new(dest, self.high_water_mark);
        out.write_record(&Record::Version(SNAPSHOT_VERSION))?;

        let names = db.collection_names()?;
        debug!(collections = names.len(), "writing snapshot");

        for name in names {
            out.write_record(&Record::Collection(name.clone()))?;

            for spec in db.list_indexes(&name)? {
                out.write_record(&Record::Index(spec))?;
            }

            let ids = db.document_ids(&name)?;
            let mut written = 0usize;
            for chunk in ids.chunks(self.batch_size) {
                let docs = db.fetch_documents(&name, chunk)?;
                if docs.len() < chunk.len() {
                    debug!(
                        collection = %name,
                        requested = chunk.len(),
                        fetched = docs.len(),
                        "documents deleted since id enumeration, skipping"
                    );
                }
                for doc in docs {
                    out.write_record(&Record::Doc(doc))?;
                    written += 1;
                }
            }
            debug!(collection = %name, documents = written, "collection written");
        }

        out.finish()?;
        Ok(())
    }
}

impl Default for SnapshotWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Line writer with a bounded staging buffer.
///
/// Records accumulate in `buf`; once `buf` reaches the high-water mark the
/// writer drains it completely - a blocking flush that waits for the
/// destination to absorb everything staged so far - before accepting the
/// next record. Peak staging is the high-water mark plus one record.
struct BoundedWriter<W: Write> {
    inner: W,
    buf: Vec<u8>,
    high_water_mark: usize,
}

impl<W: Write> BoundedWriter<W> {
    fn new(inner: W, high_water_mark: usize) -> Self {
        BoundedWriter {
            inner,
            buf: Vec::with_capacity(high_water_mark),
            high_water_mark,
        }
    }

    fn write_record(&mut self, record: &Record) -> io::Result<()> {
        self.buf.extend_from_slice(encode_record(record).as_bytes());
        self.buf.push(b'\n');
        if self.buf.len() >= self.high_water_mark {
            self.drain()?;
        }
        Ok(())
    }

    fn drain(&mut self) -> io::Result<()> {
        self.inner.write_all(&self.buf)?;
        self.inner.flush()?;
        self.buf.clear();
        Ok(())
    }

    /// Flush remaining bytes and confirm the destination accepted them.
    fn finish(mut self) -> io::Result<()> {
        self.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsnap_core::{Document, Value};
    use docsnap_store::MemoryDb;

    fn doc(n: i64) -> Document {
        let mut doc = Document::new();
        doc.insert("n".to_string(), Value::Int(n));
        doc
    }

    /// Destination recording the largest single chunk it was handed.
    #[derive(Default)]
    struct MeteringSink {
        bytes: Vec<u8>,
        max_chunk: usize,
        flushes: usize,
    }

    impl Write for &mut MeteringSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.max_chunk = self.max_chunk.max(buf.len());
            self.bytes.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_version_record_is_first_line() {
        let db = MemoryDb::new();
        db.insert_one("c", doc(1)).unwrap();

        let mut out = Vec::new();
        SnapshotWriter::new().write_to(&db, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text.lines().next().unwrap(),
            r#"{"metaType":"version","value":1}"#
        );
    }

    #[test]
    fn test_empty_database_writes_version_only() {
        let db = MemoryDb::new();
        let mut out = Vec::new();
        SnapshotWriter::new().write_to(&db, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn test_staging_never_exceeds_high_water_mark_plus_one_record() {
        let db = MemoryDb::new();
        for i in 0..100 {
            db.insert_one("c", doc(i)).unwrap();
        }

        let high_water_mark = 256;
        let mut sink = MeteringSink::default();
        SnapshotWriter::new()
            .with_high_water_mark(high_water_mark)
            .write_to(&db, &mut sink)
            .unwrap();

        // Longest record here is a doc line, well under 256 bytes
        assert!(sink.max_chunk <= high_water_mark + 256);
        assert!(sink.flushes > 1, "bounded writer should drain repeatedly");
        assert_eq!(
            String::from_utf8(sink.bytes).unwrap().lines().count(),
            102 // version + collection + 100 docs
        );
    }

    #[test]
    fn test_trailing_newline_terminates_last_record() {
        let db = MemoryDb::new();
        db.insert_one("c", doc(1)).unwrap();

        let mut out = Vec::new();
        SnapshotWriter::new().write_to(&db, &mut out).unwrap();
        assert_eq!(out.last(), Some(&b'\n'));
    }
}
