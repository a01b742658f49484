//! Snapshot read path.
//!
//! The reader consumes a snapshot line by line and replays it against a
//! database. Parse state is local to one call: whether the version marker
//! has been seen, which collection is current, and the pending batch of
//! documents awaiting insertion. Every ordering invariant of the format is
//! a named, reportable error - never an assertion.
//!
//! Restore is all-or-nothing per invocation in the sense that the first
//! failure aborts it; documents inserted by earlier batches stay in the
//! database (no transactional rollback).

use crate::error::{Error, Result};
use crate::snapshot::writer::DEFAULT_BATCH_SIZE;
use docsnap_core::{Database, Document};
use docsnap_wire::{decode_record, Record, RecordError, SNAPSHOT_VERSION};
use std::io::BufRead;
use tracing::debug;

/// Replays a snapshot stream into a database.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    batch_size: usize,
}

impl SnapshotReader {
    /// Reader with the default insert batch size.
    pub fn new() -> Self {
        SnapshotReader {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the insert batch size (minimum 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Replay an entire snapshot stream into `db`.
    ///
    /// Inserts documents in exactly the order they were encoded, batched
    /// only for throughput. Aborts on the first format, database, or I/O
    /// failure.
    pub fn read_from<D: Database, R: BufRead>(&self, db: &D, source: R) -> Result<()> {
        let mut version_seen = false;
        let mut current: Option<String> = None;
        let mut pending: Vec<Document> = Vec::new();
        let mut line_no: u64 = 0;

        for line in source.lines() {
            let line = line?;
            line_no += 1;
            // Tolerate CRLF sources; the record itself never contains \r
            let line = line.trim_end_matches('\r');

            let record = decode_record(line).map_err(|e| match e {
                RecordError::Malformed(reason) => Error::MalformedRecord {
                    line: line_no,
                    reason,
                },
                RecordError::UnknownKind(kind) => Error::UnknownRecordKind {
                    line: line_no,
                    kind,
                },
            })?;

            match record {
                Record::Version(v) => {
                    if v != SNAPSHOT_VERSION {
                        return Err(Error::UnsupportedVersion {
                            line: line_no,
                            found: v,
                        });
                    }
                    version_seen = true;
                }
                Record::Collection(name) => {
                    if !version_seen {
                        return Err(Error::OutOfOrderRecord {
                            line: line_no,
                            kind: "collection",
                            reason: "no version record seen yet",
                        });
                    }
                    if let Some(prev) = current.take() {
                        flush(db, &prev, &mut pending)?;
                    }
                    debug!(collection = %name, "restoring collection");
                    current = Some(name);
                }
                Record::Index(spec) => {
                    let name = current.as_deref().ok_or(Error::OutOfOrderRecord {
                        line: line_no,
                        kind: "index",
                        reason: "no collection record seen yet",
                    })?;
                    db.create_index(name, &spec.for_replay())?;
                }
                Record::Doc(doc) => {
                    if current.is_none() {
                        return Err(Error::OutOfOrderRecord {
                            line: line_no,
                            kind: "doc",
                            reason: "no collection record seen yet",
                        });
                    }
                    pending.push(doc);
                    if pending.len() == self.batch_size {
                        // current is Some here, checked above
                        if let Some(name) = current.as_deref() {
                            flush(db, name, &mut pending)?;
                        }
                    }
                }
            }
        }

        // Final partial batch of the last collection
        if let Some(name) = current {
            flush(db, &name, &mut pending)?;
        }

        debug!(lines = line_no, "snapshot replayed");
        Ok(())
    }
}

impl Default for SnapshotReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Insert the pending batch, preserving order.
fn flush<D: Database>(db: &D, collection: &str, pending: &mut Vec<Document>) -> Result<()> {
    if pending.is_empty() {
        return Ok(());
    }
    db.insert_documents(collection, std::mem::take(pending))?;
    Ok(())
}
