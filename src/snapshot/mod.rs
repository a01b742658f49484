//! Snapshot operations: write, read, erase.
//!
//! The engine is generic over any [`Database`] collaborator and any byte
//! stream; the functions here are the file-backed entry points matching the
//! public contract: each completes or fails as a whole, with no
//! partial-progress reporting and no dry-run mode.

mod reader;
mod writer;

pub use reader::SnapshotReader;
pub use writer::{SnapshotWriter, DEFAULT_BATCH_SIZE, DEFAULT_HIGH_WATER_MARK};

use crate::error::Result;
use docsnap_core::Database;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Write an entire database to a snapshot file at `path`.
///
/// An existing file is truncated first. On failure the file may be left
/// incomplete; callers must treat an aborted write as not a valid snapshot.
pub fn write<D: Database>(db: &D, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    SnapshotWriter::new().write_to(db, file)?;
    info!(path = %path.display(), "snapshot written");
    Ok(())
}

/// Replay a snapshot file at `path` into a database.
///
/// On failure the database may be left partially restored; there is no
/// rollback.
pub fn read<D: Database>(db: &D, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::open(path)?;
    SnapshotReader::new().read_from(db, BufReader::new(file))?;
    info!(path = %path.display(), "snapshot restored");
    Ok(())
}

/// Drop every collection in the database.
///
/// Used to produce a clean target before a restore. The first failed drop
/// aborts the remaining ones and propagates.
pub fn erase<D: Database>(db: &D) -> Result<()> {
    let names = db.collection_names()?;
    for name in &names {
        db.drop_collection(name)?;
    }
    info!(collections = names.len(), "database erased");
    Ok(())
}
