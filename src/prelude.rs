//! Convenient glob import for docsnap users.
//!
//! ```ignore
//! use docsnap::prelude::*;
//!
//! let db = MemoryDb::new();
//! write(&db, "backup.snapshot")?;
//! ```

pub use crate::{erase, read, write, Error, Result, SnapshotReader, SnapshotWriter};
pub use docsnap_core::{
    document_id, Database, Document, DocumentId, IndexSpec, Value, ID_FIELD,
};
pub use docsnap_store::MemoryDb;
