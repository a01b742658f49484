//! Core types for docsnap.
//!
//! This crate defines the value model shared by the wire codec, the
//! in-memory store, and the snapshot engine:
//!
//! - [`Value`] - the canonical value type, plain JSON plus extended scalars
//! - [`Document`] / [`DocumentId`] - stored documents and their identifiers
//! - [`IndexSpec`] - secondary index descriptors
//! - [`Database`] - the collaborator contract the snapshot engine consumes
//! - [`Error`] - database-collaborator errors

#![warn(missing_docs)]

mod db;
pub mod error;
mod types;
mod value;

pub use db::Database;
pub use error::{Error, Result};
pub use types::{document_id, Document, DocumentId, IndexSpec, ID_FIELD};
pub use value::Value;
