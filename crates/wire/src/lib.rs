//! Wire encoding for docsnap - line-delimited extended JSON
//!
//! This crate implements the snapshot file's textual form. Values encode to
//! canonical extended JSON, with `$`-wrappers for the types plain JSON
//! cannot carry losslessly:
//!
//! - `{"$bytes": "<base64>"}` for binary data
//! - `{"$f64": "NaN|+Inf|-Inf|-0.0"}` for special floats
//! - `{"$date": "<RFC 3339>"}` for datetimes
//! - `{"$decimal": "<string>"}` for arbitrary-precision decimals
//! - `{"$id": "<uuid>"}` for document identifiers
//!
//! On top of the value codec sits the record framing: each snapshot line is
//! `{"metaType": "version|collection|index|doc", "value": ...}`.

#![warn(missing_docs)]

mod decode;
mod encode;
mod record;

pub use decode::{decode_value, parse_object, DecodeError};
pub use encode::{encode_object, encode_string, encode_value};
pub use record::{decode_record, encode_record, Record, RecordError, SNAPSHOT_VERSION};
