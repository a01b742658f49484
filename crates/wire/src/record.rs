//! Snapshot record framing
//!
//! A snapshot file is a flat stream of records, one per line, each shaped
//! `{"metaType": <kind>, "value": <payload>}`. Four kinds exist:
//!
//! - `version` - integer format version, always the first record
//! - `collection` - collection name; opens a contiguous run of records
//! - `index` - index descriptor: `key` selector, `v` engine version,
//!   remaining options passed through unchanged
//! - `doc` - one full document, identifier included
//!
//! Framing errors are fatal for the enclosing operation: a line that is not
//! a valid record leaves the stream position meaningless for replay.

use crate::decode::parse_object;
use crate::encode::{encode_object, encode_string, encode_value};
use docsnap_core::{Document, IndexSpec, Value};
use std::collections::HashMap;
use thiserror::Error;

/// The snapshot format version this crate reads and writes.
pub const SNAPSHOT_VERSION: i64 = 1;

/// One record of a snapshot stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Format version marker, first record of every snapshot
    Version(i64),
    /// Start of a collection's contiguous record run
    Collection(String),
    /// One index descriptor of the current collection
    Index(IndexSpec),
    /// One document of the current collection
    Doc(Document),
}

impl Record {
    /// The record's kind tag as written to the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Record::Version(_) => "version",
            Record::Collection(_) => "collection",
            Record::Index(_) => "index",
            Record::Doc(_) => "doc",
        }
    }
}

/// Record framing errors.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    /// The line is not a valid encoded record.
    #[error("malformed record: {0}")]
    Malformed(String),

    /// The record's metaType is not one of the four recognized kinds.
    #[error("unknown record kind: {0}")]
    UnknownKind(String),
}

/// Encode a record to its single-line wire form (no trailing line break).
pub fn encode_record(record: &Record) -> String {
    match record {
        Record::Version(v) => {
            format!(r#"{{"metaType":"version","value":{}}}"#, v)
        }
        Record::Collection(name) => {
            format!(
                r#"{{"metaType":"collection","value":{}}}"#,
                encode_string(name)
            )
        }
        Record::Index(spec) => {
            format!(r#"{{"metaType":"index","value":{}}}"#, encode_index(spec))
        }
        Record::Doc(doc) => {
            format!(r#"{{"metaType":"doc","value":{}}}"#, encode_object(doc))
        }
    }
}

/// Decode one line into a record.
pub fn decode_record(line: &str) -> Result<Record, RecordError> {
    let envelope =
        parse_object(line).map_err(|e| RecordError::Malformed(e.to_string()))?;

    let kind = match envelope.get("metaType") {
        Some(Value::String(s)) => s.as_str(),
        Some(other) => {
            return Err(RecordError::Malformed(format!(
                "metaType must be a string, got {}",
                other.type_name()
            )))
        }
        None => return Err(RecordError::Malformed("missing metaType".to_string())),
    };

    let value = envelope
        .get("value")
        .ok_or_else(|| RecordError::Malformed("missing value".to_string()))?;

    match kind {
        "version" => match value {
            Value::Int(v) => Ok(Record::Version(*v)),
            other => Err(RecordError::Malformed(format!(
                "version value must be an integer, got {}",
                other.type_name()
            ))),
        },
        "collection" => match value {
            Value::String(name) => Ok(Record::Collection(name.clone())),
            other => Err(RecordError::Malformed(format!(
                "collection value must be a string, got {}",
                other.type_name()
            ))),
        },
        "index" => decode_index(value).map(Record::Index),
        "doc" => match value {
            Value::Object(doc) => Ok(Record::Doc(doc.clone())),
            other => Err(RecordError::Malformed(format!(
                "doc value must be an object, got {}",
                other.type_name()
            ))),
        },
        other => Err(RecordError::UnknownKind(other.to_string())),
    }
}

/// Encode an index descriptor: `key` selector first, then `v`, then the
/// pass-through options in sorted order.
fn encode_index(spec: &IndexSpec) -> String {
    let selector: Vec<String> = spec
        .keys
        .iter()
        .map(|(field, dir)| format!("{}:{}", encode_string(field), dir))
        .collect();

    let mut parts = vec![format!(r#""key":{{{}}}"#, selector.join(","))];
    if let Some(v) = spec.version {
        parts.push(format!(r#""v":{}"#, v));
    }

    let mut options: Vec<_> = spec.options.iter().collect();
    options.sort_by_key(|(k, _)| *k);
    for (name, value) in options {
        parts.push(format!("{}:{}", encode_string(name), encode_value(value)));
    }

    format!("{{{}}}", parts.join(","))
}

/// Decode an index descriptor from its wire object.
fn decode_index(value: &Value) -> Result<IndexSpec, RecordError> {
    let obj = value
        .as_object()
        .ok_or_else(|| RecordError::Malformed("index value must be an object".to_string()))?;

    let selector = match obj.get("key") {
        Some(Value::Object(sel)) => sel,
        Some(other) => {
            return Err(RecordError::Malformed(format!(
                "index key selector must be an object, got {}",
                other.type_name()
            )))
        }
        None => {
            return Err(RecordError::Malformed(
                "index descriptor missing key selector".to_string(),
            ))
        }
    };

    let mut keys = Vec::with_capacity(selector.len());
    for (field, dir) in selector {
        match dir {
            Value::Int(d) => keys.push((field.clone(), *d)),
            other => {
                return Err(RecordError::Malformed(format!(
                    "index direction for {:?} must be an integer, got {}",
                    field,
                    other.type_name()
                )))
            }
        }
    }
    keys.sort_by(|a, b| a.0.cmp(&b.0));

    let version = match obj.get("v") {
        Some(Value::Int(v)) => Some(*v),
        Some(other) => {
            return Err(RecordError::Malformed(format!(
                "index version must be an integer, got {}",
                other.type_name()
            )))
        }
        None => None,
    };

    let options: HashMap<String, Value> = obj
        .iter()
        .filter(|(name, _)| name.as_str() != "key" && name.as_str() != "v")
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    Ok(IndexSpec {
        keys,
        options,
        version,
    })
}
