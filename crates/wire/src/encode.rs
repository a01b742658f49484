//! Canonical encoding of docsnap values
//!
//! Implements encoding of Value to extended-JSON strings with special
//! wrappers:
//! - `$bytes` for binary data (base64)
//! - `$f64` for special floats (NaN, ±Inf, -0.0)
//! - `$date` for datetimes (RFC 3339, UTC)
//! - `$decimal` for arbitrary-precision decimals
//! - `$id` for document identifiers
//!
//! Output is canonical: object keys are emitted in sorted order, so equal
//! values encode to equal strings. Encoded text never contains a raw line
//! break - control characters are escaped - which is what lets one record
//! occupy exactly one line of a snapshot.

use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use docsnap_core::{DocumentId, Value};
use std::collections::HashMap;

/// Encode a Value to its canonical extended-JSON string
pub fn encode_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => encode_float(*f),
        Value::Decimal(d) => encode_decimal(d),
        Value::String(s) => encode_string(s),
        Value::Bytes(b) => encode_bytes(b),
        Value::DateTime(dt) => encode_datetime(dt),
        Value::Id(id) => encode_id(id),
        Value::Array(arr) => encode_array(arr),
        Value::Object(obj) => encode_object(obj),
    }
}

/// Encode a float, using $f64 wrapper for special values
fn encode_float(f: f64) -> String {
    if f.is_nan() {
        r#"{"$f64":"NaN"}"#.to_string()
    } else if f == f64::INFINITY {
        r#"{"$f64":"+Inf"}"#.to_string()
    } else if f == f64::NEG_INFINITY {
        r#"{"$f64":"-Inf"}"#.to_string()
    } else if f.to_bits() == (-0.0_f64).to_bits() {
        r#"{"$f64":"-0.0"}"#.to_string()
    } else {
        format_normal_float(f)
    }
}

/// Format a normal float, ensuring it has a decimal point
fn format_normal_float(f: f64) -> String {
    let s = f.to_string();
    if s.contains('.') || s.contains('e') || s.contains('E') {
        s
    } else {
        format!("{}.0", s)
    }
}

/// Encode a string with proper JSON escaping
pub fn encode_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 2);
    result.push('"');
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result.push('"');
    result
}

/// Encode bytes as $bytes wrapper with base64
fn encode_bytes(bytes: &[u8]) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!(r#"{{"$bytes":"{}"}}"#, b64)
}

/// Encode a datetime as $date wrapper, RFC 3339 with as much sub-second
/// precision as the value carries
fn encode_datetime(dt: &DateTime<Utc>) -> String {
    format!(
        r#"{{"$date":"{}"}}"#,
        dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    )
}

/// Encode a decimal as $decimal wrapper, canonical string form untouched
fn encode_decimal(d: &str) -> String {
    format!(r#"{{"$decimal":{}}}"#, encode_string(d))
}

/// Encode a document identifier as $id wrapper
fn encode_id(id: &DocumentId) -> String {
    format!(r#"{{"$id":"{}"}}"#, id)
}

/// Encode an array
fn encode_array(arr: &[Value]) -> String {
    let elements: Vec<String> = arr.iter().map(encode_value).collect();
    format!("[{}]", elements.join(","))
}

/// Encode an object with deterministic key ordering
pub fn encode_object(obj: &HashMap<String, Value>) -> String {
    // Sort keys for deterministic output
    let mut entries: Vec<_> = obj.iter().collect();
    entries.sort_by_key(|(k, _)| *k);

    let pairs: Vec<String> = entries
        .iter()
        .map(|(k, v)| format!("{}:{}", encode_string(k), encode_value(v)))
        .collect();

    format!("{{{}}}", pairs.join(","))
}
