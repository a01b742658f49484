//! Decoding of canonical docsnap values
//!
//! Implements decoding of extended-JSON strings to Value, handling the
//! special wrappers:
//! - `$bytes` for binary data (base64)
//! - `$f64` for special floats (NaN, ±Inf, -0.0)
//! - `$date` for datetimes (RFC 3339)
//! - `$decimal` for arbitrary-precision decimals
//! - `$id` for document identifiers
//!
//! A single-key object whose key is a wrapper name but whose payload has the
//! wrong type is NOT a wrapper - it decodes as a plain object.

use base64::Engine;
use chrono::{DateTime, Utc};
use docsnap_core::{DocumentId, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Decode error types
#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    /// Invalid JSON syntax
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// Invalid number format
    #[error("invalid number: {0}")]
    InvalidNumber(String),

    /// Invalid base64 in $bytes wrapper
    #[error("invalid base64: {0}")]
    InvalidBase64(String),

    /// Invalid value in $f64 wrapper
    #[error("invalid $f64 value: {0}")]
    InvalidF64Wrapper(String),

    /// Invalid value in $date wrapper
    #[error("invalid $date value: {0}")]
    InvalidDateWrapper(String),

    /// Invalid value in $id wrapper
    #[error("invalid $id value: {0}")]
    InvalidIdWrapper(String),

    /// Unexpected end of input
    #[error("unexpected end of input")]
    UnexpectedEnd,

    /// Unexpected character
    #[error("unexpected character: {0}")]
    UnexpectedChar(char),
}

/// Decode an extended-JSON string to Value
pub fn decode_value(json: &str) -> Result<Value, DecodeError> {
    let trimmed = json.trim();
    if trimmed.is_empty() {
        return Err(DecodeError::UnexpectedEnd);
    }

    let mut parser = Parser::new(trimmed);
    let value = parser.parse_value()?;
    parser.skip_whitespace();
    if let Some(c) = parser.peek() {
        return Err(DecodeError::UnexpectedChar(c));
    }
    Ok(value)
}

/// Parse a top-level object without wrapper interpretation at the outermost
/// level (nested values still get wrapper treatment). Used by the record
/// framer, whose envelope is itself an object.
pub fn parse_object(json: &str) -> Result<HashMap<String, Value>, DecodeError> {
    let mut parser = Parser::new(json.trim());
    parser.skip_whitespace();
    if parser.peek() != Some('{') {
        return Err(DecodeError::InvalidJson("expected object".to_string()));
    }
    let obj = parser.parse_object_raw()?;
    parser.skip_whitespace();
    if let Some(c) = parser.peek() {
        return Err(DecodeError::UnexpectedChar(c));
    }
    Ok(obj)
}

/// Simple recursive-descent parser
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Parser { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn parse_value(&mut self) -> Result<Value, DecodeError> {
        self.skip_whitespace();

        match self.peek() {
            None => Err(DecodeError::UnexpectedEnd),
            Some('n') => self.parse_literal("null", Value::Null),
            Some('t') => self.parse_literal("true", Value::Bool(true)),
            Some('f') => self.parse_literal("false", Value::Bool(false)),
            Some('"') => self.parse_string().map(Value::String),
            Some('[') => self.parse_array(),
            Some('{') => self.parse_object_or_wrapper(),
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_number(),
            Some(c) => Err(DecodeError::UnexpectedChar(c)),
        }
    }

    fn parse_literal(&mut self, literal: &str, value: Value) -> Result<Value, DecodeError> {
        if self.input[self.pos..].starts_with(literal) {
            self.pos += literal.len();
            Ok(value)
        } else {
            Err(DecodeError::InvalidJson(format!("expected '{}'", literal)))
        }
    }

    fn parse_string(&mut self) -> Result<String, DecodeError> {
        self.advance(); // consume opening quote
        let mut result = String::new();

        loop {
            match self.peek() {
                None => return Err(DecodeError::UnexpectedEnd),
                Some('"') => {
                    self.advance();
                    return Ok(result);
                }
                Some('\\') => {
                    self.advance();
                    match self.peek() {
                        Some('"') => {
                            result.push('"');
                            self.advance();
                        }
                        Some('\\') => {
                            result.push('\\');
                            self.advance();
                        }
                        Some('/') => {
                            result.push('/');
                            self.advance();
                        }
                        Some('n') => {
                            result.push('\n');
                            self.advance();
                        }
                        Some('r') => {
                            result.push('\r');
                            self.advance();
                        }
                        Some('t') => {
                            result.push('\t');
                            self.advance();
                        }
                        Some('b') => {
                            result.push('\x08');
                            self.advance();
                        }
                        Some('f') => {
                            result.push('\x0c');
                            self.advance();
                        }
                        Some('u') => {
                            self.advance();
                            let hex: String = (0..4)
                                .filter_map(|_| {
                                    let c = self.peek()?;
                                    self.advance();
                                    Some(c)
                                })
                                .collect();
                            if hex.len() != 4 {
                                return Err(DecodeError::InvalidJson(
                                    "invalid unicode escape".to_string(),
                                ));
                            }
                            let code = u32::from_str_radix(&hex, 16).map_err(|_| {
                                DecodeError::InvalidJson("invalid unicode escape".to_string())
                            })?;
                            if let Some(c) = char::from_u32(code) {
                                result.push(c);
                            } else {
                                return Err(DecodeError::InvalidJson(
                                    "invalid unicode codepoint".to_string(),
                                ));
                            }
                        }
                        Some(c) => {
                            return Err(DecodeError::InvalidJson(format!(
                                "invalid escape: \\{}",
                                c
                            )))
                        }
                        None => return Err(DecodeError::UnexpectedEnd),
                    }
                }
                Some(c) => {
                    result.push(c);
                    self.advance();
                }
            }
        }
    }

    fn parse_number(&mut self) -> Result<Value, DecodeError> {
        let start = self.pos;

        if self.peek() == Some('-') {
            self.advance();
        }

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        let mut is_float = false;

        if self.peek() == Some('.') {
            is_float = true;
            self.advance();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        if let Some('e' | 'E') = self.peek() {
            is_float = true;
            self.advance();
            if let Some('+' | '-') = self.peek() {
                self.advance();
            }
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        let num_str = &self.input[start..self.pos];

        if is_float {
            num_str
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| DecodeError::InvalidNumber(num_str.to_string()))
        } else if let Ok(i) = num_str.parse::<i64>() {
            Ok(Value::Int(i))
        } else {
            // Fall back to f64 for numbers beyond the i64 range
            num_str
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| DecodeError::InvalidNumber(num_str.to_string()))
        }
    }

    fn parse_array(&mut self) -> Result<Value, DecodeError> {
        self.advance(); // consume '['
        self.skip_whitespace();

        let mut arr = Vec::new();

        if self.peek() == Some(']') {
            self.advance();
            return Ok(Value::Array(arr));
        }

        loop {
            arr.push(self.parse_value()?);
            self.skip_whitespace();

            match self.peek() {
                Some(',') => {
                    self.advance();
                    self.skip_whitespace();
                }
                Some(']') => {
                    self.advance();
                    return Ok(Value::Array(arr));
                }
                Some(c) => return Err(DecodeError::UnexpectedChar(c)),
                None => return Err(DecodeError::UnexpectedEnd),
            }
        }
    }

    fn parse_object_or_wrapper(&mut self) -> Result<Value, DecodeError> {
        let obj = self.parse_object_raw()?;

        // Special wrappers are single-key objects with a $-prefixed key and
        // a string payload; anything else stays a plain object
        if obj.len() == 1 {
            if let Some(Value::String(b64)) = obj.get("$bytes") {
                return decode_bytes_wrapper(b64);
            }
            if let Some(Value::String(f64_str)) = obj.get("$f64") {
                return decode_f64_wrapper(f64_str);
            }
            if let Some(Value::String(date_str)) = obj.get("$date") {
                return decode_date_wrapper(date_str);
            }
            if let Some(Value::String(decimal)) = obj.get("$decimal") {
                return Ok(Value::Decimal(decimal.clone()));
            }
            if let Some(Value::String(id_str)) = obj.get("$id") {
                return decode_id_wrapper(id_str);
            }
        }

        Ok(Value::Object(obj))
    }

    fn parse_object_raw(&mut self) -> Result<HashMap<String, Value>, DecodeError> {
        self.advance(); // consume '{'
        self.skip_whitespace();

        let mut map = HashMap::new();

        if self.peek() == Some('}') {
            self.advance();
            return Ok(map);
        }

        loop {
            self.skip_whitespace();

            if self.peek() != Some('"') {
                return Err(DecodeError::InvalidJson("expected string key".to_string()));
            }
            let key = self.parse_string()?;

            self.skip_whitespace();

            if self.peek() != Some(':') {
                return Err(DecodeError::InvalidJson("expected ':'".to_string()));
            }
            self.advance();

            let value = self.parse_value()?;
            map.insert(key, value);

            self.skip_whitespace();

            match self.peek() {
                Some(',') => {
                    self.advance();
                }
                Some('}') => {
                    self.advance();
                    return Ok(map);
                }
                Some(c) => return Err(DecodeError::UnexpectedChar(c)),
                None => return Err(DecodeError::UnexpectedEnd),
            }
        }
    }
}

/// Decode $bytes wrapper (base64)
fn decode_bytes_wrapper(b64: &str) -> Result<Value, DecodeError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(b64)
        .map_err(|e| DecodeError::InvalidBase64(e.to_string()))?;
    Ok(Value::Bytes(bytes))
}

/// Decode $f64 wrapper (special floats)
fn decode_f64_wrapper(value: &str) -> Result<Value, DecodeError> {
    let f = match value {
        "NaN" => f64::NAN,
        "+Inf" => f64::INFINITY,
        "-Inf" => f64::NEG_INFINITY,
        "-0.0" => -0.0_f64,
        _ => return Err(DecodeError::InvalidF64Wrapper(value.to_string())),
    };
    Ok(Value::Float(f))
}

/// Decode $date wrapper (RFC 3339)
fn decode_date_wrapper(value: &str) -> Result<Value, DecodeError> {
    let dt = DateTime::parse_from_rfc3339(value)
        .map_err(|e| DecodeError::InvalidDateWrapper(format!("{}: {}", value, e)))?;
    Ok(Value::DateTime(dt.with_timezone(&Utc)))
}

/// Decode $id wrapper (UUID)
fn decode_id_wrapper(value: &str) -> Result<Value, DecodeError> {
    let id: DocumentId = value
        .parse()
        .map_err(|_| DecodeError::InvalidIdWrapper(value.to_string()))?;
    Ok(Value::Id(id))
}
