//! Index key encoding/decoding (C1 in spec.md §4.1).
//!
//! Composite keys are `f1<SEP>f2<SEP>...<SEP>fN<SEP>path`, where the
//! per-field encoding preserves ascending sort order under lexicographic byte
//! comparison. The trailing path guarantees injectivity over
//! `(document-path, index-fields)`.

use crate::value::{FieldType, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Reserved separator between composite key fields. Must not appear inside
/// an encoded field; values that contain it are rejected at encode time
/// rather than escaped (see SPEC_FULL.md Open Question 4).
pub const SEPARATOR: u8 = 0x00;

/// Appended to a prefix to form an exclusive upper bound for "starts-with"
/// range scans.
pub const MAX_BYTE: u8 = 0xFF;

#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    #[error("number padding width {width} is too small for value {value}")]
    NumberTooWide { value: f64, width: usize },
    #[error("negative numbers are not supported by the default number encoder: {0}")]
    NegativeNumber(f64),
    #[error("fractional numbers are not supported by the default number encoder: {0}")]
    NonIntegralNumber(f64),
    #[error("encoded field value contains the reserved separator byte")]
    SeparatorInValue,
    #[error("value {0:?} has no type compatible with field type {1:?}")]
    TypeMismatch(Value, FieldType),
    #[error("malformed composite key")]
    Malformed,
}

/// Padding scheme for the number encoder: left-pad with `fill` to `width`
/// digits. Default is `'0'` x 4, per spec.md §4.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberPadding {
    pub width: usize,
    pub fill: char,
}

impl Default for NumberPadding {
    fn default() -> Self { Self { width: 4, fill: '0' } }
}

impl NumberPadding {
    pub fn new(width: usize, fill: char) -> Self { Self { width, fill } }
}

/// Encode a single typed field value into its sort-preserving byte form.
/// Does not include the separator.
pub fn encode_field(value: &Value, ty: FieldType, padding: NumberPadding) -> Result<Vec<u8>, CodecError> {
    let bytes = match (value, ty) {
        (Value::String(s), FieldType::String) => s.as_bytes().to_vec(),
        (Value::Number(n), FieldType::Number) => encode_number(*n, padding)?.into_bytes(),
        (Value::Bool(b), FieldType::Bool) => (if *b { "1" } else { "0" }).as_bytes().to_vec(),
        (Value::DateTime(d), FieldType::DateTime) => d.as_bytes().to_vec(),
        (Value::Reference(r), FieldType::Reference) => r.as_bytes().to_vec(),
        _ => return Err(CodecError::TypeMismatch(value.clone(), ty)),
    };
    if bytes.contains(&SEPARATOR) {
        return Err(CodecError::SeparatorInValue);
    }
    Ok(bytes)
}

/// Left-pad a non-negative integral number with `fill` to `width` characters
/// so that `"0012" < "0100"` under byte comparison. Negative numbers are
/// rejected; callers needing signed ranges must supply an offset padding
/// scheme of their own (spec.md §4.1, SPEC_FULL.md Open Question 2).
/// Fractional numbers are rejected too: a decimal point doesn't pad against
/// fill characters the same way digits do (`"02.5"` sorts before `"2.25"`
/// even though `2.5 > 2.25`), so the fixed-width scheme can't represent them
/// without breaking numeric order.
pub fn encode_number(n: f64, padding: NumberPadding) -> Result<String, CodecError> {
    if n < 0.0 {
        return Err(CodecError::NegativeNumber(n));
    }
    if !n.is_finite() || n.fract() != 0.0 {
        return Err(CodecError::NonIntegralNumber(n));
    }
    let digits = format!("{}", n as u64);
    if digits.len() > padding.width {
        return Err(CodecError::NumberTooWide { value: n, width: padding.width });
    }
    Ok(format!("{}{}", padding.fill.to_string().repeat(padding.width - digits.len()), digits))
}

/// Encode a composite key: the ordered field values followed by the
/// document path, separator-joined.
pub fn encode_composite_key(fields: &[(Value, FieldType, NumberPadding)], path: &str) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    for (value, ty, padding) in fields {
        out.extend(encode_field(value, *ty, *padding)?);
        out.push(SEPARATOR);
    }
    if path.as_bytes().contains(&SEPARATOR) {
        return Err(CodecError::SeparatorInValue);
    }
    out.extend(path.as_bytes());
    Ok(out)
}

/// Append the exclusive-upper-bound sentinel to a prefix, for "starts-with"
/// range scans.
pub fn upper_bound(mut prefix: Vec<u8>) -> Vec<u8> {
    prefix.push(MAX_BYTE);
    prefix
}

/// Decoded composite key: field name -> textual value, plus the trailing
/// path under the reserved key `_filepath_`.
pub type DecodedKey = BTreeMap<String, String>;

pub const FILEPATH_KEY: &str = "_filepath_";

/// Decode a stored key against an ordered list of `(field name, field type)`.
/// Returns `None` if the key's arity does not match the given field list —
/// callers treat that as "belongs to a different index shape" and skip it
/// (schema evolution, spec.md §4.1).
pub fn decode_composite_key(key: &[u8], fields: &[(String, FieldType)]) -> Option<DecodedKey> {
    // Neither an encoded field value nor a path may contain the separator
    // (both are rejected at encode time), so the number of separator bytes
    // present is exactly the number of fields this key was built with. A
    // mismatch against the requested field list means this key belongs to a
    // different index shape (schema evolution) and must be skipped.
    if key.iter().filter(|b| **b == SEPARATOR).count() != fields.len() {
        return None;
    }
    let mut parts = key.splitn(fields.len() + 1, |b| *b == SEPARATOR);
    let mut decoded = DecodedKey::new();
    for (name, _ty) in fields {
        let part = parts.next()?;
        decoded.insert(name.clone(), String::from_utf8(part.to_vec()).ok()?);
    }
    let path_bytes = parts.next()?.to_vec();
    if path_bytes.is_empty() {
        return None;
    }
    decoded.insert(FILEPATH_KEY.to_string(), String::from_utf8(path_bytes).ok()?);
    Some(decoded)
}
