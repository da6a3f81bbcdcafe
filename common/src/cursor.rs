//! Opaque cursor encoding over a raw sort key (spec.md §4.5). Keys are
//! meaningless to clients; base64 is the default reversible textual scheme.

use base64::{engine::general_purpose::STANDARD, Engine as _};

pub fn encode_cursor(key: &[u8]) -> String { STANDARD.encode(key) }

pub fn decode_cursor(cursor: &str) -> Result<Vec<u8>, base64::DecodeError> { STANDARD.decode(cursor) }
