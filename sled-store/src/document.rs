//! Document payload model: a heterogeneous field map carried as
//! `docindex_common::Value`, converted at the schema boundary rather than
//! inside the store (spec.md §9 "Dynamic payloads").

use docindex_common::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reserved payload key the file-format collaborator reshapes the body
/// field under, on markdown-like formats (spec.md §4.4, §9).
pub const BODY_KEY: &str = "$_body";

/// Reserved payload key naming a union-template document's discriminator
/// (spec.md §6).
pub const TEMPLATE_KEY: &str = "_template";

/// A parsed document: field name -> value. Stored verbatim as the primary
/// record's value (bincode-encoded).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Document(pub BTreeMap<String, Value>);

impl Document {
    pub fn new() -> Self { Self(BTreeMap::new()) }

    pub fn get(&self, field: &str) -> Option<&Value> { self.0.get(field) }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) { self.0.insert(field.into(), value); }

    /// Move `$_body` back under `body_field`'s declared name, for markdown-
    /// like formats (spec.md §4.4 `get`, §9 "Body-field reshaping").
    pub fn with_body_unwrapped(mut self, body_field: Option<&str>) -> Self {
        if let Some(field) = body_field {
            if let Some(body) = self.0.remove(BODY_KEY) {
                self.0.insert(field.to_string(), body);
            }
        }
        self
    }

    /// Move a declared body field under `$_body`, for markdown-like formats
    /// (spec.md §4.4 `put`, §9).
    pub fn with_body_wrapped(mut self, body_field: Option<&str>) -> Self {
        if let Some(field) = body_field {
            if let Some(body) = self.0.remove(field) {
                self.0.insert(BODY_KEY.to_string(), body);
            }
        }
        self
    }

    pub fn template(&self) -> Option<&str> {
        match self.0.get(TEMPLATE_KEY) {
            Some(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_wrap_unwrap_roundtrips() {
        let mut doc = Document::new();
        doc.insert("content", Value::String("hello".into()));
        let wrapped = doc.clone().with_body_wrapped(Some("content"));
        assert!(wrapped.get(BODY_KEY).is_some());
        assert!(wrapped.get("content").is_none());
        let unwrapped = wrapped.with_body_unwrapped(Some("content"));
        assert_eq!(unwrapped, doc);
    }
}
