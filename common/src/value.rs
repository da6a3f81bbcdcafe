use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A document field value, carried as a tagged union rather than converted
/// to its index-key bytes until it reaches the codec. See DESIGN.md: payloads
/// are heterogeneous maps and the typed boundary lives at the schema, not
/// inside the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    String(String),
    Number(f64),
    Bool(bool),
    /// ISO-8601 textual form, already lexicographically sortable.
    DateTime(String),
    /// Path of the referenced document.
    Reference(String),
    List(Vec<Value>),
    Map(Vec<(String, Value)>),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    String,
    Number,
    Bool,
    DateTime,
    Reference,
    Object,
    RichText,
}

impl FieldType {
    /// object and rich-text fields are never indexed, per spec.md §3.
    pub fn is_indexable(&self) -> bool { !matches!(self, FieldType::Object | FieldType::RichText) }
}

impl Value {
    pub fn type_of(&self) -> Option<FieldType> {
        match self {
            Value::String(_) => Some(FieldType::String),
            Value::Number(_) => Some(FieldType::Number),
            Value::Bool(_) => Some(FieldType::Bool),
            Value::DateTime(_) => Some(FieldType::DateTime),
            Value::Reference(_) => Some(FieldType::Reference),
            Value::List(_) | Value::Map(_) => Some(FieldType::Object),
            Value::Null => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::DateTime(d) => write!(f, "{d}"),
            Value::Reference(r) => write!(f, "{r}"),
            Value::List(_) | Value::Map(_) => write!(f, "<object>"),
            Value::Null => write!(f, "null"),
        }
    }
}
