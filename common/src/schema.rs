//! User-declared schema: collections, fields, and named composite indexes.
//! This is the validated, enriched input the engine consumes (spec.md §1) —
//! it does not parse schema source files itself.

use crate::value::FieldType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
    /// Defaults to true; object and rich-text fields are never indexed
    /// regardless of this flag (spec.md §3).
    pub indexed: bool,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self { Self { name: name.into(), field_type, indexed: true } }

    pub fn not_indexed(mut self) -> Self {
        self.indexed = false;
        self
    }

    pub fn is_indexable(&self) -> bool { self.indexed && self.field_type.is_indexable() }
}

/// A user-declared composite index: a name and an ordered list of field
/// names resolved against the collection's field definitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeIndexDecl {
    pub name: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub name: String,
    pub root_path: String,
    /// File format tag, e.g. "md", "json".
    pub format: String,
    pub fields: Vec<FieldDef>,
    pub composite_indexes: Vec<CompositeIndexDecl>,
    /// Whether documents in this collection are a union of named templates,
    /// requiring a `_template` discriminator field (spec.md §6, §7
    /// `TemplateError`). Defaults to false via `#[serde(default)]` so
    /// existing schema documents don't need updating.
    #[serde(default)]
    pub templated: bool,
}

impl CollectionSchema {
    pub fn field(&self, name: &str) -> Option<&FieldDef> { self.fields.iter().find(|f| f.name == name) }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    pub collections: Vec<CollectionSchema>,
}

impl Schema {
    pub fn collection(&self, name: &str) -> Option<&CollectionSchema> { self.collections.iter().find(|c| c.name == name) }
}
