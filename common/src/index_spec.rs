//! Index-definition builder (C2, spec.md §4.2): project a schema into
//! per-collection `{sortKey -> IndexDefinition}` tables.

use crate::codec::NumberPadding;
use crate::schema::Schema;
use crate::value::FieldType;
use std::collections::HashMap;

/// Name of the always-present, zero-field default index that sorts by
/// primary key alone.
pub const DEFAULT_SORT_KEY: &str = "__filepath__";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexKeyPart {
    pub field: String,
    pub field_type: FieldType,
    pub padding: Option<NumberPadding>,
}

impl IndexKeyPart {
    pub fn new(field: impl Into<String>, field_type: FieldType) -> Self { Self { field: field.into(), field_type, padding: None } }

    pub fn padding(&self) -> NumberPadding { self.padding.unwrap_or_default() }
}

impl std::hash::Hash for NumberPadding {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.width.hash(state);
        (self.fill as u32).hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexDefinition {
    pub sort_key: String,
    pub fields: Vec<IndexKeyPart>,
}

impl IndexDefinition {
    pub fn default_index() -> Self { Self { sort_key: DEFAULT_SORT_KEY.to_string(), fields: vec![] } }

    pub fn single_column(field: &str, field_type: FieldType) -> Self {
        Self { sort_key: field.to_string(), fields: vec![IndexKeyPart::new(field, field_type)] }
    }

    /// Field-name/type pairs for the key codec.
    pub fn codec_fields(&self) -> Vec<(String, FieldType)> { self.fields.iter().map(|f| (f.field.clone(), f.field_type)).collect() }

    /// Returns the sublevel name this index is stored under:
    /// `<collection>/<sortKey>`.
    pub fn sublevel(&self, collection: &str) -> String { format!("{collection}/{}", self.sort_key) }

    /// Checks whether a request for `self`'s field order can be satisfied by
    /// scanning `other` instead — `Yes` if `self` is a field-for-field
    /// prefix of `other` (same names, same types, in order), `No` otherwise
    /// (supplemented planner capability, SPEC_FULL.md, grounded on the
    /// teacher's `IndexSpec::matches`). The teacher's version also returns
    /// `Inverse` when every keypart's declared direction flips together,
    /// since its schema lets an index declare per-field ASC/DESC; this
    /// schema has no such declaration (every field is encoded ascending), so
    /// `Inverse` can never actually be produced here — it stays in the enum
    /// so a future per-field direction addition doesn't need a new match
    /// arm at every call site.
    pub fn matches(&self, other: &IndexDefinition) -> IndexSpecMatch {
        if self.fields.len() > other.fields.len() {
            return IndexSpecMatch::No;
        }
        for (mine, theirs) in self.fields.iter().zip(other.fields.iter()) {
            if mine.field != theirs.field || mine.field_type != theirs.field_type {
                return IndexSpecMatch::No;
            }
        }
        IndexSpecMatch::Yes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexSpecMatch {
    /// The index specs do not match.
    No,
    /// `self` is a field-for-field prefix of `other`.
    Yes,
    /// `self` is a field-for-field prefix of `other` with every direction
    /// flipped; reachable only once per-field direction is tracked.
    Inverse,
}

/// `Map<collectionName, Map<sortKey, IndexDefinition>>`.
pub type IndexTable = HashMap<String, HashMap<String, IndexDefinition>>;

/// Builds the per-collection index-definition table from a schema
/// (spec.md §4.2 steps 1-3).
pub struct IndexDefinitionBuilder;

impl IndexDefinitionBuilder {
    pub fn build(schema: &Schema) -> IndexTable {
        let mut table = IndexTable::new();
        for collection in &schema.collections {
            let mut defs = HashMap::new();
            defs.insert(DEFAULT_SORT_KEY.to_string(), IndexDefinition::default_index());

            for field in &collection.fields {
                if field.is_indexable() {
                    defs.insert(field.name.clone(), IndexDefinition::single_column(&field.name, field.field_type));
                }
            }

            for composite in &collection.composite_indexes {
                let fields: Vec<IndexKeyPart> = composite
                    .fields
                    .iter()
                    .filter_map(|name| collection.field(name).map(|f| IndexKeyPart::new(&f.name, f.field_type)))
                    .collect();
                defs.insert(composite.name.clone(), IndexDefinition { sort_key: composite.name.clone(), fields });
            }

            table.insert(collection.name.clone(), defs);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CollectionSchema, CompositeIndexDecl, FieldDef};

    fn posts_schema() -> Schema {
        Schema {
            collections: vec![CollectionSchema {
                name: "posts".into(),
                root_path: "content/posts".into(),
                format: "md".into(),
                fields: vec![
                    FieldDef::new("rank", FieldType::Number),
                    FieldDef::new("category", FieldType::String),
                    FieldDef::new("title", FieldType::String),
                    FieldDef::new("body", FieldType::RichText),
                ],
                composite_indexes: vec![CompositeIndexDecl { name: "by_category_rank".into(), fields: vec!["category".into(), "rank".into()] }],
                templated: false,
            }],
        }
    }

    #[test]
    fn builds_default_and_single_column_and_composite_indexes() {
        let table = IndexDefinitionBuilder::build(&posts_schema());
        let posts = &table["posts"];
        assert!(posts.contains_key(DEFAULT_SORT_KEY));
        assert!(posts[DEFAULT_SORT_KEY].fields.is_empty());
        assert!(posts.contains_key("rank"));
        assert!(posts.contains_key("category"));
        // rich-text is never indexed
        assert!(!posts.contains_key("body"));
        let composite = &posts["by_category_rank"];
        assert_eq!(composite.fields.len(), 2);
        assert_eq!(composite.fields[0].field, "category");
        assert_eq!(composite.fields[1].field, "rank");
    }

    #[test]
    fn matches_exact_field_list() {
        let a = IndexDefinition {
            sort_key: "by_category_rank".into(),
            fields: vec![IndexKeyPart::new("category", FieldType::String), IndexKeyPart::new("rank", FieldType::Number)],
        };
        let b = a.clone();
        assert_eq!(a.matches(&b), IndexSpecMatch::Yes);
    }

    #[test]
    fn matches_as_prefix_of_wider_index() {
        let requested = IndexDefinition { sort_key: "category".into(), fields: vec![IndexKeyPart::new("category", FieldType::String)] };
        let stored = IndexDefinition {
            sort_key: "by_category_rank".into(),
            fields: vec![IndexKeyPart::new("category", FieldType::String), IndexKeyPart::new("rank", FieldType::Number)],
        };
        assert_eq!(requested.matches(&stored), IndexSpecMatch::Yes);
    }

    #[test]
    fn no_match_on_different_field_order() {
        let requested = IndexDefinition {
            sort_key: "by_rank_category".into(),
            fields: vec![IndexKeyPart::new("rank", FieldType::Number), IndexKeyPart::new("category", FieldType::String)],
        };
        let stored = IndexDefinition {
            sort_key: "by_category_rank".into(),
            fields: vec![IndexKeyPart::new("category", FieldType::String), IndexKeyPart::new("rank", FieldType::Number)],
        };
        assert_eq!(requested.matches(&stored), IndexSpecMatch::No);
    }

    #[test]
    fn no_match_when_longer_than_candidate() {
        let requested = IndexDefinition {
            sort_key: "by_category_rank".into(),
            fields: vec![IndexKeyPart::new("category", FieldType::String), IndexKeyPart::new("rank", FieldType::Number)],
        };
        let stored = IndexDefinition { sort_key: "category".into(), fields: vec![IndexKeyPart::new("category", FieldType::String)] };
        assert_eq!(requested.matches(&stored), IndexSpecMatch::No);
    }
}
