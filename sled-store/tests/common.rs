use docindex_common::{CollectionSchema, FieldDef, FieldType, Schema};
use docindex_sled::{Database, DatabaseConfig, Document, FsBridge};
use std::sync::Arc;

#[allow(unused)]
pub fn posts_schema() -> Schema {
    Schema {
        collections: vec![CollectionSchema {
            name: "posts".into(),
            root_path: "content/posts".into(),
            format: "json".into(),
            fields: vec![FieldDef::new("rank", FieldType::Number), FieldDef::new("category", FieldType::String)],
            composite_indexes: vec![docindex_common::CompositeIndexDecl { name: "by_category_rank".into(), fields: vec!["category".into(), "rank".into()] }],
            templated: false,
        }],
    }
}

#[allow(unused)]
pub fn setup() -> (Database, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = sled::Config::new().temporary(true).open().unwrap();
    let bridge = Arc::new(FsBridge::new(dir.path()));
    let database = Database::new(db, bridge, posts_schema(), DatabaseConfig::default()).unwrap();
    (database, dir)
}

#[allow(unused)]
pub fn post(rank: f64, category: &str) -> Document {
    let mut doc = Document::new();
    doc.insert("rank", docindex_common::Value::Number(rank));
    doc.insert("category", docindex_common::Value::String(category.to_string()));
    doc
}
