mod common;
use common::*;

use docindex_common::{CollectionSchema, FieldDef, FieldType, FilterChain, FilterClause, FilterOp, Schema, Value};
use docindex_sled::{query, Database, DatabaseConfig, FsBridge, QueryInput};
use std::sync::Arc;

fn paths(result: &docindex_sled::QueryResult) -> Vec<String> { result.edges.iter().map(|e| e.path.clone()).collect() }

/// Scenario (a): single-field numeric index, spec.md §8.
#[test]
fn single_field_numeric_index_sorts_and_filters() {
    let (db, _dir) = setup();
    db.put("content/posts/a", post(2.0, "news"), None).unwrap();
    db.put("content/posts/b", post(10.0, "news"), None).unwrap();
    db.put("content/posts/c", post(1.0, "news"), None).unwrap();

    let mut input = QueryInput::new("posts");
    input.sort = Some("rank");
    let result = query(&db, input).unwrap();
    assert_eq!(paths(&result), vec!["content/posts/c", "content/posts/a", "content/posts/b"]);

    let mut filtered = QueryInput::new("posts");
    filtered.sort = Some("rank");
    filtered.filter = FilterChain::new(vec![FilterClause::new("rank", FilterOp::Gte(Value::Number(2.0)))]);
    let result = query(&db, filtered).unwrap();
    assert_eq!(paths(&result), vec!["content/posts/a", "content/posts/b"]);
}

/// Scenario (b): forward pagination, spec.md §8.
#[test]
fn forward_pagination_walks_pages() {
    let (db, _dir) = setup();
    for rank in 1..=10 {
        db.put(&format!("content/posts/p{rank}"), post(rank as f64, "news"), None).unwrap();
    }

    let mut first_page = QueryInput::new("posts");
    first_page.sort = Some("rank");
    first_page.first = Some(3);
    let page1 = query(&db, first_page).unwrap();
    assert_eq!(paths(&page1), vec!["content/posts/p1", "content/posts/p2", "content/posts/p3"]);
    assert!(page1.page_info.has_next_page);

    let mut second_page = QueryInput::new("posts");
    second_page.sort = Some("rank");
    second_page.first = Some(3);
    second_page.after = Some(&page1.page_info.end_cursor);
    let page2 = query(&db, second_page).unwrap();
    assert_eq!(paths(&page2), vec!["content/posts/p4", "content/posts/p5", "content/posts/p6"]);
}

/// Scenario (c): reverse pagination, spec.md §8.
#[test]
fn reverse_pagination_yields_descending_tail() {
    let (db, _dir) = setup();
    for rank in 1..=10 {
        db.put(&format!("content/posts/p{rank}"), post(rank as f64, "news"), None).unwrap();
    }

    let mut input = QueryInput::new("posts");
    input.sort = Some("rank");
    input.last = Some(2);
    let result = query(&db, input).unwrap();
    assert_eq!(paths(&result), vec!["content/posts/p10", "content/posts/p9"]);
    assert!(result.page_info.has_previous_page);
}

/// Scenario (d): residual filter on a composite index, spec.md §8.
#[test]
fn residual_filter_rejects_non_matching_candidates() {
    let (db, _dir) = setup();
    let mut a = post(1.0, "news");
    a.insert("title", Value::String("Alpha".into()));
    let mut b = post(2.0, "news");
    b.insert("title", Value::String("Beta".into()));
    db.put("content/posts/a", a, None).unwrap();
    db.put("content/posts/b", b, None).unwrap();

    let mut input = QueryInput::new("posts");
    input.sort = Some("by_category_rank");
    input.filter = FilterChain::new(vec![
        FilterClause::new("category", FilterOp::Eq(Value::String("news".into()))),
        FilterClause::new("title", FilterOp::StartsWith(Value::String("A".into()))),
    ]);
    let result = query(&db, input).unwrap();
    assert_eq!(paths(&result), vec!["content/posts/a"]);
}

/// Scenario (e): overwrite re-indexes, spec.md §8.
#[test]
fn overwrite_moves_the_single_index_entry() {
    let (db, _dir) = setup();
    db.put("content/posts/a", post(2.0, "news"), None).unwrap();
    db.put("content/posts/a", post(9.0, "news"), None).unwrap();

    let mut input = QueryInput::new("posts");
    input.sort = Some("rank");
    let result = query(&db, input).unwrap();
    assert_eq!(paths(&result), vec!["content/posts/a"]);
    assert_eq!(result.edges[0].cursor, docindex_common::encode_cursor(b"0009\x00content/posts/a"));
}

/// Scenario (f): delete atomicity, spec.md §8.
#[test]
fn delete_removes_every_index_entry_and_the_bridge_file() {
    let (db, dir) = setup();
    db.put("content/posts/a", post(2.0, "news"), None).unwrap();
    assert!(dir.path().join("content/posts/a").exists());

    db.delete("content/posts/a").unwrap();
    assert!(!dir.path().join("content/posts/a").exists());
    assert!(db.get("content/posts/a").is_err());

    let mut by_rank = QueryInput::new("posts");
    by_rank.sort = Some("rank");
    assert!(query(&db, by_rank).unwrap().edges.is_empty());

    let mut by_category = QueryInput::new("posts");
    by_category.sort = Some("by_category_rank");
    assert!(query(&db, by_category).unwrap().edges.is_empty());
}

/// The default sort ("__filepath__", explicit or omitted) must scope to the
/// requesting collection's own sublevel, not leak across every collection in
/// the store (spec.md §4.5 step 3).
#[test]
fn default_sort_does_not_leak_other_collections() {
    let dir = tempfile::tempdir().unwrap();
    let db = sled::Config::new().temporary(true).open().unwrap();
    let bridge = Arc::new(FsBridge::new(dir.path()));
    let schema = Schema {
        collections: vec![
            CollectionSchema {
                name: "posts".into(),
                root_path: "content/posts".into(),
                format: "json".into(),
                fields: vec![FieldDef::new("rank", FieldType::Number)],
                composite_indexes: vec![],
                templated: false,
            },
            CollectionSchema {
                name: "authors".into(),
                root_path: "content/authors".into(),
                format: "json".into(),
                fields: vec![FieldDef::new("rank", FieldType::Number)],
                composite_indexes: vec![],
                templated: false,
            },
        ],
    };
    let database = Database::new(db, bridge, schema, DatabaseConfig::default()).unwrap();
    database.put("content/posts/a", post(1.0, "news"), None).unwrap();
    database.put("content/authors/x", post(2.0, "news"), None).unwrap();

    let result = query(&database, QueryInput::new("posts")).unwrap();
    assert_eq!(paths(&result), vec!["content/posts/a"]);

    let result = query(&database, QueryInput::new("authors")).unwrap();
    assert_eq!(paths(&result), vec!["content/authors/x"]);
}

/// Supplemented planner capability (SPEC_FULL.md): a comma-separated field
/// list that isn't itself a declared sort key reuses a stored composite
/// index whose fields it is a prefix of.
#[test]
fn sort_by_field_list_reuses_prefix_matching_composite_index() {
    let (db, _dir) = setup();
    let mut a = post(1.0, "news");
    a.insert("title", Value::String("Alpha".into()));
    let mut b = post(2.0, "news");
    b.insert("title", Value::String("Beta".into()));
    db.put("content/posts/a", a, None).unwrap();
    db.put("content/posts/b", b, None).unwrap();

    let mut input = QueryInput::new("posts");
    input.sort = Some("category,rank");
    let result = query(&db, input).unwrap();
    assert_eq!(paths(&result), vec!["content/posts/a", "content/posts/b"]);
}

/// spec.md §8 invariant 2: get(put(p, d)) round-trips up to metadata.
#[test]
fn get_after_put_roundtrips_fields() {
    let (db, _dir) = setup();
    db.put("content/posts/a", post(5.0, "tech"), None).unwrap();
    let doc = db.get("content/posts/a").unwrap();
    assert_eq!(doc.get("rank"), Some(&Value::Number(5.0)));
    assert_eq!(doc.get("category"), Some(&Value::String("tech".into())));
    assert_eq!(doc.get("_collection"), Some(&Value::String("posts".into())));
    assert_eq!(doc.get("_relativePath"), Some(&Value::String("content/posts/a".into())));
}
