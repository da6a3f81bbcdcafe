mod common;
use common::*;

use docindex_sled::{query, QueryInput};

/// spec.md §8 invariant 6: full reindex is idempotent.
#[test]
fn index_content_is_idempotent() {
    let (db, dir) = setup();
    std::fs::create_dir_all(dir.path().join("content/posts")).unwrap();
    std::fs::write(dir.path().join("content/posts/a.json"), r#"{"rank":2.0,"category":"news"}"#).unwrap();
    std::fs::write(dir.path().join("content/posts/b.json"), r#"{"rank":10.0,"category":"news"}"#).unwrap();

    db.index_content("{}", "{}").unwrap();
    let mut input = QueryInput::new("posts");
    input.sort = Some("rank");
    let first = query(&db, input).unwrap();
    let first_paths: Vec<_> = first.edges.iter().map(|e| e.path.clone()).collect();

    db.index_content("{}", "{}").unwrap();
    let mut input = QueryInput::new("posts");
    input.sort = Some("rank");
    let second = query(&db, input).unwrap();
    let second_paths: Vec<_> = second.edges.iter().map(|e| e.path.clone()).collect();

    assert_eq!(first_paths, second_paths);
    assert_eq!(first_paths, vec!["content/posts/a.json", "content/posts/b.json"]);
}

/// spec.md §4.4 status callback: inprogress -> complete on success.
#[test]
fn status_callback_reports_inprogress_then_complete() {
    let (db, dir) = setup();
    std::fs::create_dir_all(dir.path().join("content/posts")).unwrap();

    let events = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let recorded = events.clone();
    db.on_status(std::sync::Arc::new(move |event| {
        recorded.lock().unwrap().push(format!("{event:?}"));
    }));

    db.index_content("{}", "{}").unwrap();
    let log = events.lock().unwrap();
    assert_eq!(log.len(), 2);
    assert!(log[0].contains("InProgress"));
    assert!(log[1].contains("Complete"));
}
