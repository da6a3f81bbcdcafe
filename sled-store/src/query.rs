//! Query engine (C5, spec.md §4.5): plan an index + range, iterate, apply
//! the residual filter, enforce limits, emit cursor pagination.

use crate::database::Database;
use crate::document::Document;
use crate::error::{DbError, DbResult};
use docindex_common::{
    compile, decode_composite_key, decode_cursor, encode_cursor, evaluate, Bound, FieldType, FilterChain, Filterable, IndexDefinition,
    IndexKeyPart, IndexSpecMatch, Value, DEFAULT_SORT_KEY, FILEPATH_KEY,
};
use std::collections::HashMap;
use std::ops::Bound as StdBound;

pub struct QueryInput<'a> {
    pub collection: &'a str,
    pub sort: Option<&'a str>,
    pub filter: FilterChain,
    pub first: Option<i64>,
    pub last: Option<i64>,
    pub after: Option<&'a str>,
    pub before: Option<&'a str>,
}

impl<'a> QueryInput<'a> {
    pub fn new(collection: &'a str) -> Self {
        Self { collection, sort: None, filter: FilterChain::default(), first: None, last: None, after: None, before: None }
    }
}

pub struct Edge {
    pub path: String,
    pub cursor: String,
}

#[derive(Debug)]
pub struct PageInfo {
    pub has_previous_page: bool,
    pub has_next_page: bool,
    pub start_cursor: String,
    pub end_cursor: String,
}

pub struct QueryResult {
    pub edges: Vec<Edge>,
    pub page_info: PageInfo,
}

struct DecodedSubject<'a> {
    decoded: &'a docindex_common::DecodedKey,
    fields: &'a [(String, FieldType)],
}

impl<'a> Filterable for DecodedSubject<'a> {
    fn field_value(&self, field: &str) -> Option<Value> {
        let ty = self.fields.iter().find(|(name, _)| name == field).map(|(_, t)| *t)?;
        let raw = self.decoded.get(field)?;
        Some(match ty {
            FieldType::String => Value::String(raw.clone()),
            FieldType::Number => Value::Number(raw.trim_start_matches('0').parse().unwrap_or(0.0)),
            FieldType::Bool => Value::Bool(raw == "1"),
            FieldType::DateTime => Value::DateTime(raw.clone()),
            FieldType::Reference => Value::Reference(raw.clone()),
            FieldType::Object | FieldType::RichText => return None,
        })
    }
}

struct DocSubject<'a>(&'a Document);
impl<'a> Filterable for DocSubject<'a> {
    fn field_value(&self, field: &str) -> Option<Value> { self.0.get(field).cloned() }
}

/// All fields referenced by `chain` are among the decoded key's named
/// groups, so no primary-record fetch is needed to evaluate the residual
/// (spec.md §4.5 "Execution").
fn residual_needs_primary_lookup(chain: &FilterChain, fields: &[(String, FieldType)]) -> bool {
    chain.0.iter().any(|clause| !fields.iter().any(|(name, _)| name == &clause.field))
}

/// Resolve a requested sort key against a collection's index-definition
/// table. Tries the literal name first; if that misses and the name is a
/// comma-separated field list (e.g. `"category,rank"`), falls back to the
/// supplemented prefix-match planner capability (SPEC_FULL.md, grounded on
/// the teacher's `IndexSpec::matches`) to find a stored composite index
/// whose fields start with the requested ones.
fn resolve_index<'a>(defs: &'a HashMap<String, IndexDefinition>, sort_key: &str) -> Option<&'a IndexDefinition> {
    if let Some(def) = defs.get(sort_key) {
        return Some(def);
    }
    let names: Vec<&str> = sort_key.split(',').map(str::trim).collect();
    if names.len() < 2 {
        return None;
    }
    let mut requested_fields = Vec::with_capacity(names.len());
    for name in &names {
        let single = defs.get(*name)?;
        if single.fields.len() != 1 {
            return None;
        }
        requested_fields.push(IndexKeyPart::new(*name, single.fields[0].field_type));
    }
    let requested = IndexDefinition { sort_key: sort_key.to_string(), fields: requested_fields };
    defs.values().find(|candidate| requested.matches(candidate) == IndexSpecMatch::Yes)
}

#[tracing::instrument(skip(db, input), fields(collection = input.collection, sort = input.sort))]
pub fn query(db: &Database, input: QueryInput) -> DbResult<QueryResult> {
    let table = db.index_definitions();
    let defs = table.get(input.collection).ok_or_else(|| DbError::Index(input.collection.to_string()))?;
    let sort_key = input.sort.unwrap_or(DEFAULT_SORT_KEY);
    let def = resolve_index(defs, sort_key).ok_or_else(|| DbError::Index(format!("{}/{}", input.collection, sort_key)))?;
    let sort_key = def.sort_key.as_str();

    tracing::debug!(status = ?db.index_status(input.collection, sort_key), "resolved sort index");
    db.ensure_index_built(input.collection, sort_key)?;

    let compiled = compile(&input.filter, def)?;
    let fields = def.codec_fields();
    let needs_primary = residual_needs_primary_lookup(&input.filter, &fields);

    // Every index — including the default `__filepath__` index — has its
    // own dedicated sublevel populated by the write path; the shared primary
    // tree is never scanned directly here, since it holds every collection's
    // records plus the generated config entries.
    let tree = db.indexes().tree(&def.sublevel(input.collection))?;

    let reverse = input.last.is_some();
    let limit = match input.first.or(input.last) {
        Some(-1) => usize::MAX,
        Some(n) if n >= 0 => n as usize,
        _ => 50,
    };

    let lower = match input.after {
        Some(cursor) => StdBound::Excluded(decode_cursor(cursor)?),
        None => match compiled.from {
            Bound::Unbounded => StdBound::Unbounded,
            Bound::Inclusive(b) => StdBound::Included(b),
            Bound::Exclusive(b) => StdBound::Excluded(b),
        },
    };
    let upper = match input.before {
        Some(cursor) => StdBound::Excluded(decode_cursor(cursor)?),
        None => match compiled.to {
            Bound::Unbounded => StdBound::Unbounded,
            Bound::Inclusive(b) => StdBound::Included(b),
            Bound::Exclusive(b) => StdBound::Excluded(b),
        },
    };

    let mut iter = tree.range((lower, upper));
    let mut edges = Vec::new();
    let mut has_more = false;

    let advance = |pair: sled::Result<(sled::IVec, sled::IVec)>| -> DbResult<Option<(Vec<u8>, String)>> {
        let (key, _value) = pair?;
        let key = key.to_vec();
        let Some(decoded) = decode_composite_key(&key, &fields) else { return Ok(None) };
        let Some(path) = decoded.get(FILEPATH_KEY).cloned() else { return Ok(None) };

        let matched = if needs_primary {
            let doc = db.get(&path)?;
            evaluate(&compiled.residual, &DocSubject(&doc))
        } else {
            evaluate(&compiled.residual, &DecodedSubject { decoded: &decoded, fields: &fields })
        };
        if !matched {
            return Ok(None);
        }
        Ok(Some((key, path)))
    };

    if reverse {
        for pair in iter.by_ref().rev() {
            if edges.len() >= limit {
                has_more = true;
                break;
            }
            if let Some((key, path)) = advance(pair)? {
                edges.push(Edge { path, cursor: encode_cursor(&key) });
            }
        }
    } else {
        for pair in iter.by_ref() {
            if edges.len() >= limit {
                has_more = true;
                break;
            }
            if let Some((key, path)) = advance(pair)? {
                edges.push(Edge { path, cursor: encode_cursor(&key) });
            }
        }
    }

    let start_cursor = edges.first().map(|e| e.cursor.clone()).unwrap_or_default();
    let end_cursor = edges.last().map(|e| e.cursor.clone()).unwrap_or_default();

    Ok(QueryResult {
        edges,
        page_info: PageInfo {
            has_previous_page: reverse && has_more,
            has_next_page: !reverse && has_more,
            start_cursor,
            end_cursor,
        },
    })
}

/// An edge whose document has been loaded through a caller-supplied
/// hydrator, per spec.md §4.5 "Hydration".
#[derive(Debug)]
pub struct HydratedEdge<T> {
    pub node: T,
    pub cursor: String,
}

#[derive(Debug)]
pub struct HydratedResult<T> {
    pub edges: Vec<HydratedEdge<T>>,
    pub page_info: PageInfo,
}

fn is_generated_config_path(path: &str) -> bool {
    path == crate::database::GRAPHQL_CONFIG_PATH
        || path == crate::database::SCHEMA_CONFIG_PATH
        || path == crate::database::LOOKUP_CONFIG_PATH
}

/// Hydration (spec.md §4.5): map every edge's path through `hydrator`,
/// producing the caller's node type. A hydrator failure is wrapped as
/// `DbError::Query` with the path and collection attached, except for the
/// three generated config paths, which aren't documents the caller indexed
/// and so re-raise unadorned.
pub fn hydrate<T>(
    result: QueryResult,
    collection: &str,
    hydrator: impl Fn(&str) -> Result<T, Box<dyn std::error::Error + Send + Sync>>,
) -> DbResult<HydratedResult<T>> {
    let mut edges = Vec::with_capacity(result.edges.len());
    for edge in result.edges {
        match hydrator(&edge.path) {
            Ok(node) => edges.push(HydratedEdge { node, cursor: edge.cursor }),
            Err(source) if is_generated_config_path(&edge.path) => return Err(DbError::Hydration(source)),
            Err(source) => return Err(DbError::Query { path: edge.path, collection: collection.to_string(), source }),
        }
    }
    Ok(HydratedResult { edges, page_info: result.page_info })
}

#[cfg(test)]
mod hydrate_tests {
    use super::*;

    fn sample_result(path: &str) -> QueryResult {
        QueryResult {
            edges: vec![Edge { path: path.to_string(), cursor: "c1".into() }],
            page_info: PageInfo { has_previous_page: false, has_next_page: false, start_cursor: "c1".into(), end_cursor: "c1".into() },
        }
    }

    #[test]
    fn hydrate_maps_edges_through_loader() {
        let hydrated = hydrate(sample_result("posts/a.md"), "posts", |path| Ok(format!("node:{path}"))).unwrap();
        assert_eq!(hydrated.edges[0].node, "node:posts/a.md");
    }

    #[test]
    fn hydrate_wraps_failure_with_path_and_collection() {
        let result = hydrate::<()>(sample_result("posts/missing.md"), "posts", |_| Err("boom".into()));
        match result {
            Err(DbError::Query { path, collection, .. }) => {
                assert_eq!(path, "posts/missing.md");
                assert_eq!(collection, "posts");
            }
            other => panic!("expected Query error, got {other:?}"),
        }
    }

    #[test]
    fn hydrate_reraises_unadorned_for_generated_config_paths() {
        let result = hydrate::<()>(sample_result(crate::database::SCHEMA_CONFIG_PATH), "posts", |_| Err("boom".into()));
        assert!(matches!(result, Err(DbError::Hydration(_))));
    }
}
