//! Document store (C4, spec.md §4.4): primary record store plus the
//! write-path that issues consistent put/del batches across the primary
//! sublevel and every secondary index.

use crate::bridge::Bridge;
use crate::document::{Document, BODY_KEY};
use crate::error::{DbError, DbResult};
use crate::index_store::{encode_index_key, BuildStatus, IndexManager};
use docindex_common::{IndexDefinitionBuilder, IndexTable, Schema, Value, DEFAULT_SORT_KEY};
use serde::{Deserialize, Serialize};
use sled::{Batch, Tree};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// One of the three generated config records written by a full reindex
/// (spec.md §6 "Reserved sublevels & keys").
pub const GRAPHQL_CONFIG_PATH: &str = ".tina/__generated__/_graphql.json";
pub const SCHEMA_CONFIG_PATH: &str = ".tina/__generated__/_schema.json";
pub const LOOKUP_CONFIG_PATH: &str = ".tina/__generated__/_lookup.json";

const PRIMARY_SUBLEVEL: &str = "~";

#[derive(Debug, Clone, Serialize, Deserialize)]
enum PrimaryValue {
    Record { collection: Option<String>, doc: Document },
    Config(String),
}

/// Status events emitted by long-running operations (spec.md §4.4).
#[derive(Debug, Clone)]
pub enum StatusEvent {
    InProgress { operation: &'static str },
    Complete { operation: &'static str },
    Failed { operation: &'static str, error: String },
}

pub type StatusCallback = Arc<dyn Fn(StatusEvent) + Send + Sync>;

pub struct Database {
    db: sled::Db,
    primary: Tree,
    indexes: IndexManager,
    bridge: Arc<dyn Bridge>,
    schema: RwLock<Schema>,
    index_table: RwLock<Option<IndexTable>>,
    config: crate::config::DatabaseConfig,
    status_callback: RwLock<Option<StatusCallback>>,
}

impl Database {
    pub fn new(db: sled::Db, bridge: Arc<dyn Bridge>, schema: Schema, config: crate::config::DatabaseConfig) -> DbResult<Self> {
        let primary = db.open_tree(PRIMARY_SUBLEVEL)?;
        Ok(Self {
            indexes: IndexManager::new(db.clone()),
            db,
            primary,
            bridge,
            schema: RwLock::new(schema),
            index_table: RwLock::new(None),
            config,
            status_callback: RwLock::new(None),
        })
    }

    pub fn on_status(&self, callback: StatusCallback) { *self.status_callback.write().unwrap() = Some(callback); }

    fn emit(&self, event: StatusEvent) {
        if let Some(cb) = self.status_callback.read().unwrap().as_ref() {
            cb(event);
        }
    }

    /// Rebuild (if needed) and return the schema-derived index-definition
    /// table (spec.md §4.2). Memoized until `clear_cache`.
    pub fn index_definitions(&self) -> IndexTable {
        if let Some(table) = self.index_table.read().unwrap().as_ref() {
            return table.clone();
        }
        let table = IndexDefinitionBuilder::build(&self.schema.read().unwrap());
        *self.index_table.write().unwrap() = Some(table.clone());
        table
    }

    /// Invalidate the memoized schema/index-definition caches (spec.md §4.2,
    /// §9 "Schema memoization").
    pub fn clear_cache(&self) { *self.index_table.write().unwrap() = None; }

    /// Replace the active schema. Composite indexes are marked `NotBuilt`
    /// since the reloaded schema may have changed their field list; they are
    /// backfilled again the next time a query selects them. Single-column
    /// and default indexes need no such reset — the write path always keeps
    /// them current.
    pub fn set_schema(&self, schema: Schema) {
        let table = IndexDefinitionBuilder::build(&schema);
        for (collection, defs) in &table {
            for def in defs.values() {
                if def.fields.len() > 1 {
                    self.indexes.mark_not_built(&def.sublevel(collection));
                }
            }
        }
        *self.schema.write().unwrap() = schema;
        self.clear_cache();
    }

    fn resolve_collection(&self, path: &str) -> Option<String> {
        self.schema.read().unwrap().collections.iter().find(|c| path.starts_with(&c.root_path)).map(|c| c.name.clone())
    }

    fn body_field(&self, collection: &str) -> Option<String> {
        let schema = self.schema.read().unwrap();
        let coll = schema.collection(collection)?;
        if coll.format != "md" {
            return None;
        }
        coll.fields.iter().find(|f| crate::format::uses_body_reshaping(f.field_type)).map(|f| f.name.clone())
    }

    fn field_value(doc: &Document, field: &str) -> Option<Value> { doc.get(field).cloned() }

    /// Build the put-ops for every defined index of `collection` against
    /// `doc`, keyed by sublevel name.
    fn index_put_ops(&self, collection: &str, path: &str, doc: &Document) -> DbResult<Vec<(String, Vec<u8>)>> {
        let table = self.index_definitions();
        let Some(defs) = table.get(collection) else {
            return Err(DbError::Index(collection.to_string()));
        };
        let mut ops = Vec::with_capacity(defs.len());
        for def in defs.values() {
            let key = encode_index_key(def, path, |f| Self::field_value(doc, f))?;
            ops.push((def.sublevel(collection), key));
        }
        Ok(ops)
    }

    fn annotate(&self, path: &str, collection: Option<&str>, doc: Document) -> Document {
        let body_field = collection.and_then(|c| self.body_field(c));
        let template = doc.get(crate::document::TEMPLATE_KEY).and_then(crate::format::template_segment);
        let mut doc = doc.with_body_unwrapped(body_field.as_deref());
        doc.insert("_relativePath", Value::String(path.to_string()));
        doc.insert("_id", Value::String(path.to_string()));
        if let Some(c) = collection {
            doc.insert("_collection", Value::String(c.to_string()));
        }
        if let Some(t) = template {
            doc.insert("_template", Value::String(t));
        }
        doc
    }

    /// spec.md §4.4 `get`.
    #[tracing::instrument(skip(self))]
    pub fn get(&self, path: &str) -> DbResult<Document> {
        let bytes = self.primary.get(path)?.ok_or_else(|| DbError::NotFound(path.to_string()))?;
        match bincode::deserialize::<PrimaryValue>(&bytes)? {
            PrimaryValue::Record { collection, doc } => Ok(self.annotate(path, collection.as_deref(), doc)),
            PrimaryValue::Config(raw) => {
                let mut doc = Document::new();
                doc.insert(BODY_KEY, Value::String(raw));
                Ok(doc)
            }
        }
    }

    fn existing_record(&self, path: &str) -> DbResult<Option<(Option<String>, Document)>> {
        match self.primary.get(path)? {
            None => Ok(None),
            Some(bytes) => match bincode::deserialize::<PrimaryValue>(&bytes)? {
                PrimaryValue::Record { collection, doc } => Ok(Some((collection, doc))),
                PrimaryValue::Config(_) => Ok(None),
            },
        }
    }

    fn write_document_batch(&self, batch: &mut Batch, path: &str, collection: &str, doc: &Document) -> DbResult<()> {
        if let Some((Some(old_collection), old_doc)) = self.existing_record(path)? {
            for (sublevel, key) in self.index_put_ops(&old_collection, path, &old_doc)? {
                self.indexes.tree(&sublevel)?.remove(&key)?;
            }
        }
        for (sublevel, key) in self.index_put_ops(collection, path, doc)? {
            self.indexes.tree(&sublevel)?.insert(key, &[])?;
        }
        let value = bincode::serialize(&PrimaryValue::Record { collection: Some(collection.to_string()), doc: doc.clone() })?;
        batch.insert(path.as_bytes(), value);
        Ok(())
    }

    /// spec.md §4.4 `put`: collection given explicitly.
    #[tracing::instrument(skip(self, data))]
    pub fn put(&self, path: &str, data: Document, collection: Option<&str>) -> DbResult<()> {
        let collection = match collection {
            Some(c) => c.to_string(),
            None => self.resolve_collection(path).ok_or_else(|| DbError::Index(path.to_string()))?,
        };
        tracing::debug!(path, collection, "writing document");
        let body_field = self.body_field(&collection);
        let wrapped = data.with_body_wrapped(body_field.as_deref());

        let schema = self.schema.read().unwrap();
        let coll_schema = schema.collection(&collection).ok_or_else(|| DbError::Index(collection.clone()))?;
        if crate::format::requires_template(coll_schema) && wrapped.template().is_none() {
            return Err(DbError::Template(path.to_string()));
        }
        let rendered = crate::format::stringify(coll_schema, &wrapped);
        drop(schema);

        let mut batch = Batch::default();
        self.write_document_batch(&mut batch, path, &collection, &wrapped)?;
        self.primary.apply_batch(batch)?;

        self.bridge.put(path, &rendered)?;
        Ok(())
    }

    /// spec.md §4.4 `addPendingDocument`: collection resolved from path.
    pub fn add_pending_document(&self, path: &str, data: Document) -> DbResult<()> { self.put(path, data, None) }

    /// spec.md §4.4 `delete`.
    #[tracing::instrument(skip(self))]
    pub fn delete(&self, path: &str) -> DbResult<()> {
        if let Some((collection, doc)) = self.existing_record(path)? {
            let mut batch = Batch::default();
            if let Some(collection) = &collection {
                for (sublevel, key) in self.index_put_ops(collection, path, &doc)? {
                    self.indexes.tree(&sublevel)?.remove(&key)?;
                }
            }
            batch.remove(path.as_bytes());
            self.primary.apply_batch(batch)?;
        }
        self.bridge.delete(path)?;
        Ok(())
    }

    fn write_config(&self, batch: &mut Batch, path: &str, contents: &str) -> DbResult<()> {
        batch.insert(path.as_bytes(), bincode::serialize(&PrimaryValue::Config(contents.to_string()))?);
        if self.bridge.supports_building() {
            self.bridge.put_config(path, contents)?;
        }
        Ok(())
    }

    /// spec.md §4.4 `indexContent`: full reindex.
    pub fn index_content(&self, graphql: &str, schema_json: &str) -> DbResult<()> {
        self.emit(StatusEvent::InProgress { operation: "indexContent" });
        match self.index_content_inner(graphql, schema_json) {
            Ok(()) => {
                self.emit(StatusEvent::Complete { operation: "indexContent" });
                Ok(())
            }
            Err(err) => {
                self.emit(StatusEvent::Failed { operation: "indexContent", error: err.to_string() });
                Err(err)
            }
        }
    }

    fn index_content_inner(&self, graphql: &str, schema_json: &str) -> DbResult<()> {
        self.db.clear()?;
        self.indexes.clear_all()?;

        let mut batch = Batch::default();
        self.write_config(&mut batch, GRAPHQL_CONFIG_PATH, graphql)?;
        self.write_config(&mut batch, SCHEMA_CONFIG_PATH, schema_json)?;

        let mut lookup: Vec<(String, String)> = Vec::new();
        let collections: Vec<(String, String, String)> =
            self.schema.read().unwrap().collections.iter().map(|c| (c.name.clone(), c.root_path.clone(), c.format.clone())).collect();

        for (name, root_path, format) in &collections {
            for path in self.bridge.glob(root_path, format)? {
                lookup.push((path.clone(), name.clone()));
            }
        }
        let lookup_json = serde_json::to_string(&lookup).unwrap_or_default();
        self.write_config(&mut batch, LOOKUP_CONFIG_PATH, &lookup_json)?;
        self.primary.apply_batch(batch)?;

        let paths: Vec<String> = lookup.into_iter().map(|(p, _)| p).collect();
        self.index_content_by_paths_inner(&paths)
    }

    /// spec.md §4.4 `indexContentByPaths`: partitioned incremental reindex.
    /// Flushes every `batch_flush_threshold` documents (default 25); the
    /// final partial batch is always flushed (spec.md §4.4 "Batching
    /// discipline").
    pub fn index_content_by_paths(&self, paths: &[String]) -> DbResult<()> {
        self.emit(StatusEvent::InProgress { operation: "indexContentByPaths" });
        match self.index_content_by_paths_inner(paths) {
            Ok(()) => {
                self.emit(StatusEvent::Complete { operation: "indexContentByPaths" });
                Ok(())
            }
            Err(err) => {
                self.emit(StatusEvent::Failed { operation: "indexContentByPaths", error: err.to_string() });
                Err(err)
            }
        }
    }

    fn index_content_by_paths_inner(&self, paths: &[String]) -> DbResult<()> {
        let mut batch = Batch::default();
        let mut pending = 0usize;
        for path in paths {
            let Some(collection) = self.resolve_collection(path) else {
                warn!(path, "no collection matches path during reindex, skipping");
                continue;
            };
            let raw = self.bridge.get(path)?;
            let doc = {
                let schema = self.schema.read().unwrap();
                let coll_schema = schema.collection(&collection).ok_or_else(|| DbError::Index(collection.clone()))?;
                crate::format::parse(coll_schema, &raw)
            };
            self.write_document_batch(&mut batch, path, &collection, &doc)?;
            pending += 1;
            if pending >= self.config.batch_flush_threshold {
                self.primary.apply_batch(std::mem::take(&mut batch))?;
                pending = 0;
            }
        }
        if pending > 0 {
            self.primary.apply_batch(batch)?;
        }
        info!(count = paths.len(), "reindexed paths");
        Ok(())
    }

    /// spec.md §4.4 `deleteContentByPaths`.
    pub fn delete_content_by_paths(&self, paths: &[String]) -> DbResult<()> {
        self.emit(StatusEvent::InProgress { operation: "deleteContentByPaths" });
        let result: DbResult<()> = (|| {
            for path in paths {
                self.delete(path)?;
            }
            Ok(())
        })();
        match result {
            Ok(()) => {
                self.emit(StatusEvent::Complete { operation: "deleteContentByPaths" });
                Ok(())
            }
            Err(err) => {
                self.emit(StatusEvent::Failed { operation: "deleteContentByPaths", error: err.to_string() });
                Err(err)
            }
        }
    }

    pub(crate) fn indexes(&self) -> &IndexManager { &self.indexes }

    /// Current backfill state of a collection's sort-key index (supplemented
    /// feature, SPEC_FULL.md). `query()` logs this before triggering a
    /// backfill so a slow first query against a freshly-declared composite
    /// index is visible in traces rather than looking like a stall.
    pub fn index_status(&self, collection: &str, sort_key: &str) -> BuildStatus {
        self.indexes.status(&format!("{collection}/{sort_key}"))
    }

    /// Backfill a composite index lazily the first time a query selects it
    /// (supplemented feature, SPEC_FULL.md; default and single-column
    /// indexes are always kept current by the write path and never need
    /// this).
    pub fn ensure_index_built(&self, collection: &str, sort_key: &str) -> DbResult<()> {
        if sort_key == DEFAULT_SORT_KEY {
            return Ok(());
        }
        let table = self.index_definitions();
        let Some(def) = table.get(collection).and_then(|defs| defs.get(sort_key)) else {
            return Err(DbError::Index(collection.to_string()));
        };
        if def.fields.len() <= 1 {
            return Ok(());
        }
        let sublevel = def.sublevel(collection);
        if self.indexes.status(&sublevel) == BuildStatus::Ready {
            return Ok(());
        }
        self.indexes.set_status(&sublevel, BuildStatus::Building);
        let tree = self.indexes.tree(&sublevel)?;
        for item in self.primary.iter() {
            let (path_bytes, value_bytes) = item?;
            let path = String::from_utf8_lossy(&path_bytes).to_string();
            if let PrimaryValue::Record { collection: Some(doc_collection), doc } = bincode::deserialize(&value_bytes)? {
                if doc_collection == collection {
                    let key = encode_index_key(def, &path, |f| Self::field_value(&doc, f))?;
                    tree.insert(key, &[])?;
                }
            }
        }
        self.indexes.set_status(&sublevel, BuildStatus::Ready);
        Ok(())
    }
}
