//! Index-tree management: open/cache the sled `Tree` for each
//! `(collection, sortKey)` sublevel and derive the put/del ops a document
//! mutation must issue across every defined index (spec.md §4.4, §6).
//!
//! Grounded on the teacher's `storage/sled/src/index.rs` `IndexManager`,
//! simplified since index definitions here are derived lazily from the
//! schema rather than persisted/created on demand.

use crate::error::DbResult;
use docindex_common::{encode_composite_key, CodecError, IndexDefinition, Value};
use sled::{Db, Tree};
use std::collections::HashMap;
use std::sync::RwLock;

/// Backfill status for a composite index, per spec.md §9's supplemented
/// lazy-build behaviour (SPEC_FULL.md). Single-column and default indexes
/// are always `Ready`; composite indexes start `NotBuilt` and are backfilled
/// the first time a query selects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    NotBuilt,
    Building,
    Ready,
}

pub struct IndexManager {
    db: Db,
    trees: RwLock<HashMap<String, Tree>>,
    status: RwLock<HashMap<String, BuildStatus>>,
}

impl IndexManager {
    pub fn new(db: Db) -> Self { Self { db, trees: RwLock::new(HashMap::new()), status: RwLock::new(HashMap::new()) } }

    pub fn tree(&self, sublevel: &str) -> DbResult<Tree> {
        if let Some(tree) = self.trees.read().unwrap().get(sublevel) {
            return Ok(tree.clone());
        }
        let tree = self.db.open_tree(sublevel)?;
        self.trees.write().unwrap().insert(sublevel.to_string(), tree.clone());
        Ok(tree)
    }

    pub fn status(&self, sublevel: &str) -> BuildStatus { *self.status.read().unwrap().get(sublevel).unwrap_or(&BuildStatus::Ready) }

    pub fn mark_not_built(&self, sublevel: &str) { self.status.write().unwrap().insert(sublevel.to_string(), BuildStatus::NotBuilt); }

    pub fn set_status(&self, sublevel: &str, status: BuildStatus) { self.status.write().unwrap().insert(sublevel.to_string(), status); }

    /// Drop every opened index tree (used by a full reindex's `clear`).
    pub fn clear_all(&self) -> DbResult<()> {
        let names: Vec<String> = self.trees.read().unwrap().keys().cloned().collect();
        for name in names {
            self.db.drop_tree(name.as_bytes())?;
        }
        self.trees.write().unwrap().clear();
        self.status.write().unwrap().clear();
        Ok(())
    }
}

/// The value a field encodes as when a document doesn't populate it, so the
/// document still sorts deterministically rather than being silently
/// excluded from the index. Must match `part.field_type` or `encode_field`
/// rejects it as a type mismatch.
fn missing_value(field_type: docindex_common::FieldType) -> Value {
    use docindex_common::FieldType;
    match field_type {
        FieldType::String => Value::String(String::new()),
        FieldType::Number => Value::Number(0.0),
        FieldType::Bool => Value::Bool(false),
        FieldType::DateTime => Value::DateTime(String::new()),
        FieldType::Reference => Value::Reference(String::new()),
        FieldType::Object | FieldType::RichText => Value::String(String::new()),
    }
}

/// Encode the composite key for `path` under `index`, reading field values
/// out of a document-field lookup closure. Missing fields encode as a
/// type-appropriate default (see `missing_value`) rather than being silently
/// excluded from the index.
pub fn encode_index_key(index: &IndexDefinition, path: &str, field_value: impl Fn(&str) -> Option<Value>) -> Result<Vec<u8>, CodecError> {
    let fields: Vec<(Value, _, _)> = index
        .fields
        .iter()
        .map(|part| (field_value(&part.field).unwrap_or_else(|| missing_value(part.field_type)), part.field_type, part.padding()))
        .collect();
    encode_composite_key(&fields, path)
}
