use docindex_common::CodecError;
use thiserror::Error;

/// Error kinds named in spec.md §7, composed onto one top-level error so
/// every public `Database`/query-engine method returns a single `Result`
/// type (mirrors the teacher's per-backend error enum in
/// `storage/sled/src/error.rs`, flattened since this engine has one backend).
#[derive(Debug, Error)]
pub enum DbError {
    #[error("schema error: {0}")]
    Schema(String),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("failed to write/delete document {path} (collection {collection:?}): {source}")]
    Fetch { path: String, collection: Option<String>, #[source] source: Box<DbError> },

    #[error("query error on document {path} (collection {collection}): {source}")]
    Query { path: String, collection: String, #[source] source: Box<dyn std::error::Error + Send + Sync> },

    /// Hydration failure on a path that doesn't name an indexed document —
    /// one of the three generated config records (spec.md §4.5
    /// "Hydration"). Re-raised without the path/collection wrapping that
    /// `Query` adds, since that context wouldn't apply to a config record.
    #[error("hydration failed: {0}")]
    Hydration(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("no index definition for collection {0:?}")]
    Index(String),

    #[error("union-template document {0} is missing its discriminator field")]
    Template(String),

    #[error("key codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("storage engine error: {0}")]
    Storage(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("binary encoding error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cursor decode error: {0}")]
    Cursor(#[from] base64::DecodeError),
}

pub type DbResult<T> = Result<T, DbError>;
