pub mod bridge;
pub mod config;
pub mod database;
pub mod document;
pub mod error;
pub mod format;
pub mod index_store;
pub mod query;

pub use bridge::{Bridge, FsBridge};
pub use config::DatabaseConfig;
pub use database::{Database, StatusCallback, StatusEvent};
pub use document::Document;
pub use error::{DbError, DbResult};
pub use query::{hydrate, query, Edge, HydratedEdge, HydratedResult, PageInfo, QueryInput, QueryResult};
