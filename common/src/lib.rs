pub mod codec;
pub mod cursor;
pub mod filtering;
pub mod index_spec;
pub mod planner;
pub mod predicate;
pub mod schema;
pub mod value;

pub use codec::{decode_composite_key, encode_composite_key, encode_field, upper_bound, CodecError, DecodedKey, NumberPadding, FILEPATH_KEY};
pub use cursor::{decode_cursor, encode_cursor};
pub use filtering::{evaluate, Filterable};
pub use index_spec::{IndexDefinition, IndexDefinitionBuilder, IndexKeyPart, IndexSpecMatch, IndexTable, DEFAULT_SORT_KEY};
pub use planner::{compile, Bound, CompiledFilter};
pub use predicate::{FilterChain, FilterClause, FilterOp};
pub use schema::{CollectionSchema, CompositeIndexDecl, FieldDef, Schema};
pub use value::{FieldType, Value};
