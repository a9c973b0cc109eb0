mod document;
mod encoding;
mod error;
mod filter;
mod flatten;
mod leaf;
mod path;
mod schema;
mod searcher;
mod writer;

pub use document::{Block, BlockEntry, Ordinal, PhysicalDocument, ScalarValue};
pub use encoding::SEGMENT_CF;
pub use error::EngineError;
pub use filter::TopLevelFilter;
pub use flatten::flatten;
pub use leaf::{LeafEvaluator, LeafQuery, PostingsEvaluator};
pub use path::{ResolvedPath, resolve, resolve_nested};
pub use schema::{Mapping, SchemaNode};
pub use searcher::{Scope, Searcher};
pub use writer::{ALL_FIELD, BlockWriter, SegmentStats};
