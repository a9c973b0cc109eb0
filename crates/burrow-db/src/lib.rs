mod catalog;
mod config;
mod error;
mod index;
mod result;

pub use bson::{Bson, Document};
pub use burrow_engine::{Mapping, SchemaNode};
pub use burrow_query::Query;
pub use config::IndexConfig;
pub use error::DbError;
pub use index::Index;
pub use result::{
    DeleteResponse, GetResponse, IndexResponse, IndexStatus, SearchHit, SearchResponse,
};
