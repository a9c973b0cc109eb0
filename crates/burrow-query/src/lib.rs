mod builder;
mod query;

pub use builder::{
    BoolQueryBuilder, bool_query, match_all_query, nested_query, range_query, term_query,
};
pub use query::{BoolQuery, Query, RangeBounds};
