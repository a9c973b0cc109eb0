use bson::Bson;

use crate::query::{BoolQuery, Query, RangeBounds};

pub fn match_all_query() -> Query {
    Query::MatchAll
}

pub fn term_query(field: impl Into<String>, value: impl Into<Bson>) -> Query {
    Query::Term {
        field: field.into(),
        value: value.into(),
    }
}

pub fn range_query(field: impl Into<String>, bounds: RangeBounds) -> Query {
    Query::Range {
        field: field.into(),
        bounds,
    }
}

pub fn nested_query(path: impl Into<String>, query: Query) -> Query {
    Query::Nested {
        path: path.into(),
        query: Box::new(query),
    }
}

pub fn bool_query() -> BoolQueryBuilder {
    BoolQueryBuilder::default()
}

#[derive(Debug, Default)]
pub struct BoolQueryBuilder {
    inner: BoolQuery,
}

impl BoolQueryBuilder {
    pub fn must(mut self, query: Query) -> Self {
        self.inner.must.push(query);
        self
    }

    pub fn should(mut self, query: Query) -> Self {
        self.inner.should.push(query);
        self
    }

    pub fn must_not(mut self, query: Query) -> Self {
        self.inner.must_not.push(query);
        self
    }

    pub fn build(self) -> Query {
        Query::Bool(self.inner)
    }
}

impl From<BoolQueryBuilder> for Query {
    fn from(builder: BoolQueryBuilder) -> Self {
        builder.build()
    }
}

impl RangeBounds {
    pub fn gt(mut self, value: impl Into<Bson>) -> Self {
        self.gt = Some(value.into());
        self
    }

    pub fn gte(mut self, value: impl Into<Bson>) -> Self {
        self.gte = Some(value.into());
        self
    }

    pub fn lt(mut self, value: impl Into<Bson>) -> Self {
        self.lt = Some(value.into());
        self
    }

    pub fn lte(mut self, value: impl Into<Bson>) -> Self {
        self.lte = Some(value.into());
        self
    }
}
