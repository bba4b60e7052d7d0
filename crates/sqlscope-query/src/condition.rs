//! Condition values accepted by `filter`, `or`, `not`, `having` and `joins`.

use crate::search::SearchCriteria;
use sqlscope_core::Value;

/// The query part of a condition.
///
/// What a condition means is only decided when it is rendered against a
/// table, so nothing here is validated up front.
#[derive(Debug, Clone)]
pub enum Query {
    /// SQL text with `?` markers for the positional arguments.
    ///
    /// A text made only of digits is shorthand for a primary key match.
    Text(String),
    /// Column/value pairs, each rendered as an equality test.
    Map(Vec<(String, Value)>),
    /// A nested criteria whose conditions render as one parenthesized group.
    Group(SearchCriteria),
}

impl Query {
    /// Build an equality map from column/value pairs.
    pub fn map<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Query::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Is this an empty text or an empty map?
    pub fn is_empty(&self) -> bool {
        match self {
            Query::Text(text) => text.trim().is_empty(),
            Query::Map(pairs) => pairs.is_empty(),
            Query::Group(criteria) => !criteria.has_conditions(),
        }
    }
}

impl From<&str> for Query {
    fn from(text: &str) -> Self {
        Query::Text(text.to_string())
    }
}

impl From<String> for Query {
    fn from(text: String) -> Self {
        Query::Text(text)
    }
}

impl From<&String> for Query {
    fn from(text: &String) -> Self {
        Query::Text(text.clone())
    }
}

impl From<i64> for Query {
    fn from(id: i64) -> Self {
        Query::Text(id.to_string())
    }
}

impl From<Vec<(String, Value)>> for Query {
    fn from(pairs: Vec<(String, Value)>) -> Self {
        Query::Map(pairs)
    }
}

impl From<Vec<(&str, Value)>> for Query {
    fn from(pairs: Vec<(&str, Value)>) -> Self {
        Query::map(pairs)
    }
}

impl<const N: usize> From<[(&str, Value); N]> for Query {
    fn from(pairs: [(&str, Value); N]) -> Self {
        Query::map(pairs)
    }
}

impl From<SearchCriteria> for Query {
    fn from(criteria: SearchCriteria) -> Self {
        Query::Group(criteria)
    }
}

/// One condition group: a query plus its positional arguments.
#[derive(Debug, Clone)]
pub struct Condition {
    pub query: Query,
    pub args: Vec<Value>,
}

impl Condition {
    pub fn new(query: impl Into<Query>, args: impl IntoIterator<Item = Value>) -> Self {
        Self {
            query: query.into(),
            args: args.into_iter().collect(),
        }
    }
}
