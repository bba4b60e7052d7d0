//! Accumulated query directives.
//!
//! A [`SearchCriteria`] is an immutable value: every method returns a new
//! criteria and leaves the receiver untouched. The condition lists sit behind
//! `Arc`, so deriving a criteria only copies the list it appends to, and
//! siblings derived from a shared parent never see each other's additions.

use crate::clause::OrderTerm;
use crate::condition::{Condition, Query};
use sqlscope_core::Value;
use std::sync::Arc;

/// The directives a session has accumulated for its next statement.
#[derive(Debug, Clone, Default)]
pub struct SearchCriteria {
    where_conditions: Arc<Vec<Condition>>,
    or_conditions: Arc<Vec<Condition>>,
    not_conditions: Arc<Vec<Condition>>,
    having_conditions: Arc<Vec<Condition>>,
    join_conditions: Arc<Vec<Condition>>,
    orders: Arc<Vec<String>>,
    omits: Arc<Vec<String>>,
    select: Option<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    group: Option<String>,
    table_name: Option<String>,
    raw: bool,
    unscoped: bool,
    ignore_order_query: bool,
}

fn appended<T: Clone>(list: &Arc<Vec<T>>, item: T) -> Arc<Vec<T>> {
    let mut list = Arc::clone(list);
    Arc::make_mut(&mut list).push(item);
    list
}

impl SearchCriteria {
    /// Empty criteria: no conditions, no ordering, no limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an AND condition.
    #[must_use]
    pub fn filter(&self, query: impl Into<Query>, args: impl IntoIterator<Item = Value>) -> Self {
        Self {
            where_conditions: appended(&self.where_conditions, Condition::new(query, args)),
            ..self.clone()
        }
    }

    /// Add an OR condition.
    #[must_use]
    pub fn or(&self, query: impl Into<Query>, args: impl IntoIterator<Item = Value>) -> Self {
        Self {
            or_conditions: appended(&self.or_conditions, Condition::new(query, args)),
            ..self.clone()
        }
    }

    /// Add a negated AND condition.
    #[must_use]
    pub fn not(&self, query: impl Into<Query>, args: impl IntoIterator<Item = Value>) -> Self {
        Self {
            not_conditions: appended(&self.not_conditions, Condition::new(query, args)),
            ..self.clone()
        }
    }

    /// Add a HAVING condition.
    #[must_use]
    pub fn having(&self, query: impl Into<Query>, args: impl IntoIterator<Item = Value>) -> Self {
        Self {
            having_conditions: appended(&self.having_conditions, Condition::new(query, args)),
            ..self.clone()
        }
    }

    /// Add a join clause, rendered verbatim apart from its `?` arguments.
    #[must_use]
    pub fn joins(&self, query: impl Into<String>, args: impl IntoIterator<Item = Value>) -> Self {
        Self {
            join_conditions: appended(
                &self.join_conditions,
                Condition::new(query.into(), args),
            ),
            ..self.clone()
        }
    }

    /// Append an ordering term. An empty term changes nothing.
    #[must_use]
    pub fn order(&self, term: impl Into<OrderTerm>) -> Self {
        match term.into().into_sql() {
            Some(sql) => Self {
                orders: appended(&self.orders, sql),
                ..self.clone()
            },
            None => self.clone(),
        }
    }

    /// Drop every ordering term, then append `term` unless it is empty.
    #[must_use]
    pub fn reorder(&self, term: impl Into<OrderTerm>) -> Self {
        Self {
            orders: Arc::new(term.into().into_sql().into_iter().collect()),
            ..self.clone()
        }
    }

    /// Set the column projection.
    #[must_use]
    pub fn select(&self, columns: impl Into<String>) -> Self {
        Self {
            select: Some(columns.into()),
            ..self.clone()
        }
    }

    /// Exclude columns from inserts and updates, replacing any earlier list.
    #[must_use]
    pub fn omit<I, S>(&self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            omits: Arc::new(columns.into_iter().map(Into::into).collect()),
            ..self.clone()
        }
    }

    /// Cap the number of rows.
    #[must_use]
    pub fn limit(&self, limit: u64) -> Self {
        Self {
            limit: Some(limit),
            ..self.clone()
        }
    }

    /// Skip rows before the first one returned.
    #[must_use]
    pub fn offset(&self, offset: u64) -> Self {
        Self {
            offset: Some(offset),
            ..self.clone()
        }
    }

    /// Set the GROUP BY expression.
    #[must_use]
    pub fn group(&self, group: impl Into<String>) -> Self {
        Self {
            group: Some(group.into()),
            ..self.clone()
        }
    }

    /// Override the table name resolved from the model.
    #[must_use]
    pub fn table(&self, name: impl Into<String>) -> Self {
        Self {
            table_name: Some(name.into()),
            ..self.clone()
        }
    }

    /// Mark the first AND condition as a complete raw statement.
    #[must_use]
    pub fn raw(&self, raw: bool) -> Self {
        Self {
            raw,
            ..self.clone()
        }
    }

    /// Include soft-deleted rows; deletes become soft deletes.
    #[must_use]
    pub fn unscoped(&self) -> Self {
        Self {
            unscoped: true,
            ..self.clone()
        }
    }

    /// Leave ORDER BY out of the rendered statement, as counting does.
    #[must_use]
    pub fn ignore_order_query(&self, ignore: bool) -> Self {
        Self {
            ignore_order_query: ignore,
            ..self.clone()
        }
    }

    /// AND conditions, in the order they were added.
    pub fn where_conditions(&self) -> &[Condition] {
        &self.where_conditions
    }

    /// OR conditions, in the order they were added.
    pub fn or_conditions(&self) -> &[Condition] {
        &self.or_conditions
    }

    /// Negated conditions, in the order they were added.
    pub fn not_conditions(&self) -> &[Condition] {
        &self.not_conditions
    }

    /// HAVING conditions, in the order they were added.
    pub fn having_conditions(&self) -> &[Condition] {
        &self.having_conditions
    }

    /// Join clauses, in the order they were added.
    pub fn join_conditions(&self) -> &[Condition] {
        &self.join_conditions
    }

    /// Rendered ordering terms.
    pub fn orders(&self) -> &[String] {
        &self.orders
    }

    /// Fields or columns left out of inserts and updates.
    pub fn omits(&self) -> &[String] {
        &self.omits
    }

    /// Is the named field or column omitted?
    pub fn is_omitted(&self, name: &str) -> bool {
        self.omits.iter().any(|o| o == name)
    }

    /// The column projection, if one was set.
    pub fn select_columns(&self) -> Option<&str> {
        self.select.as_deref()
    }

    /// The row cap, if one was set.
    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    /// The row offset, if one was set.
    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    /// The GROUP BY expression, if one was set.
    pub fn group_by(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// The table override, if one was set.
    pub fn table_name(&self) -> Option<&str> {
        self.table_name.as_deref()
    }

    /// Is the first AND condition a complete statement?
    pub fn is_raw(&self) -> bool {
        self.raw
    }

    /// Are soft-deleted rows included?
    pub fn is_unscoped(&self) -> bool {
        self.unscoped
    }

    /// Is ORDER BY left out of rendering?
    pub fn ignores_order(&self) -> bool {
        self.ignore_order_query
    }

    /// Does the criteria hold any WHERE-level condition?
    pub fn has_conditions(&self) -> bool {
        !(self.where_conditions.is_empty()
            && self.or_conditions.is_empty()
            && self.not_conditions.is_empty())
    }
}
