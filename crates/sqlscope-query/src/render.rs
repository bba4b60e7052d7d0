//! SQL rendering of a [`SearchCriteria`] against one table.
//!
//! The renderer owns nothing but a borrow of the bound-variable list. Every
//! argument it writes into the SQL text is appended to that list and replaced
//! by the dialect's placeholder for its position, so the text and the list
//! always agree.

use crate::condition::{Condition, Query};
use crate::search::SearchCriteria;
use regex::Regex;
use sqlscope_core::{Dialect, Value};
use std::sync::OnceLock;

/// Matches a text condition that is only a number: a primary key lookup.
fn numeric_key() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\s*\d+\s*$").ok())
        .as_ref()
}

/// Append a clause to a statement, separated by a space. Empty clauses are skipped.
pub fn append_clause(sql: &mut String, clause: &str) {
    if clause.is_empty() {
        return;
    }
    if !sql.is_empty() {
        sql.push(' ');
    }
    sql.push_str(clause);
}

/// Renders criteria into SQL fragments, binding arguments as it goes.
pub struct Renderer<'a> {
    dialect: Dialect,
    table: String,
    key_column: Option<String>,
    key_value: Option<Value>,
    soft_delete_column: Option<String>,
    vars: &'a mut Vec<Value>,
}

impl<'a> Renderer<'a> {
    /// Create a renderer for `table` (unquoted) writing arguments into `vars`.
    pub fn new(dialect: Dialect, table: &str, vars: &'a mut Vec<Value>) -> Self {
        Self {
            dialect,
            table: quote_path(dialect, table),
            key_column: None,
            key_value: None,
            soft_delete_column: None,
            vars,
        }
    }

    /// Primary key column of the table, and the key value of the record being
    /// operated on. A non-blank value becomes a primary condition.
    #[must_use]
    pub fn primary_key(mut self, column: Option<&str>, value: Option<Value>) -> Self {
        self.key_column = column.map(str::to_string);
        self.key_value = value;
        self
    }

    /// Soft-delete column; rows where it is set are hidden unless unscoped.
    #[must_use]
    pub fn soft_delete(mut self, column: Option<&str>) -> Self {
        self.soft_delete_column = column.map(str::to_string);
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The quoted table name.
    pub fn quoted_table(&self) -> &str {
        &self.table
    }

    /// Quote an identifier; dotted paths are quoted part by part.
    pub fn quote(&self, name: &str) -> String {
        quote_path(self.dialect, name)
    }

    /// A column qualified with the table name, unless already qualified.
    pub fn column(&self, name: &str) -> String {
        if name.contains('.') {
            self.quote(name)
        } else {
            format!("{}.{}", self.table, self.dialect.quote_identifier(name))
        }
    }

    /// Bind a value and return its placeholder.
    pub fn add_var(&mut self, value: Value) -> String {
        self.vars.push(value);
        self.dialect.placeholder(self.vars.len())
    }

    /// Bind a value; arrays expand to a parenthesized placeholder list.
    fn bind(&mut self, value: Value) -> String {
        match value {
            Value::Array(items) if items.is_empty() => "(NULL)".to_string(),
            Value::Array(items) => {
                let placeholders: Vec<String> =
                    items.into_iter().map(|item| self.add_var(item)).collect();
                format!("({})", placeholders.join(","))
            }
            other => self.add_var(other),
        }
    }

    /// Replace each `?` outside single-quoted literals with the next argument.
    ///
    /// Markers without an argument are left as they are.
    fn bind_text(&mut self, text: &str, args: &[Value]) -> String {
        let mut out = String::with_capacity(text.len() + args.len() * 2);
        let mut args = args.iter();
        let mut quoted = false;
        for ch in text.chars() {
            match ch {
                '\'' => {
                    quoted = !quoted;
                    out.push(ch);
                }
                '?' if !quoted => match args.next() {
                    Some(arg) => {
                        let placeholder = self.bind(arg.clone());
                        out.push_str(&placeholder);
                    }
                    None => {
                        tracing::warn!(condition = text, "placeholder without an argument");
                        out.push(ch);
                    }
                },
                _ => out.push(ch),
            }
        }
        let unused = args.count();
        if unused > 0 {
            tracing::debug!(condition = text, unused, "extra condition arguments ignored");
        }
        out
    }

    fn map_term(&mut self, key: &str, value: &Value, include: bool) -> String {
        let column = self.column(key);
        match value {
            Value::Null if include => format!("({column} IS NULL)"),
            Value::Null => format!("({column} IS NOT NULL)"),
            Value::Array(_) => {
                let list = self.bind(value.clone());
                let op = if include { "IN" } else { "NOT IN" };
                format!("({column} {op} {list})")
            }
            _ => {
                let placeholder = self.add_var(value.clone());
                let op = if include { "=" } else { "<>" };
                format!("({column} {op} {placeholder})")
            }
        }
    }

    /// Render one condition, or `None` when it contributes nothing.
    fn condition(&mut self, condition: &Condition, include: bool) -> Option<String> {
        match &condition.query {
            Query::Text(text) if text.trim().is_empty() => None,
            Query::Text(text) => {
                let is_key = numeric_key().is_some_and(|re| re.is_match(text));
                if let (true, Some(key)) = (is_key, self.key_column.clone()) {
                    let id = text.trim();
                    let value = id
                        .parse::<i64>()
                        .map_or_else(|_| Value::Text(id.to_string()), Value::BigInt);
                    return Some(self.map_term(&key, &value, include));
                }
                let body = self.bind_text(text, &condition.args);
                Some(if include {
                    format!("({body})")
                } else {
                    format!("NOT ({body})")
                })
            }
            Query::Map(pairs) if pairs.is_empty() => None,
            Query::Map(pairs) => {
                let terms: Vec<String> = pairs
                    .iter()
                    .map(|(key, value)| self.map_term(key, value, include))
                    .collect();
                Some(terms.join(" AND "))
            }
            Query::Group(criteria) => {
                let inner = self.conditions(criteria);
                if inner.is_empty() {
                    None
                } else if include {
                    Some(format!("({inner})"))
                } else {
                    Some(format!("NOT ({inner})"))
                }
            }
        }
    }

    /// AND/NOT conditions joined with AND, then OR conditions.
    fn conditions(&mut self, search: &SearchCriteria) -> String {
        let mut and_parts = Vec::new();
        for condition in search.where_conditions() {
            and_parts.extend(self.condition(condition, true));
        }
        for condition in search.not_conditions() {
            and_parts.extend(self.condition(condition, false));
        }
        let mut or_parts = Vec::new();
        for condition in search.or_conditions() {
            or_parts.extend(self.condition(condition, true));
        }

        let and_sql = and_parts.join(" AND ");
        let or_sql = or_parts.join(" OR ");
        match (and_sql.is_empty(), or_sql.is_empty()) {
            (_, true) => and_sql,
            (true, false) => or_sql,
            (false, false) => format!("{and_sql} OR {or_sql}"),
        }
    }

    /// The WHERE clause, or an empty string.
    pub fn where_sql(&mut self, search: &SearchCriteria) -> String {
        let mut primary = Vec::new();
        if let (Some(column), Some(value)) = (self.key_column.clone(), self.key_value.clone()) {
            if !value.is_blank() {
                let column = self.column(&column);
                let placeholder = self.add_var(value);
                primary.push(format!("({column} = {placeholder})"));
            }
        }
        if let Some(column) = self.soft_delete_column.clone() {
            if !search.is_unscoped() {
                primary.push(format!("{} IS NULL", self.column(&column)));
            }
        }
        let primary_sql = primary.join(" AND ");
        let combined = self.conditions(search);

        match (primary_sql.is_empty(), combined.is_empty()) {
            (true, true) => String::new(),
            (false, true) => format!("WHERE {primary_sql}"),
            (true, false) => format!("WHERE {combined}"),
            (false, false) => format!("WHERE {primary_sql} AND ({combined})"),
        }
    }

    pub fn joins_sql(&mut self, search: &SearchCriteria) -> String {
        let mut parts = Vec::new();
        for join in search.join_conditions() {
            if let Query::Text(text) = &join.query {
                if !text.trim().is_empty() {
                    parts.push(self.bind_text(text, &join.args));
                }
            }
        }
        parts.join(" ")
    }

    pub fn group_sql(&self, search: &SearchCriteria) -> String {
        match search.group_by() {
            Some(group) if !group.trim().is_empty() => format!("GROUP BY {group}"),
            _ => String::new(),
        }
    }

    pub fn having_sql(&mut self, search: &SearchCriteria) -> String {
        let mut parts = Vec::new();
        for condition in search.having_conditions() {
            parts.extend(self.condition(condition, true));
        }
        if parts.is_empty() {
            String::new()
        } else {
            format!("HAVING {}", parts.join(" AND "))
        }
    }

    pub fn order_sql(&self, search: &SearchCriteria) -> String {
        if search.ignores_order() || search.orders().is_empty() {
            String::new()
        } else {
            format!("ORDER BY {}", search.orders().join(", "))
        }
    }

    pub fn limit_offset_sql(&self, search: &SearchCriteria) -> String {
        match (search.limit_value(), search.offset_value()) {
            (None, None) => String::new(),
            (Some(limit), None) => format!("LIMIT {limit}"),
            (Some(limit), Some(offset)) => format!("LIMIT {limit} OFFSET {offset}"),
            (None, Some(offset)) => match self.dialect {
                Dialect::Postgres => format!("OFFSET {offset}"),
                Dialect::Sqlite => format!("LIMIT -1 OFFSET {offset}"),
                Dialect::Mysql => format!("LIMIT 18446744073709551615 OFFSET {offset}"),
            },
        }
    }

    /// Joins, WHERE, GROUP BY, HAVING, ORDER BY and LIMIT/OFFSET, in order.
    pub fn combined_sql(&mut self, search: &SearchCriteria) -> String {
        let mut sql = String::new();
        let joins = self.joins_sql(search);
        append_clause(&mut sql, &joins);
        let where_sql = self.where_sql(search);
        append_clause(&mut sql, &where_sql);
        append_clause(&mut sql, &self.group_sql(search));
        let having = self.having_sql(search);
        append_clause(&mut sql, &having);
        append_clause(&mut sql, &self.order_sql(search));
        append_clause(&mut sql, &self.limit_offset_sql(search));
        sql
    }

    /// The column projection: the selected columns, `*`, or `table.*` with joins.
    pub fn select_sql(&self, search: &SearchCriteria) -> String {
        match search.select_columns() {
            Some(columns) if !columns.trim().is_empty() => columns.to_string(),
            _ if !search.join_conditions().is_empty() => format!("{}.*", self.table),
            _ => "*".to_string(),
        }
    }

    /// A raw statement: the first AND condition, bound but not wrapped.
    pub fn raw_sql(&mut self, search: &SearchCriteria) -> String {
        match search.where_conditions().first() {
            Some(Condition {
                query: Query::Text(text),
                args,
            }) => self.bind_text(text, args),
            Some(condition) => self.condition(condition, true).unwrap_or_default(),
            None => String::new(),
        }
    }
}

/// Quote an identifier; dotted paths are quoted part by part.
pub fn quote_path(dialect: Dialect, name: &str) -> String {
    name.split('.')
        .map(|part| dialect.quote_identifier(part))
        .collect::<Vec<_>>()
        .join(".")
}
