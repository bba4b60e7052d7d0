//! Execution context of one terminal operation.
//!
//! A [`Scope`] binds a derived [`Session`] to the destination of the
//! operation. Processors use it to inspect the record, render and bind SQL,
//! execute it, and record errors and the affected-row count. When dispatch is
//! over the scope is turned back into the session the caller receives.

use crate::config::LogMode;
use crate::session::Session;
use sqlscope_core::{
    DELETED_AT, Destination, Dialect, Error, ExecResult, Field, ModelMeta, Record, Result, Row,
    Rows, Shape, Value,
};
use sqlscope_query::{Renderer, SearchCriteria, append_clause, quote_path};
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

/// Context handed to every processor of one dispatch.
pub struct Scope<'a> {
    db: Session,
    value: Option<&'a mut dyn Destination>,
    meta: Option<ModelMeta>,
    sql: String,
    sql_vars: Vec<Value>,
}

impl<'a> Scope<'a> {
    /// Bind `db` to a destination.
    ///
    /// The model metadata comes from the session's target model if one was
    /// set, otherwise from the destination.
    pub fn new(db: Session, mut value: Option<&'a mut dyn Destination>) -> Self {
        let meta = db
            .model_meta()
            .or_else(|| value.as_deref_mut().and_then(|dest| dest.shape().meta()));
        Self {
            db,
            value,
            meta,
            sql: String::new(),
            sql_vars: Vec::new(),
        }
    }

    /// The session this scope runs on.
    pub fn db(&self) -> &Session {
        &self.db
    }

    /// Give the session back, carrying any errors and the row count.
    pub fn into_db(self) -> Session {
        self.db
    }

    pub fn meta(&self) -> Option<ModelMeta> {
        self.meta
    }

    pub fn dialect(&self) -> Dialect {
        self.db.dialect()
    }

    pub fn search(&self) -> &SearchCriteria {
        self.db.search()
    }

    pub fn search_mut(&mut self) -> &mut SearchCriteria {
        self.db.search_mut()
    }

    /// Take the destination out, leaving the scope without one until
    /// [`restore_value`](Self::restore_value).
    pub fn take_value(&mut self) -> Option<&'a mut dyn Destination> {
        self.value.take()
    }

    pub fn restore_value(&mut self, value: Option<&'a mut dyn Destination>) {
        self.value = value;
    }

    /// The destination's shape, if there is a destination.
    pub fn shape(&mut self) -> Option<Shape<'_>> {
        self.value.as_deref_mut().map(|dest| dest.shape())
    }

    /// The destination record, when it is a record of the scope's model.
    fn record(&mut self) -> Option<&mut dyn Record> {
        let table = self.meta?.table_name;
        match self.value.as_deref_mut()?.shape() {
            Shape::Record(record) if record.record_meta().table_name == table => Some(record),
            _ => None,
        }
    }

    /// Is the destination a record of the scope's model?
    pub fn has_record(&mut self) -> bool {
        self.record().is_some()
    }

    /// Every mapped field of the model, with the destination record's values.
    ///
    /// Without a record destination the values are NULL.
    pub fn fields(&mut self) -> Vec<Field> {
        let Some(meta) = self.meta else {
            return Vec::new();
        };
        match self.record() {
            Some(record) => meta
                .fields
                .iter()
                .map(|info| Field::new(info, record.field_value(info.name).unwrap_or(Value::Null)))
                .collect(),
            None => meta
                .fields
                .iter()
                .map(|info| Field::new(info, Value::Null))
                .collect(),
        }
    }

    /// A field by Rust name or column name.
    pub fn field_by_name(&mut self, name: &str) -> Option<Field> {
        let info = self.meta?.field(name)?;
        let value = self
            .record()
            .and_then(|record| record.field_value(info.name))
            .unwrap_or(Value::Null);
        Some(Field::new(info, value))
    }

    pub fn primary_field(&mut self) -> Option<Field> {
        let name = self.meta?.primary_field()?.name;
        self.field_by_name(name)
    }

    /// Write a field of the destination record.
    ///
    /// Without a record destination nothing is written.
    pub fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        match self.record() {
            Some(record) => record.set_field_value(name, value),
            None => Ok(()),
        }
    }

    /// Bind a parameter and return its placeholder.
    pub fn add_to_vars(&mut self, value: Value) -> String {
        self.sql_vars.push(value);
        self.dialect().placeholder(self.sql_vars.len())
    }

    /// Quote an identifier for this connection's dialect.
    pub fn quote(&self, name: &str) -> String {
        quote_path(self.dialect(), name)
    }

    /// The table the statement targets: the criteria's table override, or
    /// the model's table. Empty when neither is known.
    pub fn table_name(&self) -> &str {
        self.db
            .search()
            .table_name()
            .or(self.meta.map(|m| m.table_name))
            .unwrap_or("")
    }

    pub fn quoted_table_name(&self) -> String {
        self.quote(self.table_name())
    }

    fn render<R>(&mut self, f: impl FnOnce(&mut Renderer<'_>, &SearchCriteria) -> R) -> R {
        let key_column = self
            .meta
            .and_then(|m| m.primary_field())
            .map(|f| f.column_name);
        let key_value = self.primary_field().map(|f| f.value);
        let soft_delete = self
            .meta
            .and_then(|m| m.field(DELETED_AT))
            .map(|f| f.column_name);
        let search = self.db.search().clone();
        let table = self.table_name().to_string();
        let dialect = self.dialect();

        let mut renderer = Renderer::new(dialect, &table, &mut self.sql_vars)
            .primary_key(key_column, key_value)
            .soft_delete(soft_delete);
        f(&mut renderer, &search)
    }

    /// Joins, WHERE (primary key of the record, criteria conditions and the
    /// soft-delete predicate), GROUP BY, HAVING, ORDER BY and LIMIT/OFFSET.
    pub fn combined_condition_sql(&mut self) -> String {
        self.render(|renderer, search| renderer.combined_sql(search))
    }

    /// Render the SELECT for this scope into [`sql`](Self::sql).
    ///
    /// In raw mode the first condition is the whole statement.
    pub fn prepare_query_sql(&mut self) {
        if self.search().is_raw() {
            self.sql = self.raw_statement();
            return;
        }
        if self.table_name().is_empty() {
            self.err(Error::Custom(
                "no table to query: set a model or a table name".to_string(),
            ));
            return;
        }
        self.sql = self.render(|renderer, search| {
            let mut sql = format!(
                "SELECT {} FROM {}",
                renderer.select_sql(search),
                renderer.quoted_table()
            );
            let condition = renderer.combined_sql(search);
            append_clause(&mut sql, &condition);
            sql
        });
    }

    /// Render the first AND condition of a raw criteria as a whole
    /// statement, binding its arguments.
    pub fn raw_statement(&mut self) -> String {
        self.render(|renderer, search| renderer.raw_sql(search))
    }

    /// Set the final statement text.
    pub fn raw(&mut self, sql: impl Into<String>) {
        self.sql = sql.into();
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn sql_vars(&self) -> &[Value] {
        &self.sql_vars
    }

    /// Record an error on the session.
    pub fn err(&mut self, error: Error) {
        tracing::debug!(error = %error, "scope error");
        self.db.push_error(error);
    }

    pub fn has_error(&self) -> bool {
        self.db.has_error()
    }

    pub fn rows_affected(&self) -> u64 {
        self.db.rows_affected()
    }

    pub fn set_rows_affected(&mut self, rows: u64) {
        self.db.set_rows_affected(rows);
    }

    /// Copy the values of `row` into `record`, matching columns to fields by
    /// column name. Columns the record does not map are skipped.
    pub fn scan(&self, row: &Row, record: &mut dyn Record) -> Result<()> {
        let meta = record.record_meta();
        for (column, value) in row.iter() {
            if let Some(info) = meta.field(column) {
                record.set_field_value(info.name, value.clone())?;
            }
        }
        Ok(())
    }

    /// Store a value in the session's key/value map.
    pub fn set(&mut self, key: impl Into<String>, value: impl Any + Send + Sync) {
        self.db.insert_value(key.into(), Arc::new(value));
    }

    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.db.get::<T>(key)
    }

    /// Execute [`sql`](Self::sql) with its bound parameters.
    pub fn exec(&self) -> Result<ExecResult> {
        self.db.execute_sql(&self.sql, &self.sql_vars)
    }

    /// Run [`sql`](Self::sql) as a query.
    pub fn query_rows(&self) -> Result<Rows> {
        self.db.query_sql(&self.sql, &self.sql_vars)
    }

    /// Trace the statement of this scope.
    pub fn trace(&self, started: Instant) {
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        match self.db.log_mode() {
            LogMode::Silent => {}
            LogMode::Default => tracing::debug!(
                sql = %self.sql,
                vars = ?self.sql_vars,
                rows_affected = self.rows_affected(),
                elapsed_ms,
                "statement"
            ),
            LogMode::Verbose => tracing::info!(
                sql = %self.sql,
                vars = ?self.sql_vars,
                rows_affected = self.rows_affected(),
                elapsed_ms,
                "statement"
            ),
        }
    }
}
