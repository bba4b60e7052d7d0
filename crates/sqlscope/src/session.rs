//! The fluent session handle.
//!
//! A [`Session`] is cheap to clone and never changes once built: every
//! query-shaping call returns a new session with one more directive, and
//! every terminal call returns the session the operation ran on, carrying
//! its errors and affected-row count.
//!
//! ```ignore
//! let db = Session::new(SqliteConnection::open_memory()?);
//!
//! let mut adults: Vec<User> = Vec::new();
//! let result = db
//!     .filter("age >= ?", args![18])
//!     .order("name")
//!     .find(&mut adults);
//! if let Some(err) = result.error() {
//!     return Err(err.clone());
//! }
//! ```

use crate::callback::{CallbackKind, CallbackRegistry};
use crate::config::{LogMode, SessionConfig};
use crate::processors::ORDER_BY_PRIMARY_KEY;
use crate::scope::Scope;
use sqlscope_core::{
    Connection, Destination, Dialect, Error, ExecResult, IsolationLevel, Model, ModelMeta, Result,
    Row, Rows, Transaction, Value,
};
use sqlscope_query::{OrderDirection, OrderTerm, Query, SearchCriteria};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type Values = HashMap<String, Arc<dyn Any + Send + Sync>>;

/// A derivation-safe handle on a connection.
#[derive(Clone)]
pub struct Session {
    conn: Arc<dyn Connection>,
    tx: Option<Arc<dyn Transaction>>,
    callbacks: Arc<CallbackRegistry>,
    errors: Vec<Error>,
    rows_affected: u64,
    log_mode: LogMode,
    values: Values,
    search: SearchCriteria,
    model: Option<ModelMeta>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("dialect", &self.dialect())
            .field("in_transaction", &self.in_transaction())
            .field("errors", &self.errors)
            .field("rows_affected", &self.rows_affected)
            .field("log_mode", &self.log_mode)
            .field("values", &self.values.keys().collect::<Vec<_>>())
            .field("search", &self.search)
            .field("model", &self.model.map(|m| m.table_name))
            .finish_non_exhaustive()
    }
}

/// Builder for a root [`Session`].
#[derive(Debug, Default)]
pub struct SessionBuilder {
    config: SessionConfig,
    callbacks: Option<Arc<CallbackRegistry>>,
}

impl SessionBuilder {
    /// Use `config` instead of the defaults.
    #[must_use]
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a configured registry instead of the default processors.
    #[must_use]
    pub fn callbacks(mut self, callbacks: Arc<CallbackRegistry>) -> Self {
        self.callbacks = Some(callbacks);
        self
    }

    /// Build a root session owning `conn`.
    pub fn build(self, conn: impl Connection + 'static) -> Session {
        self.build_shared(Arc::new(conn))
    }

    /// Build on a connection that is already shared.
    pub fn build_shared(self, conn: Arc<dyn Connection>) -> Session {
        let callbacks = self
            .callbacks
            .unwrap_or_else(|| Arc::new(CallbackRegistry::with_defaults()));
        Session {
            conn,
            tx: None,
            callbacks,
            errors: Vec::new(),
            rows_affected: 0,
            log_mode: self.config.log_mode,
            values: HashMap::new(),
            search: SearchCriteria::new(),
            model: None,
        }
    }
}

impl Session {
    /// A session with the default configuration and processors.
    pub fn new(conn: impl Connection + 'static) -> Self {
        Self::builder().build(conn)
    }

    /// A builder for a root session.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    fn with_search(&self, search: SearchCriteria) -> Self {
        Self {
            search,
            ..self.clone()
        }
    }

    // ==================== Query shaping ====================

    /// Add an AND condition: raw text with `?` markers, an equality map, or
    /// a nested group.
    #[must_use]
    pub fn filter(&self, query: impl Into<Query>, args: impl IntoIterator<Item = Value>) -> Self {
        self.with_search(self.search.filter(query, args))
    }

    /// Add an OR condition.
    #[must_use]
    pub fn or(&self, query: impl Into<Query>, args: impl IntoIterator<Item = Value>) -> Self {
        self.with_search(self.search.or(query, args))
    }

    /// Add a negated AND condition.
    #[must_use]
    pub fn not(&self, query: impl Into<Query>, args: impl IntoIterator<Item = Value>) -> Self {
        self.with_search(self.search.not(query, args))
    }

    /// Append an ordering term. An empty term changes nothing.
    #[must_use]
    pub fn order(&self, term: impl Into<OrderTerm>) -> Self {
        self.with_search(self.search.order(term))
    }

    /// Replace the ordering. An empty term clears it.
    #[must_use]
    pub fn reorder(&self, term: impl Into<OrderTerm>) -> Self {
        self.with_search(self.search.reorder(term))
    }

    /// Set the column projection.
    #[must_use]
    pub fn select(&self, columns: impl Into<String>) -> Self {
        self.with_search(self.search.select(columns))
    }

    /// Leave columns out of inserts and updates, replacing any earlier list.
    #[must_use]
    pub fn omit<I, S>(&self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_search(self.search.omit(columns))
    }

    /// Cap the number of rows.
    #[must_use]
    pub fn limit(&self, limit: u64) -> Self {
        self.with_search(self.search.limit(limit))
    }

    /// Skip rows before the first one returned.
    #[must_use]
    pub fn offset(&self, offset: u64) -> Self {
        self.with_search(self.search.offset(offset))
    }

    /// Set the GROUP BY expression.
    #[must_use]
    pub fn group(&self, group: impl Into<String>) -> Self {
        self.with_search(self.search.group(group))
    }

    /// Add a HAVING condition.
    #[must_use]
    pub fn having(&self, query: impl Into<Query>, args: impl IntoIterator<Item = Value>) -> Self {
        self.with_search(self.search.having(query, args))
    }

    /// Add a join clause; `?` markers bind `args`.
    #[must_use]
    pub fn joins(&self, query: impl Into<String>, args: impl IntoIterator<Item = Value>) -> Self {
        self.with_search(self.search.joins(query, args))
    }

    /// Target `name` instead of the model's table.
    #[must_use]
    pub fn table(&self, name: impl Into<String>) -> Self {
        self.with_search(self.search.table(name))
    }

    /// Run `sql` as the whole statement of the next query.
    #[must_use]
    pub fn raw(&self, sql: impl Into<String>, args: impl IntoIterator<Item = Value>) -> Self {
        self.with_search(self.search.raw(true).filter(sql.into(), args))
    }

    /// Include soft-deleted rows. Deletes on models with `deleted_at`
    /// become soft deletes.
    #[must_use]
    pub fn unscoped(&self) -> Self {
        self.with_search(self.search.unscoped())
    }

    /// Target the table of `M` for `rows`, `row`, `count` and `scan`.
    #[must_use]
    pub fn model<M: Model>(&self) -> Self {
        Self {
            model: Some(M::meta()),
            ..self.clone()
        }
    }

    /// Store a value under `key` for processors to read.
    #[must_use]
    pub fn set(&self, key: impl Into<String>, value: impl Any + Send + Sync) -> Self {
        let mut session = self.clone();
        session.insert_value(key.into(), Arc::new(value));
        session
    }

    /// Apply reusable transforms in order.
    #[must_use]
    pub fn scopes(&self, funcs: &[&dyn Fn(Session) -> Session]) -> Self {
        funcs.iter().fold(self.clone(), |session, f| f(session))
    }

    /// A session with fresh criteria and no target model, on the same
    /// connection and registry.
    #[must_use]
    pub fn new_session(&self) -> Self {
        Self {
            search: SearchCriteria::new(),
            model: None,
            ..self.clone()
        }
    }

    /// Use another registry for this session and its descendants.
    #[must_use]
    pub fn with_callbacks(&self, callbacks: Arc<CallbackRegistry>) -> Self {
        Self {
            callbacks,
            ..self.clone()
        }
    }

    /// Trace statements of this session and its descendants at `log_mode`.
    #[must_use]
    pub fn with_log_mode(&self, log_mode: LogMode) -> Self {
        Self {
            log_mode,
            ..self.clone()
        }
    }

    // ==================== Terminal operations ====================

    fn dispatch(&self, kind: CallbackKind, value: Option<&mut dyn Destination>) -> Session {
        let callbacks = Arc::clone(&self.callbacks);
        let mut scope = Scope::new(self.clone(), value);
        callbacks.dispatch(kind, &mut scope);
        scope.into_db()
    }

    /// Query every matching row into `out`: a record or a `Vec` of records.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn find(&self, out: &mut dyn Destination) -> Session {
        self.dispatch(CallbackKind::Query, Some(out))
    }

    /// The first row by primary key.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn first(&self, out: &mut dyn Destination) -> Session {
        self.by_primary_key(OrderDirection::Asc, out)
    }

    /// The last row by primary key.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn last(&self, out: &mut dyn Destination) -> Session {
        self.by_primary_key(OrderDirection::Desc, out)
    }

    fn by_primary_key(&self, direction: OrderDirection, out: &mut dyn Destination) -> Session {
        let mut result = self
            .limit(1)
            .set(ORDER_BY_PRIMARY_KEY, direction)
            .dispatch(CallbackKind::Query, Some(out));
        result.values.remove(ORDER_BY_PRIMARY_KEY);
        result
    }

    /// Query the target model's table into a destination of another type.
    ///
    /// Columns are matched to the destination's fields by name; columns it
    /// does not map are skipped.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn scan(&self, out: &mut dyn Destination) -> Session {
        self.dispatch(CallbackKind::Query, Some(out))
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn insert(&self, value: &mut dyn Destination) -> Session {
        self.dispatch(CallbackKind::Create, Some(value))
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn update(&self, value: &mut dyn Destination) -> Session {
        self.dispatch(CallbackKind::Update, Some(value))
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn delete(&self, value: &mut dyn Destination) -> Session {
        self.dispatch(CallbackKind::Delete, Some(value))
    }

    /// Run the row-query processors, then the prepared SELECT.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn rows(&self) -> Result<Rows> {
        let callbacks = Arc::clone(&self.callbacks);
        let mut scope = Scope::new(self.clone(), None);
        callbacks.dispatch(CallbackKind::RowQuery, &mut scope);
        if scope.sql().is_empty() {
            scope.prepare_query_sql();
        }
        if let Some(err) = scope.db().error() {
            return Err(err.clone());
        }
        let started = std::time::Instant::now();
        let rows = scope.query_rows();
        scope.trace(started);
        rows
    }

    /// The first row of the prepared SELECT, if any.
    pub fn row(&self) -> Result<Option<Row>> {
        self.limit(1).rows()?.next().transpose()
    }

    /// Count the matching rows.
    pub fn count(&self) -> Result<i64> {
        let session = self.with_search(self.search.select("count(*)").ignore_order_query(true));
        match session.row()? {
            Some(row) => row.get_as::<i64>(0),
            None => Ok(0),
        }
    }

    // ==================== Transactions ====================

    /// Open a transaction; the returned session runs inside it.
    ///
    /// A failure to begin is recorded on the returned session.
    pub fn begin(&self) -> Session {
        self.begin_with(IsolationLevel::default())
    }

    /// Like [`begin`](Self::begin), with an explicit isolation level.
    pub fn begin_with(&self, isolation: IsolationLevel) -> Session {
        let mut session = self.clone();
        let begun = match &self.tx {
            Some(tx) => tx.begin_with(isolation),
            None => self.conn.begin_with(isolation),
        };
        match begun {
            Ok(tx) => session.tx = Some(tx),
            Err(err) => session.errors.push(err),
        }
        session
    }

    /// Commit the open transaction. Outside a transaction this does nothing.
    pub fn commit(&self) -> Session {
        self.finish(|tx| tx.commit())
    }

    /// Roll back the open transaction. Outside a transaction this does nothing.
    pub fn rollback(&self) -> Session {
        self.finish(|tx| tx.rollback())
    }

    fn finish(&self, end: impl FnOnce(&dyn Transaction) -> Result<()>) -> Session {
        let mut session = self.clone();
        if let Some(tx) = session.tx.take() {
            if let Err(err) = end(&*tx) {
                session.errors.push(err);
            }
        }
        session
    }

    /// Run `f` in a transaction, committing when it returns `Ok` and rolling
    /// back otherwise.
    pub fn transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Session) -> Result<T>,
    {
        let tx = self.begin();
        if let Some(err) = tx.error() {
            return Err(err.clone());
        }
        match f(&tx) {
            Ok(value) => {
                let done = tx.commit();
                match done.errors.get(tx.errors.len()) {
                    Some(err) => Err(err.clone()),
                    None => Ok(value),
                }
            }
            Err(err) => {
                let done = tx.rollback();
                if let Some(rollback_err) = done.errors.get(tx.errors.len()) {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Does this session run inside a transaction?
    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    // ==================== State ====================

    /// The first error recorded on this session.
    pub fn error(&self) -> Option<&Error> {
        self.errors.first()
    }

    /// Every error recorded on this session, oldest first.
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Has any error been recorded?
    pub fn has_error(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Rows affected by the last operation.
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// The accumulated criteria.
    pub fn search(&self) -> &SearchCriteria {
        &self.search
    }

    /// The value stored under `key`, if it has type `T`.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.values
            .get(key)
            .cloned()
            .and_then(|value| value.downcast::<T>().ok())
    }

    /// How statements are traced.
    pub fn log_mode(&self) -> LogMode {
        self.log_mode
    }

    /// The registry terminal operations dispatch through.
    pub fn callbacks(&self) -> &Arc<CallbackRegistry> {
        &self.callbacks
    }

    /// The SQL dialect of the connection.
    pub fn dialect(&self) -> Dialect {
        match &self.tx {
            Some(tx) => tx.dialect(),
            None => self.conn.dialect(),
        }
    }

    /// Metadata of the model set by [`model`](Self::model).
    pub fn model_meta(&self) -> Option<ModelMeta> {
        self.model
    }

    pub(crate) fn search_mut(&mut self) -> &mut SearchCriteria {
        &mut self.search
    }

    pub(crate) fn push_error(&mut self, error: Error) {
        self.errors.push(error);
    }

    pub(crate) fn set_rows_affected(&mut self, rows: u64) {
        self.rows_affected = rows;
    }

    pub(crate) fn insert_value(&mut self, key: String, value: Arc<dyn Any + Send + Sync>) {
        self.values.insert(key, value);
    }

    pub(crate) fn execute_sql(&self, sql: &str, params: &[Value]) -> Result<ExecResult> {
        match &self.tx {
            Some(tx) => tx.execute(sql, params),
            None => self.conn.execute(sql, params),
        }
    }

    pub(crate) fn query_sql(&self, sql: &str, params: &[Value]) -> Result<Rows> {
        match &self.tx {
            Some(tx) => tx.query(sql, params),
            None => self.conn.query(sql, params),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_error(&self, error: Error) -> Self {
        let mut session = self.clone();
        session.errors.push(error);
        session
    }

    #[cfg(test)]
    pub(crate) fn with_rows_affected(&self, rows: u64) -> Self {
        Self {
            rows_affected: rows,
            ..self.clone()
        }
    }
}
