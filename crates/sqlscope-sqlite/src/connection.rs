//! SQLite connection implementation.
//!
//! Safe wrappers around SQLite's C API implementing the `Connection` and
//! `Transaction` traits from sqlscope-core. A connection and the transaction
//! opened on it share one database handle behind a mutex.

// Casts in FFI code have to match C types exactly
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::borrow_as_ptr)]

use crate::types;
use libsqlite3_sys as ffi;
use sqlscope_core::error::{
    ConnectionError, ConnectionErrorKind, QueryError, QueryErrorKind, TransactionError,
    TransactionErrorKind,
};
use sqlscope_core::{
    ColumnInfo, Connection, Dialect, Error, ExecResult, IsolationLevel, Result, Row, Rows,
    Transaction, Value,
};
use std::ffi::{CStr, CString, c_int};
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Configuration for opening SQLite connections.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Path to the database file, or ":memory:" for an in-memory database.
    pub path: String,
    pub flags: OpenFlags,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
}

/// Flags controlling how the database is opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenFlags {
    pub read_only: bool,
    pub read_write: bool,
    /// Create the database if it doesn't exist.
    pub create: bool,
    /// Enable URI filename interpretation.
    pub uri: bool,
    pub shared_cache: bool,
}

impl OpenFlags {
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Default::default()
        }
    }

    /// Read-write access; the database must exist.
    pub fn read_write() -> Self {
        Self {
            read_write: true,
            ..Default::default()
        }
    }

    /// Read-write access, creating the database if needed.
    pub fn create_read_write() -> Self {
        Self {
            read_write: true,
            create: true,
            ..Default::default()
        }
    }

    fn to_sqlite_flags(self) -> c_int {
        let mut flags = ffi::SQLITE_OPEN_FULLMUTEX;

        if self.read_only {
            flags |= ffi::SQLITE_OPEN_READONLY;
        }
        if self.read_write {
            flags |= ffi::SQLITE_OPEN_READWRITE;
        }
        if self.create {
            flags |= ffi::SQLITE_OPEN_CREATE;
        }
        if self.uri {
            flags |= ffi::SQLITE_OPEN_URI;
        }
        if self.shared_cache {
            flags |= ffi::SQLITE_OPEN_SHAREDCACHE;
        }

        // Default to read-write if no mode specified
        if flags & (ffi::SQLITE_OPEN_READONLY | ffi::SQLITE_OPEN_READWRITE) == 0 {
            flags |= ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE;
        }

        flags
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: ":memory:".to_string(),
            flags: OpenFlags::create_read_write(),
            busy_timeout_ms: 5000,
        }
    }
}

impl SqliteConfig {
    /// Config for a file-based database.
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Config for an in-memory database.
    pub fn memory() -> Self {
        Self::default()
    }

    pub fn flags(mut self, flags: OpenFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn busy_timeout(mut self, ms: u32) -> Self {
        self.busy_timeout_ms = ms;
        self
    }
}

/// The database handle plus transaction state, guarded by a mutex.
struct SqliteInner {
    db: *mut ffi::sqlite3,
    in_transaction: bool,
}

// SAFETY: the handle is opened in serialized mode and every use goes through
// the surrounding Mutex.
unsafe impl Send for SqliteInner {}

impl Drop for SqliteInner {
    fn drop(&mut self) {
        if !self.db.is_null() {
            // SAFETY: db is valid and no statement outlives a call
            unsafe {
                ffi::sqlite3_close(self.db);
            }
            self.db = ptr::null_mut();
        }
    }
}

type Shared = Arc<Mutex<SqliteInner>>;

fn lock(inner: &Shared) -> MutexGuard<'_, SqliteInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A connection to a SQLite database.
#[derive(Clone)]
pub struct SqliteConnection {
    inner: Shared,
    path: String,
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteConnection {
    /// Open a new SQLite connection with the given configuration.
    pub fn open(config: &SqliteConfig) -> Result<Self> {
        let c_path = CString::new(config.path.as_str()).map_err(|_| {
            Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Connect,
                message: "Invalid path: contains null byte".to_string(),
                source: None,
            })
        })?;

        let mut db: *mut ffi::sqlite3 = ptr::null_mut();
        let flags = config.flags.to_sqlite_flags();

        // SAFETY: valid pointers; the return value is checked below
        let rc = unsafe { ffi::sqlite3_open_v2(c_path.as_ptr(), &mut db, flags, ptr::null()) };

        if rc != ffi::SQLITE_OK {
            let msg = if db.is_null() {
                error_string(rc)
            } else {
                // SAFETY: db is valid even on failure and must still be closed
                unsafe {
                    let msg = last_error_message(db);
                    ffi::sqlite3_close(db);
                    msg
                }
            };

            return Err(Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Connect,
                message: format!("Failed to open database: {msg}"),
                source: None,
            }));
        }

        if config.busy_timeout_ms > 0 {
            // SAFETY: db is valid
            unsafe {
                ffi::sqlite3_busy_timeout(db, config.busy_timeout_ms as c_int);
            }
        }

        tracing::debug!(path = %config.path, "opened sqlite database");

        Ok(Self {
            inner: Arc::new(Mutex::new(SqliteInner {
                db,
                in_transaction: false,
            })),
            path: config.path.clone(),
        })
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        Self::open(&SqliteConfig::memory())
    }

    /// Open a file-based database.
    pub fn open_file(path: impl Into<String>) -> Result<Self> {
        Self::open(&SqliteConfig::file(path))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Execute one or more statements without parameters (DDL, scripts).
    pub fn execute_raw(&self, sql: &str) -> Result<()> {
        exec_raw(&lock(&self.inner), sql)
    }

    /// Row id of the most recent successful insert.
    pub fn last_insert_rowid(&self) -> i64 {
        let inner = lock(&self.inner);
        // SAFETY: db is valid
        unsafe { ffi::sqlite3_last_insert_rowid(inner.db) }
    }

    /// Is a transaction open on this handle?
    pub fn in_transaction(&self) -> bool {
        lock(&self.inner).in_transaction
    }
}

impl Connection for SqliteConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<Rows> {
        query_rows(&lock(&self.inner), sql, params)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecResult> {
        execute_stmt(&lock(&self.inner), sql, params)
    }

    fn begin_with(&self, isolation: IsolationLevel) -> Result<Arc<dyn Transaction>> {
        let mut inner = lock(&self.inner);
        if inner.in_transaction {
            return Err(Error::Transaction(TransactionError {
                kind: TransactionErrorKind::AlreadyActive,
                message: "Already in a transaction".to_string(),
            }));
        }

        // SQLite has no isolation levels; approximate them with lock modes.
        let begin_sql = match isolation {
            IsolationLevel::Serializable => "BEGIN EXCLUSIVE",
            IsolationLevel::RepeatableRead | IsolationLevel::ReadCommitted => "BEGIN IMMEDIATE",
            IsolationLevel::ReadUncommitted => "BEGIN DEFERRED",
        };
        exec_raw(&inner, begin_sql)?;
        inner.in_transaction = true;
        tracing::debug!(sql = begin_sql, "transaction started");

        Ok(Arc::new(SqliteTransaction {
            inner: Arc::clone(&self.inner),
            finished: AtomicBool::new(false),
        }))
    }
}

/// An open transaction on a [`SqliteConnection`].
///
/// Dropping an unfinished transaction rolls it back.
pub struct SqliteTransaction {
    inner: Shared,
    finished: AtomicBool,
}

impl SqliteTransaction {
    fn finish(&self, sql: &str) -> Result<()> {
        let mut inner = lock(&self.inner);
        if self.finished.load(Ordering::Acquire) || !inner.in_transaction {
            return Err(Error::Transaction(TransactionError {
                kind: TransactionErrorKind::NotActive,
                message: "Not in a transaction".to_string(),
            }));
        }
        exec_raw(&inner, sql)?;
        inner.in_transaction = false;
        self.finished.store(true, Ordering::Release);
        tracing::debug!(sql, "transaction finished");
        Ok(())
    }
}

impl Connection for SqliteTransaction {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<Rows> {
        query_rows(&lock(&self.inner), sql, params)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecResult> {
        execute_stmt(&lock(&self.inner), sql, params)
    }

    fn begin_with(&self, _isolation: IsolationLevel) -> Result<Arc<dyn Transaction>> {
        Err(Error::Transaction(TransactionError {
            kind: TransactionErrorKind::AlreadyActive,
            message: "Already in a transaction".to_string(),
        }))
    }
}

impl Transaction for SqliteTransaction {
    fn commit(&self) -> Result<()> {
        self.finish("COMMIT")
    }

    fn rollback(&self) -> Result<()> {
        self.finish("ROLLBACK")
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if !self.is_finished() {
            tracing::warn!("transaction dropped without commit or rollback; rolling back");
            if let Err(e) = self.rollback() {
                tracing::warn!(error = %e, "rollback on drop failed");
            }
        }
    }
}

// Helper functions

fn exec_raw(inner: &SqliteInner, sql: &str) -> Result<()> {
    let c_sql = CString::new(sql).map_err(|_| null_byte_error(sql))?;
    let mut errmsg: *mut std::ffi::c_char = ptr::null_mut();

    // SAFETY: all pointers are valid
    let rc = unsafe {
        ffi::sqlite3_exec(inner.db, c_sql.as_ptr(), None, ptr::null_mut(), &mut errmsg)
    };

    if rc != ffi::SQLITE_OK {
        let message = if errmsg.is_null() {
            error_string(rc)
        } else {
            // SAFETY: errmsg was allocated by SQLite and is freed here
            unsafe {
                let msg = CStr::from_ptr(errmsg).to_string_lossy().into_owned();
                ffi::sqlite3_free(errmsg.cast());
                msg
            }
        };
        return Err(Error::Query(QueryError {
            kind: error_code_to_kind(rc),
            sql: Some(sql.to_string()),
            message,
            source: None,
        }));
    }

    Ok(())
}

/// Prepare and bind a statement. `None` means the SQL held no statement.
fn prepare_bound(
    db: *mut ffi::sqlite3,
    sql: &str,
    params: &[Value],
) -> Result<Option<*mut ffi::sqlite3_stmt>> {
    let Some(stmt) = prepare_stmt(db, sql)? else {
        return Ok(None);
    };

    for (i, param) in params.iter().enumerate() {
        // SAFETY: stmt is valid, index is 1-based
        let rc = unsafe { types::bind_value(stmt, (i + 1) as c_int, param) };
        if rc != ffi::SQLITE_OK {
            // SAFETY: stmt is valid
            unsafe { ffi::sqlite3_finalize(stmt) };
            return Err(bind_error(db, sql, i + 1));
        }
    }

    Ok(Some(stmt))
}

/// Run a query and read every row.
///
/// A step failure after some rows were read is kept as the final item, so
/// callers see the partial result before the error.
fn query_rows(inner: &SqliteInner, sql: &str, params: &[Value]) -> Result<Rows> {
    let Some(stmt) = prepare_bound(inner.db, sql, params)? else {
        return Ok(Rows::empty());
    };

    // SAFETY: stmt is valid
    let col_count = unsafe { ffi::sqlite3_column_count(stmt) };
    let names = (0..col_count)
        // SAFETY: stmt is valid, index in range
        .map(|i| unsafe { types::column_name(stmt, i) }.unwrap_or_else(|| format!("col{i}")))
        .collect();
    let columns = Arc::new(ColumnInfo::new(names));

    let mut items: Vec<Result<Row>> = Vec::new();
    loop {
        // SAFETY: stmt is valid
        let rc = unsafe { ffi::sqlite3_step(stmt) };
        match rc {
            ffi::SQLITE_ROW => {
                let values = (0..col_count)
                    // SAFETY: stmt is valid and positioned on a row
                    .map(|i| unsafe { types::read_column(stmt, i) })
                    .collect();
                items.push(Ok(Row::with_columns(Arc::clone(&columns), values)));
            }
            ffi::SQLITE_DONE => break,
            _ => {
                let err = step_error(inner.db, sql);
                // SAFETY: stmt is valid
                unsafe { ffi::sqlite3_finalize(stmt) };
                if items.is_empty() {
                    return Err(err);
                }
                tracing::debug!(sql, rows = items.len(), "row iteration failed");
                items.push(Err(Error::query(
                    QueryErrorKind::RowIteration,
                    sql,
                    err.to_string(),
                )));
                return Ok(Rows::new(columns, items));
            }
        }
    }

    // SAFETY: stmt is valid
    unsafe { ffi::sqlite3_finalize(stmt) };
    tracing::trace!(sql, rows = items.len(), "query finished");
    Ok(Rows::new(columns, items))
}

fn execute_stmt(inner: &SqliteInner, sql: &str, params: &[Value]) -> Result<ExecResult> {
    let Some(stmt) = prepare_bound(inner.db, sql, params)? else {
        return Ok(ExecResult::new(0));
    };

    // SAFETY: stmt is valid
    let rc = unsafe { ffi::sqlite3_step(stmt) };
    let result = match rc {
        ffi::SQLITE_DONE | ffi::SQLITE_ROW => {
            // SAFETY: db is valid
            let (changes, rowid) = unsafe {
                (
                    ffi::sqlite3_changes(inner.db),
                    ffi::sqlite3_last_insert_rowid(inner.db),
                )
            };
            let result = ExecResult::new(u64::try_from(changes).unwrap_or(0));
            Ok(if rowid > 0 && is_insert(sql) {
                result.with_insert_id(rowid)
            } else {
                result
            })
        }
        _ => Err(step_error(inner.db, sql)),
    };

    // SAFETY: stmt is valid
    unsafe { ffi::sqlite3_finalize(stmt) };
    if let Ok(result) = &result {
        tracing::trace!(sql, rows_affected = result.rows_affected, "statement finished");
    }
    result
}

fn is_insert(sql: &str) -> bool {
    let head = sql.trim_start();
    ["INSERT", "REPLACE"].iter().any(|kw| {
        head.get(..kw.len())
            .is_some_and(|start| start.eq_ignore_ascii_case(kw))
    })
}

fn prepare_stmt(db: *mut ffi::sqlite3, sql: &str) -> Result<Option<*mut ffi::sqlite3_stmt>> {
    let c_sql = CString::new(sql).map_err(|_| null_byte_error(sql))?;
    let mut stmt: *mut ffi::sqlite3_stmt = ptr::null_mut();

    // SAFETY: all pointers are valid
    let rc = unsafe {
        ffi::sqlite3_prepare_v2(
            db,
            c_sql.as_ptr(),
            c_sql.as_bytes().len() as c_int,
            &mut stmt,
            ptr::null_mut(),
        )
    };

    if rc != ffi::SQLITE_OK {
        return Err(step_error(db, sql));
    }

    // Whitespace or comments only: nothing to run.
    Ok((!stmt.is_null()).then_some(stmt))
}

fn null_byte_error(sql: &str) -> Error {
    Error::query(QueryErrorKind::Syntax, sql, "SQL contains null byte")
}

/// # Safety
/// `db` must be a valid handle.
unsafe fn last_error_message(db: *mut ffi::sqlite3) -> String {
    // SAFETY: guaranteed by the caller; errmsg always returns a valid string
    unsafe { CStr::from_ptr(ffi::sqlite3_errmsg(db)) }
        .to_string_lossy()
        .into_owned()
}

fn error_string(code: c_int) -> String {
    // SAFETY: errstr returns a static string for any code
    unsafe { CStr::from_ptr(ffi::sqlite3_errstr(code)) }
        .to_string_lossy()
        .into_owned()
}

fn bind_error(db: *mut ffi::sqlite3, sql: &str, param_index: usize) -> Error {
    // SAFETY: db is valid
    let msg = unsafe { last_error_message(db) };
    Error::query(
        QueryErrorKind::Database,
        sql,
        format!("Failed to bind parameter {param_index}: {msg}"),
    )
}

fn step_error(db: *mut ffi::sqlite3, sql: &str) -> Error {
    // SAFETY: db is valid
    let (msg, code) = unsafe { (last_error_message(db), ffi::sqlite3_errcode(db)) };
    Error::query(error_code_to_kind(code), sql, msg)
}

fn error_code_to_kind(code: c_int) -> QueryErrorKind {
    match code & 0xff {
        ffi::SQLITE_CONSTRAINT => QueryErrorKind::Constraint,
        ffi::SQLITE_BUSY | ffi::SQLITE_LOCKED => QueryErrorKind::Busy,
        ffi::SQLITE_PERM | ffi::SQLITE_AUTH => QueryErrorKind::Permission,
        ffi::SQLITE_NOTFOUND => QueryErrorKind::NotFound,
        ffi::SQLITE_TOOBIG => QueryErrorKind::DataTruncation,
        ffi::SQLITE_INTERRUPT => QueryErrorKind::Interrupted,
        ffi::SQLITE_ERROR => QueryErrorKind::Syntax,
        _ => QueryErrorKind::Database,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn people() -> SqliteConnection {
        let conn = SqliteConnection::open_memory().unwrap();
        conn.execute_raw("CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT, age INTEGER)")
            .unwrap();
        conn
    }

    #[test]
    fn open_memory() {
        let conn = SqliteConnection::open_memory().unwrap();
        assert_eq!(conn.path(), ":memory:");
        assert_eq!(conn.dialect(), Dialect::Sqlite);
    }

    #[test]
    fn execute_reports_changes_and_rowid() {
        let conn = people();
        let result = conn
            .execute(
                "INSERT INTO people (name, age) VALUES (?1, ?2)",
                &[Value::from("Alice"), Value::Int(30)],
            )
            .unwrap();
        assert_eq!(result.rows_affected, 1);
        assert_eq!(result.last_insert_id, Some(1));
        assert_eq!(conn.last_insert_rowid(), 1);
    }

    #[test]
    fn query_reads_columns_and_values() {
        let conn = people();
        conn.execute_raw("INSERT INTO people (name, age) VALUES ('Bob', 41), ('Eve', NULL)")
            .unwrap();
        let rows = conn
            .query("SELECT id, name, age FROM people ORDER BY id", &[])
            .unwrap();
        assert_eq!(rows.columns(), ["id", "name", "age"]);
        let rows = rows.collect_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get_by_name("name"), Some(&Value::from("Bob")));
        assert_eq!(rows[0].get_by_name("age"), Some(&Value::Int(41)));
        assert_eq!(rows[1].get_by_name("age"), Some(&Value::Null));
    }

    #[test]
    fn wide_integers_are_bigint() {
        let conn = SqliteConnection::open_memory().unwrap();
        let rows = conn
            .query("SELECT ?1 AS big", &[Value::BigInt(1 << 40)])
            .unwrap()
            .collect_rows()
            .unwrap();
        assert_eq!(rows[0].get(0), Some(&Value::BigInt(1 << 40)));
    }

    #[test]
    fn timestamps_bind_as_integers() {
        let conn = SqliteConnection::open_memory().unwrap();
        let rows = conn
            .query("SELECT typeof(?1)", &[Value::Timestamp(1_700_000_000_000_000)])
            .unwrap()
            .collect_rows()
            .unwrap();
        assert_eq!(rows[0].get(0), Some(&Value::from("integer")));
    }

    #[test]
    fn empty_statement_is_noop() {
        let conn = SqliteConnection::open_memory().unwrap();
        assert_eq!(conn.execute("", &[]).unwrap(), ExecResult::new(0));
        assert_eq!(conn.execute("  -- nothing", &[]).unwrap().rows_affected, 0);
        assert_eq!(conn.query("", &[]).unwrap().count(), 0);
    }

    #[test]
    fn syntax_errors_carry_sql() {
        let conn = SqliteConnection::open_memory().unwrap();
        let err = conn.execute("SELEKT 1", &[]).unwrap_err();
        assert_eq!(err.sql(), Some("SELEKT 1"));
    }

    #[test]
    fn constraint_violation_kind() {
        let conn = people();
        conn.execute_raw("INSERT INTO people (id, name) VALUES (1, 'a')")
            .unwrap();
        let err = conn
            .execute("INSERT INTO people (id, name) VALUES (1, 'b')", &[])
            .unwrap_err();
        match err {
            Error::Query(q) => assert!(q.is_constraint_violation()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn failure_mid_iteration_keeps_earlier_rows() {
        let conn = SqliteConnection::open_memory().unwrap();
        conn.execute_raw(
            "CREATE TABLE nums (n INTEGER);
             INSERT INTO nums VALUES (1), (2), (0), (4);",
        )
        .unwrap();
        // abs() of the smallest integer overflows once the third row is reached
        let rows: Vec<_> = conn
            .query(
                "SELECT CASE WHEN n = 0 THEN abs(n - 9223372036854775807 - 1) ELSE n END AS v FROM nums",
                &[],
            )
            .unwrap()
            .collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_ok());
        assert!(rows[1].is_ok());
        assert!(rows[2].as_ref().unwrap_err().is_row_iteration_error());
    }

    #[test]
    fn transaction_commit() {
        let conn = people();
        let tx = conn.begin().unwrap();
        assert!(conn.in_transaction());
        tx.execute("INSERT INTO people (name) VALUES ('tx')", &[])
            .unwrap();
        tx.commit().unwrap();
        assert!(tx.is_finished());
        assert!(!conn.in_transaction());
        let count = conn
            .query("SELECT count(*) FROM people", &[])
            .unwrap()
            .collect_rows()
            .unwrap();
        assert_eq!(count[0].get(0), Some(&Value::Int(1)));
    }

    #[test]
    fn transaction_rollback_and_double_finish() {
        let conn = people();
        let tx = conn.begin_with(IsolationLevel::Serializable).unwrap();
        tx.execute("INSERT INTO people (name) VALUES ('gone')", &[])
            .unwrap();
        tx.rollback().unwrap();
        assert!(tx.commit().is_err());
        let rows = conn
            .query("SELECT * FROM people", &[])
            .unwrap()
            .collect_rows()
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn nested_begin_is_rejected() {
        let conn = people();
        let tx = conn.begin().unwrap();
        assert!(matches!(conn.begin(), Err(Error::Transaction(_))));
        assert!(tx.begin().is_err());
        tx.rollback().unwrap();
    }

    #[test]
    fn dropped_transaction_rolls_back() {
        let conn = people();
        {
            let tx = conn.begin().unwrap();
            tx.execute("INSERT INTO people (name) VALUES ('x')", &[])
                .unwrap();
        }
        assert!(!conn.in_transaction());
        let rows = conn
            .query("SELECT * FROM people", &[])
            .unwrap()
            .collect_rows()
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn config_builders() {
        let config = SqliteConfig::file("/tmp/x.db")
            .busy_timeout(10)
            .flags(OpenFlags::read_only());
        assert_eq!(config.path, "/tmp/x.db");
        assert_eq!(config.busy_timeout_ms, 10);
        assert!(config.flags.read_only);
        assert_ne!(
            OpenFlags::default().to_sqlite_flags() & ffi::SQLITE_OPEN_CREATE,
            0
        );
    }
}
