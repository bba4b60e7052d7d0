//! Database connection traits.
//!
//! - [`Connection`] runs statements against a database and opens transactions
//! - [`Transaction`] is a connection handle that can be committed or rolled back
//! - [`Dialect`] decides placeholder and identifier quoting syntax
//!
//! All calls block the calling thread until the database answers.

use crate::error::Result;
use crate::row::Rows;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// SQL dialect of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Dialect {
    /// PostgreSQL dialect (uses $1, $2 placeholders)
    Postgres,
    /// SQLite dialect (uses ?1, ?2 placeholders)
    #[default]
    Sqlite,
    /// MySQL dialect (uses ? placeholders)
    Mysql,
}

impl Dialect {
    /// Generate a placeholder for the given parameter index (1-based).
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Sqlite => format!("?{index}"),
            Dialect::Mysql => "?".to_string(),
        }
    }

    /// Quote an identifier, doubling embedded quote characters.
    pub fn quote_identifier(self, name: &str) -> String {
        match self {
            Dialect::Postgres | Dialect::Sqlite => {
                let escaped = name.replace('"', "\"\"");
                format!("\"{}\"", escaped)
            }
            Dialect::Mysql => {
                let escaped = name.replace('`', "``");
                format!("`{}`", escaped)
            }
        }
    }
}

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    ReadUncommitted,
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// Outcome of a statement that does not return rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    /// Rows changed by the statement, as reported by the driver.
    pub rows_affected: u64,
    /// Row id of the last insert, when the driver reports one.
    pub last_insert_id: Option<i64>,
}

impl ExecResult {
    pub const fn new(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            last_insert_id: None,
        }
    }

    pub const fn with_insert_id(mut self, id: i64) -> Self {
        self.last_insert_id = Some(id);
        self
    }
}

/// A database connection.
///
/// Implementations are shared behind `Arc` by every session derived from the
/// same root, so they must be safe to call from several threads.
pub trait Connection: Send + Sync {
    /// The SQL dialect this connection speaks.
    fn dialect(&self) -> Dialect;

    /// Execute a query and return its rows.
    ///
    /// A failure while stepping through the results is reported as the last
    /// item of the returned [`Rows`], after the rows read before it.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Rows>;

    /// Execute a statement that does not return rows.
    ///
    /// An empty statement is a no-op reporting zero affected rows.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecResult>;

    /// Open a transaction with the given isolation level.
    fn begin_with(&self, isolation: IsolationLevel) -> Result<Arc<dyn Transaction>>;

    /// Open a transaction with the default isolation level.
    fn begin(&self) -> Result<Arc<dyn Transaction>> {
        self.begin_with(IsolationLevel::default())
    }
}

/// An open transaction.
///
/// A transaction is itself a connection: statements issued through it run
/// inside the transaction until it is committed or rolled back.
pub trait Transaction: Connection {
    fn commit(&self) -> Result<()>;

    fn rollback(&self) -> Result<()>;

    /// Has this transaction been committed or rolled back?
    fn is_finished(&self) -> bool;
}
