//! Recording connection and fixture models for unit tests.

use crate::Model;
use sqlscope_core::error::{TransactionError, TransactionErrorKind};
use sqlscope_core::{
    ColumnInfo, Connection, Dialect, Error, ExecResult, IsolationLevel, Result, Row, Rows,
    Transaction, Value,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Default)]
struct MockState {
    executed: Vec<(String, Vec<Value>)>,
    queried: Vec<(String, Vec<Value>)>,
    statements: Vec<String>,
    exec_results: VecDeque<ExecResult>,
    query_results: VecDeque<Result<Rows>>,
    in_transaction: bool,
}

/// A connection that records every statement and replays canned results.
#[derive(Clone, Default)]
pub(crate) struct MockConnection {
    state: Arc<Mutex<MockState>>,
}

impl MockConnection {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Statements passed to `execute`, with their parameters.
    pub(crate) fn executed(&self) -> Vec<(String, Vec<Value>)> {
        self.lock().executed.clone()
    }

    /// Statements passed to `query`, with their parameters.
    pub(crate) fn queried(&self) -> Vec<(String, Vec<Value>)> {
        self.lock().queried.clone()
    }

    /// Every statement in order, transaction control included.
    pub(crate) fn statements(&self) -> Vec<String> {
        self.lock().statements.clone()
    }

    pub(crate) fn push_exec(&self, result: ExecResult) {
        self.lock().exec_results.push_back(result);
    }

    pub(crate) fn push_rows(&self, columns: &[&str], rows: Vec<Result<Vec<Value>>>) {
        let columns = Arc::new(ColumnInfo::new(
            columns.iter().map(|c| (*c).to_string()).collect(),
        ));
        let items = rows
            .into_iter()
            .map(|row| row.map(|values| Row::with_columns(Arc::clone(&columns), values)))
            .collect();
        self.lock()
            .query_results
            .push_back(Ok(Rows::new(columns, items)));
    }

    pub(crate) fn fail_next_query(&self, error: Error) {
        self.lock().query_results.push_back(Err(error));
    }

    fn control(&self, statement: &str) {
        self.lock().statements.push(statement.to_string());
    }
}

impl Connection for MockConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<Rows> {
        let mut state = self.lock();
        state.queried.push((sql.to_string(), params.to_vec()));
        state.statements.push(sql.to_string());
        state
            .query_results
            .pop_front()
            .unwrap_or_else(|| Ok(Rows::empty()))
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecResult> {
        let mut state = self.lock();
        state.executed.push((sql.to_string(), params.to_vec()));
        state.statements.push(sql.to_string());
        Ok(state.exec_results.pop_front().unwrap_or_default())
    }

    fn begin_with(&self, _isolation: IsolationLevel) -> Result<Arc<dyn Transaction>> {
        {
            let mut state = self.lock();
            if state.in_transaction {
                return Err(already_active());
            }
            state.in_transaction = true;
        }
        self.control("BEGIN");
        Ok(Arc::new(MockTransaction {
            conn: self.clone(),
            finished: AtomicBool::new(false),
        }))
    }
}

fn already_active() -> Error {
    Error::Transaction(TransactionError {
        kind: TransactionErrorKind::AlreadyActive,
        message: "transaction already active".to_string(),
    })
}

pub(crate) struct MockTransaction {
    conn: MockConnection,
    finished: AtomicBool,
}

impl MockTransaction {
    fn finish(&self, statement: &str) -> Result<()> {
        if self.finished.swap(true, Ordering::SeqCst) {
            return Err(Error::Transaction(TransactionError {
                kind: TransactionErrorKind::NotActive,
                message: "transaction already finished".to_string(),
            }));
        }
        self.conn.lock().in_transaction = false;
        self.conn.control(statement);
        Ok(())
    }
}

impl Connection for MockTransaction {
    fn dialect(&self) -> Dialect {
        self.conn.dialect()
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<Rows> {
        self.conn.query(sql, params)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<ExecResult> {
        self.conn.execute(sql, params)
    }

    fn begin_with(&self, _isolation: IsolationLevel) -> Result<Arc<dyn Transaction>> {
        Err(already_active())
    }
}

impl Transaction for MockTransaction {
    fn commit(&self) -> Result<()> {
        self.finish("COMMIT")
    }

    fn rollback(&self) -> Result<()> {
        self.finish("ROLLBACK")
    }

    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

/// Soft-deletable model with timestamps.
#[derive(Debug, Clone, Default, PartialEq, Model)]
pub(crate) struct Widget {
    pub id: i64,
    pub name: String,
    pub price: Option<i64>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Model)]
pub(crate) struct Gadget {
    pub id: i64,
    pub label: String,
}

#[derive(Debug, Default, Model)]
#[sqlscope(table = "key_only")]
pub(crate) struct KeyOnly {
    pub id: i64,
}

/// Everything but the key is computed.
#[derive(Debug, Default, Model)]
#[sqlscope(table = "totals")]
pub(crate) struct Totals {
    pub id: i64,
    #[sqlscope(computed)]
    pub total: i64,
}

/// Aggregate result row without a table of its own.
#[derive(Debug, Default, Model)]
pub(crate) struct Summary {
    pub name: String,
    pub total: i64,
}
