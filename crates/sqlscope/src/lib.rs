//! sqlscope: fluent, callback-driven relational data access.
//!
//! A [`Session`] accumulates query directives through cheap, immutable
//! derivations. Terminal calls (`find`, `first`, `insert`, `update`,
//! `delete`, ...) bind the session to a destination in a [`Scope`] and run
//! the processors a [`CallbackRegistry`] holds for that kind of operation.
//! The default processors render parameterized SQL, execute it on the
//! session's connection, and scan rows back into `#[derive(Model)]` records.
//!
//! # Quick Start
//!
//! ```ignore
//! use sqlscope::prelude::*;
//! use sqlscope_sqlite::SqliteConnection;
//!
//! #[derive(Debug, Default, Model)]
//! struct User {
//!     id: i64,
//!     name: String,
//!     created_at: Option<i64>,
//!     deleted_at: Option<i64>,
//! }
//!
//! let db = Session::new(SqliteConnection::open_memory()?);
//!
//! let mut ann = User { name: "Ann".into(), ..User::default() };
//! db.insert(&mut ann);
//!
//! let mut users: Vec<User> = Vec::new();
//! let found = db.filter("name = ?", args!["Ann"]).find(&mut users);
//! assert!(!found.has_error());
//!
//! // Soft delete: stamps deleted_at, later queries skip the row.
//! db.unscoped().delete(&mut ann);
//! ```
//!
//! # Extending the pipeline
//!
//! Processors are plain functions over a [`Scope`]. Register them on a
//! registry before sharing it:
//!
//! ```ignore
//! let mut registry = CallbackRegistry::with_defaults();
//! registry.create().before("sqlscope:insert").register("app:audit", |scope| {
//!     tracing::info!(table = scope.table_name(), "about to insert");
//! });
//! let db = Session::builder().callbacks(Arc::new(registry)).build(conn);
//! ```
//!
//! Generated `Model` impls name `sqlscope_core` directly, so crates using the
//! derive depend on `sqlscope-core` alongside this crate.

pub mod callback;
pub mod config;
pub mod processors;
pub mod scope;
pub mod session;

#[cfg(test)]
mod testing;

pub use callback::{CallbackKind, CallbackProcessor, CallbackRegistry, Processor, ProcessorFn};
pub use config::{LogMode, SessionConfig};
pub use scope::Scope;
pub use session::{Session, SessionBuilder};

pub use sqlscope_core::{
    Collection, Connection, Destination, Dialect, Element, Error, ExecResult, Field, FieldInfo,
    FromValue, IsolationLevel, Model, ModelMeta, Record, Result, Row, Rows, Shape, Transaction,
    Value,
};
pub use sqlscope_macros::Model;
pub use sqlscope_query::{
    Condition, OrderBy, OrderDirection, OrderTerm, Query, SearchCriteria, args,
};

pub use sqlscope_core;
pub use sqlscope_query;

/// The common imports.
pub mod prelude {
    pub use crate::{
        CallbackKind, CallbackRegistry, Destination, Error, LogMode, Model, OrderBy,
        OrderDirection, Query, Result, Row, Scope, SearchCriteria, Session, SessionConfig, Value,
        args,
    };
}
