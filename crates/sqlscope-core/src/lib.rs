//! Core types and traits for sqlscope.
//!
//! This crate provides the foundations the rest of the workspace builds on:
//!
//! - `Value` and `Row`/`Rows` for moving data to and from the database
//! - `Model` and `Record` for struct-to-table mapping
//! - `Destination`, `Collection` and `Element` for query targets
//! - `Connection` and `Transaction` for drivers
//! - `Error` for everything that can go wrong

pub mod connection;
pub mod destination;
pub mod error;
pub mod field;
pub mod model;
pub mod row;
pub mod value;

pub use connection::{Connection, Dialect, ExecResult, IsolationLevel, Transaction};
pub use destination::{Collection, Destination, Element, Shape};
pub use error::{Error, FieldValidationError, Result, ValidationError, ValidationErrorKind};
pub use field::{Field, FieldInfo};
pub use model::{CREATED_AT, DELETED_AT, Model, ModelMeta, Record, UPDATED_AT};
pub use row::{ColumnInfo, FromValue, Row, Rows};
pub use value::Value;
