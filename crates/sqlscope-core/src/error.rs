//! Error types for sqlscope operations.
//!
//! Errors are `Clone` so they can travel with cloned sessions: every derived
//! session carries the errors of its ancestors.

use std::fmt;
use std::sync::Arc;

/// Shared, thread-safe error source.
pub type ErrorSource = Arc<dyn std::error::Error + Send + Sync>;

/// The primary error type for all sqlscope operations.
#[derive(Debug, Clone)]
pub enum Error {
    /// Connection-related errors (open, close, handle state)
    Connection(ConnectionError),
    /// Statement errors, including failures while iterating a result set
    Query(QueryError),
    /// Type conversion errors while scanning values into fields
    Type(TypeError),
    /// Transaction errors
    Transaction(TransactionError),
    /// The destination has the wrong shape for the operation
    Destination(DestinationError),
    /// Configuration errors
    Config(ConfigError),
    /// Validation errors
    Validation(ValidationError),
    /// Custom error with message
    Custom(String),
}

#[derive(Debug, Clone)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
    pub source: Option<ErrorSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Failed to open the database
    Connect,
    /// The handle was closed or is unusable
    Disconnected,
}

#[derive(Debug, Clone)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub sql: Option<String>,
    pub message: String,
    pub source: Option<ErrorSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Syntax error in SQL
    Syntax,
    /// Constraint violation (unique, foreign key, etc.)
    Constraint,
    /// Table or column not found
    NotFound,
    /// Permission denied
    Permission,
    /// Data too large for column
    DataTruncation,
    /// Database busy or locked
    Busy,
    /// Statement interrupted
    Interrupted,
    /// Stepping through the result set failed after it started
    RowIteration,
    /// Other database error
    Database,
}

#[derive(Debug, Clone)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
    pub rust_type: Option<&'static str>,
}

#[derive(Debug, Clone)]
pub struct TransactionError {
    pub kind: TransactionErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionErrorKind {
    /// A transaction is already open on this handle
    AlreadyActive,
    /// No transaction is open
    NotActive,
}

#[derive(Debug, Clone)]
pub struct DestinationError {
    /// Rust type name, or a description, of the rejected destination
    pub type_name: &'static str,
    /// The operation that needed the destination
    pub operation: &'static str,
}

#[derive(Debug, Clone)]
pub struct ConfigError {
    pub message: String,
    pub source: Option<ErrorSource>,
}

/// Validation error for field-level and model-level checks.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub errors: Vec<FieldValidationError>,
}

/// A single validation error for a field.
#[derive(Debug, Clone)]
pub struct FieldValidationError {
    /// The field name that failed validation
    pub field: String,
    /// The kind of validation that failed
    pub kind: ValidationErrorKind,
    /// Human-readable error message
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// A single field was rejected
    Field,
    /// The record as a whole was rejected
    Model,
}

impl ValidationError {
    /// Create a new empty validation error container.
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add a field validation error.
    pub fn add(
        &mut self,
        field: impl Into<String>,
        kind: ValidationErrorKind,
        message: impl Into<String>,
    ) {
        self.errors.push(FieldValidationError {
            field: field.into(),
            kind,
            message: message.into(),
        });
    }

    /// Add a model-level validation error, recorded with field "__model__".
    pub fn add_model_error(&mut self, message: impl Into<String>) {
        self.add("__model__", ValidationErrorKind::Model, message);
    }
}

impl Default for ValidationError {
    fn default() -> Self {
        Self::new()
    }
}

impl Error {
    /// Build a statement error carrying the offending SQL.
    pub fn query(kind: QueryErrorKind, sql: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Query(QueryError {
            kind,
            sql: Some(sql.into()),
            message: message.into(),
            source: None,
        })
    }

    /// Build a model-level validation error with a single message.
    pub fn model_validation(message: impl Into<String>) -> Self {
        let mut err = ValidationError::new();
        err.add_model_error(message);
        Error::Validation(err)
    }

    /// A record was asked to set a field it does not have.
    pub fn unknown_field(model: &'static str, name: &str) -> Self {
        Error::Type(TypeError {
            expected: model,
            actual: format!("unknown field '{name}'"),
            column: Some(name.to_string()),
            rust_type: None,
        })
    }

    /// Is this a destination-shape error?
    pub fn is_destination_error(&self) -> bool {
        matches!(self, Error::Destination(_))
    }

    /// Did this error happen after rows were already being consumed?
    pub fn is_row_iteration_error(&self) -> bool {
        matches!(self, Error::Query(q) if q.kind == QueryErrorKind::RowIteration)
    }

    /// Get the SQL that caused this error, if available
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sql.as_deref(),
            _ => None,
        }
    }
}

impl QueryError {
    pub fn is_constraint_violation(&self) -> bool {
        self.kind == QueryErrorKind::Constraint
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Connection(e) => write!(f, "Connection error: {}", e.message),
            Error::Query(e) => write!(f, "Query error: {}", e.message),
            Error::Type(e) => write!(f, "Type error: {}", e),
            Error::Transaction(e) => write!(f, "Transaction error: {}", e.message),
            Error::Destination(e) => write!(f, "Unsupported destination: {}", e),
            Error::Config(e) => write!(f, "Configuration error: {}", e.message),
            Error::Validation(e) => write!(f, "Validation error: {}", e),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let source = match self {
            Error::Connection(e) => e.source.as_ref(),
            Error::Query(e) => e.source.as_ref(),
            Error::Config(e) => e.source.as_ref(),
            _ => None,
        };
        source.map(|err| &**err as &(dyn std::error::Error + 'static))
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sql {
            Some(sql) => write!(f, "{} (in `{}`)", self.message, sql),
            None => write!(f, "{}", self.message),
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "column '{}': expected {}, found {}",
                col, self.expected, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for DestinationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cannot write into `{}`",
            self.operation, self.type_name
        )
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            write!(f, "validation passed")
        } else if self.errors.len() == 1 {
            let err = &self.errors[0];
            write!(f, "validation error on '{}': {}", err.field, err.message)
        } else {
            writeln!(f, "validation errors:")?;
            for err in &self.errors {
                writeln!(f, "  - {}: {}", err.field, err.message)?;
            }
            Ok(())
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::Connection(err)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<TransactionError> for Error {
    fn from(err: TransactionError) -> Self {
        Error::Transaction(err)
    }
}

impl From<DestinationError> for Error {
    fn from(err: DestinationError) -> Self {
        Error::Destination(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Validation(err)
    }
}

/// Result type alias for sqlscope operations.
pub type Result<T> = std::result::Result<T, Error>;
