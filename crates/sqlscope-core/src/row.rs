//! Database rows and result sets.

use crate::Result;
use crate::error::{Error, TypeError};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Column metadata shared across all rows in a result set.
#[derive(Debug, Clone, Default)]
pub struct ColumnInfo {
    names: Vec<String>,
    name_to_index: HashMap<String, usize>,
}

impl ColumnInfo {
    /// Create new column info from a list of column names.
    pub fn new(names: Vec<String>) -> Self {
        let name_to_index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            names,
            name_to_index,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Get the index of a column by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// A single row returned from a database query.
#[derive(Debug, Clone)]
pub struct Row {
    values: Vec<Value>,
    columns: Arc<ColumnInfo>,
}

impl Row {
    /// Create a row with its own column metadata.
    pub fn new(column_names: Vec<String>, values: Vec<Value>) -> Self {
        let columns = Arc::new(ColumnInfo::new(column_names));
        Self { values, columns }
    }

    /// Create a row sharing column metadata with the rest of its result set.
    pub fn with_columns(columns: Arc<ColumnInfo>, values: Vec<Value>) -> Self {
        Self { values, columns }
    }

    pub fn column_info(&self) -> Arc<ColumnInfo> {
        Arc::clone(&self.columns)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a value by column index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value by column name.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns.index_of(name).and_then(|i| self.values.get(i))
    }

    /// Get a typed value by column index.
    pub fn get_as<T: FromValue>(&self, index: usize) -> Result<T> {
        let value = self.get(index).ok_or_else(|| {
            Error::Type(TypeError {
                expected: std::any::type_name::<T>(),
                actual: format!(
                    "index {} out of bounds (row has {} columns)",
                    index,
                    self.len()
                ),
                column: None,
                rust_type: None,
            })
        })?;
        T::from_value(value)
    }

    /// Get a typed value by column name.
    pub fn get_named<T: FromValue>(&self, name: &str) -> Result<T> {
        let value = self.get_by_name(name).ok_or_else(|| {
            Error::Type(TypeError {
                expected: std::any::type_name::<T>(),
                actual: format!("column '{}' not found", name),
                column: Some(name.to_string()),
                rust_type: None,
            })
        })?;
        T::from_value(value).map_err(|e| match e {
            Error::Type(mut te) => {
                te.column = Some(name.to_string());
                Error::Type(te)
            }
            e => e,
        })
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.names().iter().map(String::as_str)
    }

    /// Iterate over (column_name, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.column_names().zip(self.values.iter())
    }
}

/// The rows produced by one statement.
///
/// Each item is either a row or the error that stopped iteration. A driver
/// that fails halfway through stepping yields the rows it already read and
/// then the error, so callers can tell a short result from a broken one.
#[derive(Debug)]
pub struct Rows {
    columns: Arc<ColumnInfo>,
    items: std::vec::IntoIter<Result<Row>>,
}

impl Rows {
    pub fn new(columns: Arc<ColumnInfo>, items: Vec<Result<Row>>) -> Self {
        Self {
            columns,
            items: items.into_iter(),
        }
    }

    /// A result set with no columns and no rows.
    pub fn empty() -> Self {
        Self::new(Arc::new(ColumnInfo::default()), Vec::new())
    }

    /// Column names in select order.
    pub fn columns(&self) -> &[String] {
        self.columns.names()
    }

    /// Collect every row, stopping at the first iteration error.
    pub fn collect_rows(self) -> Result<Vec<Row>> {
        self.collect()
    }
}

impl Iterator for Rows {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.items.next()
    }
}

/// Conversion from a `Value` to a typed field value.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self>;
}

fn type_error(expected: &'static str, value: &Value) -> Error {
    Error::Type(TypeError {
        expected,
        actual: value.type_name().to_string(),
        column: None,
        rust_type: None,
    })
}

macro_rules! impl_from_value_int {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self> {
                    let v = value
                        .as_i64()
                        .ok_or_else(|| type_error(stringify!($ty), value))?;
                    <$ty>::try_from(v).map_err(|_| {
                        Error::Type(TypeError {
                            expected: stringify!($ty),
                            actual: format!("value {} out of range", v),
                            column: None,
                            rust_type: None,
                        })
                    })
                }
            }
        )+
    };
}

impl_from_value_int!(i8, i16, i32, u8, u16, u32, u64);

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_i64().ok_or_else(|| type_error("i64", value))
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| type_error("bool", value))
    }
}

#[allow(clippy::cast_possible_truncation)]
impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Float(v) => Ok(*v),
            _ => value
                .as_f64()
                .map(|v| v as f32)
                .ok_or_else(|| type_error("f32", value)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_f64().ok_or_else(|| type_error("f64", value))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            Value::Json(v) => Ok(v.to_string()),
            _ => Err(type_error("String", value)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            Value::Text(s) => Ok(s.as_bytes().to_vec()),
            _ => Err(type_error("Vec<u8>", value)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Json(v) => Ok(v.clone()),
            Value::Text(s) => serde_json::from_str(s).map_err(|e| {
                Error::Type(TypeError {
                    expected: "valid JSON",
                    actual: format!("invalid JSON: {}", e),
                    column: None,
                    rust_type: None,
                })
            }),
            _ => Err(type_error("JSON", value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryErrorKind;

    #[test]
    fn test_row_basic_access() {
        let row = Row::new(
            vec!["id".to_string(), "name".to_string()],
            vec![Value::Int(1), Value::Text("Alice".to_string())],
        );

        assert_eq!(row.len(), 2);
        assert_eq!(row.get(0), Some(&Value::Int(1)));
        assert_eq!(row.get(2), None);
        assert_eq!(
            row.get_by_name("name"),
            Some(&Value::Text("Alice".to_string()))
        );
        assert_eq!(row.get_by_name("missing"), None);
    }

    #[test]
    fn test_row_typed_access() {
        let row = Row::new(
            vec!["id".to_string(), "big".to_string()],
            vec![Value::Int(42), Value::BigInt(7_000_000_000)],
        );

        assert_eq!(row.get_as::<i32>(0).unwrap(), 42);
        assert_eq!(row.get_named::<i64>("big").unwrap(), 7_000_000_000);
        assert!(row.get_named::<i32>("big").is_err());
        assert!(row.get_named::<i32>("missing").is_err());
    }

    #[test]
    fn test_null_handling() {
        let row = Row::new(vec!["nullable".to_string()], vec![Value::Null]);
        assert_eq!(row.get_named::<Option<i32>>("nullable").unwrap(), None);
        assert!(row.get_named::<i32>("nullable").is_err());
    }

    #[test]
    fn test_type_error_names_column() {
        let row = Row::new(vec!["age".to_string()], vec![Value::Text("x".to_string())]);
        match row.get_named::<i64>("age") {
            Err(Error::Type(te)) => assert_eq!(te.column.as_deref(), Some("age")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_timestamp_into_i64() {
        assert_eq!(i64::from_value(&Value::Timestamp(99)).unwrap(), 99);
        assert_eq!(
            Option::<i64>::from_value(&Value::Timestamp(5)).unwrap(),
            Some(5)
        );
    }

    #[test]
    fn test_rows_yield_error_after_partial_rows() {
        let columns = Arc::new(ColumnInfo::new(vec!["id".to_string()]));
        let rows = Rows::new(
            Arc::clone(&columns),
            vec![
                Ok(Row::with_columns(Arc::clone(&columns), vec![Value::Int(1)])),
                Err(Error::query(
                    QueryErrorKind::RowIteration,
                    "SELECT id FROM t",
                    "disk I/O error",
                )),
            ],
        );
        assert_eq!(rows.columns(), &["id".to_string()]);

        let items: Vec<_> = rows.collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].as_ref().is_err_and(Error::is_row_iteration_error));
    }

    #[test]
    fn test_collect_rows() {
        assert!(Rows::empty().collect_rows().unwrap().is_empty());
    }
}
