//! Type encoding and decoding between `Value` and SQLite storage classes.
//!
//! SQLite stores every value as one of five classes: INTEGER, REAL, TEXT,
//! BLOB or NULL. Binding maps each `Value` variant onto one of them; reading
//! maps a column back by its storage class alone.
//!
//! | Value | SQLite |
//! |-------|--------|
//! | `Bool` | INTEGER (0/1) |
//! | `TinyInt`, `SmallInt`, `Int`, `BigInt` | INTEGER |
//! | `Timestamp` | INTEGER (microseconds since the epoch) |
//! | `Float`, `Double` | REAL |
//! | `Text` | TEXT |
//! | `Json`, `Array` | TEXT (JSON) |
//! | `Bytes` | BLOB |

use libsqlite3_sys as ffi;
use sqlscope_core::Value;
use std::ffi::{CStr, c_int};

/// Bind a Value to a prepared statement parameter.
///
/// # Safety
/// - `stmt` must be a valid, non-null prepared statement handle
/// - `index` must be a valid 1-based parameter index
pub unsafe fn bind_value(stmt: *mut ffi::sqlite3_stmt, index: c_int, value: &Value) -> c_int {
    // SAFETY: the caller guarantees `stmt` and `index`; text and blob buffers
    // are copied by SQLite (SQLITE_TRANSIENT) before this function returns.
    unsafe {
        match value {
            Value::Null => ffi::sqlite3_bind_null(stmt, index),
            Value::Bool(b) => ffi::sqlite3_bind_int(stmt, index, c_int::from(*b)),
            Value::TinyInt(v) => ffi::sqlite3_bind_int(stmt, index, c_int::from(*v)),
            Value::SmallInt(v) => ffi::sqlite3_bind_int(stmt, index, c_int::from(*v)),
            Value::Int(v) => ffi::sqlite3_bind_int(stmt, index, *v),
            Value::BigInt(v) | Value::Timestamp(v) => ffi::sqlite3_bind_int64(stmt, index, *v),
            Value::Float(v) => ffi::sqlite3_bind_double(stmt, index, f64::from(*v)),
            Value::Double(v) => ffi::sqlite3_bind_double(stmt, index, *v),
            Value::Text(s) => bind_text(stmt, index, s),
            Value::Json(json) => bind_text(stmt, index, &json.to_string()),
            Value::Array(items) => {
                let json = serde_json::Value::Array(items.iter().map(value_to_json).collect());
                bind_text(stmt, index, &json.to_string())
            }
            Value::Bytes(b) => ffi::sqlite3_bind_blob(
                stmt,
                index,
                b.as_ptr().cast(),
                b.len() as c_int,
                ffi::SQLITE_TRANSIENT(),
            ),
        }
    }
}

unsafe fn bind_text(stmt: *mut ffi::sqlite3_stmt, index: c_int, text: &str) -> c_int {
    let bytes = text.as_bytes();
    // SAFETY: see `bind_value`
    unsafe {
        ffi::sqlite3_bind_text(
            stmt,
            index,
            bytes.as_ptr().cast(),
            bytes.len() as c_int,
            ffi::SQLITE_TRANSIENT(),
        )
    }
}

/// Read a column value from the current result row.
///
/// Integers that fit in 32 bits come back as `Int`, wider ones as `BigInt`.
///
/// # Safety
/// - `stmt` must be a valid prepared statement that has just returned SQLITE_ROW
/// - `index` must be a valid 0-based column index
pub unsafe fn read_column(stmt: *mut ffi::sqlite3_stmt, index: c_int) -> Value {
    // SAFETY: guaranteed by the caller; pointers returned by SQLite stay valid
    // until the next step, and are copied out before returning.
    unsafe {
        match ffi::sqlite3_column_type(stmt, index) {
            ffi::SQLITE_INTEGER => {
                let v = ffi::sqlite3_column_int64(stmt, index);
                i32::try_from(v).map_or(Value::BigInt(v), Value::Int)
            }
            ffi::SQLITE_FLOAT => Value::Double(ffi::sqlite3_column_double(stmt, index)),
            ffi::SQLITE_TEXT => {
                let ptr = ffi::sqlite3_column_text(stmt, index);
                let len = ffi::sqlite3_column_bytes(stmt, index);
                if ptr.is_null() {
                    Value::Null
                } else {
                    let slice = std::slice::from_raw_parts(ptr, len as usize);
                    Value::Text(String::from_utf8_lossy(slice).into_owned())
                }
            }
            ffi::SQLITE_BLOB => {
                let ptr = ffi::sqlite3_column_blob(stmt, index);
                let len = ffi::sqlite3_column_bytes(stmt, index);
                if ptr.is_null() || len == 0 {
                    Value::Bytes(Vec::new())
                } else {
                    let slice = std::slice::from_raw_parts(ptr.cast::<u8>(), len as usize);
                    Value::Bytes(slice.to_vec())
                }
            }
            _ => Value::Null,
        }
    }
}

/// Get the column name from a result.
///
/// # Safety
/// - `stmt` must be a valid prepared statement
/// - `index` must be a valid 0-based column index
pub unsafe fn column_name(stmt: *mut ffi::sqlite3_stmt, index: c_int) -> Option<String> {
    // SAFETY: guaranteed by the caller
    unsafe {
        let ptr = ffi::sqlite3_column_name(stmt, index);
        if ptr.is_null() {
            None
        } else {
            CStr::from_ptr(ptr).to_str().ok().map(String::from)
        }
    }
}

/// Plain JSON form of a value, used when arrays are stored as text.
fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::TinyInt(v) => (*v).into(),
        Value::SmallInt(v) => (*v).into(),
        Value::Int(v) => (*v).into(),
        Value::BigInt(v) | Value::Timestamp(v) => (*v).into(),
        Value::Float(v) => f64::from(*v).into(),
        Value::Double(v) => (*v).into(),
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Bytes(b) => serde_json::Value::Array(b.iter().map(|&x| x.into()).collect()),
        Value::Json(j) => j.clone(),
        Value::Array(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrays_become_plain_json() {
        let value = Value::Array(vec![Value::Int(1), Value::from("a"), Value::Null]);
        let Value::Array(items) = &value else {
            unreachable!()
        };
        let json = serde_json::Value::Array(items.iter().map(value_to_json).collect());
        assert_eq!(json.to_string(), r#"[1,"a",null]"#);
    }

    #[test]
    fn nested_values_to_json() {
        assert_eq!(value_to_json(&Value::Timestamp(5)), serde_json::json!(5));
        assert_eq!(value_to_json(&Value::Bytes(vec![1, 2])), serde_json::json!([1, 2]));
        assert_eq!(value_to_json(&Value::Bool(true)), serde_json::json!(true));
    }
}
