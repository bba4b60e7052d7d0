//! SQLite driver for sqlscope.
//!
// FFI bindings require unsafe code
#![allow(unsafe_code)]
//!
//! Implements the `Connection` and `Transaction` traits from sqlscope-core on
//! top of libsqlite3 (bundled through `libsqlite3-sys`).
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlscope_sqlite::SqliteConnection;
//! use sqlscope_core::{Connection, Value};
//!
//! let conn = SqliteConnection::open_memory()?;
//! conn.execute_raw("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")?;
//! let result = conn.execute("INSERT INTO users (name) VALUES (?1)", &[Value::from("Alice")])?;
//! assert_eq!(result.last_insert_id, Some(1));
//! ```
//!
//! # Thread Safety
//!
//! `SqliteConnection` is `Send` and `Sync`. The database handle is opened in
//! serialized mode and guarded by a mutex; clones share the same handle.

pub mod connection;
pub mod types;

pub use connection::{OpenFlags, SqliteConfig, SqliteConnection, SqliteTransaction};

use std::ffi::CStr;

/// The SQLite library version string.
pub fn sqlite_version() -> &'static str {
    // SAFETY: libversion returns a static, NUL-terminated string
    unsafe { CStr::from_ptr(libsqlite3_sys::sqlite3_libversion()) }
        .to_str()
        .unwrap_or("unknown")
}

/// The SQLite library version number.
pub fn sqlite_version_number() -> i32 {
    // SAFETY: no preconditions
    unsafe { libsqlite3_sys::sqlite3_libversion_number() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_reported() {
        assert!(sqlite_version().starts_with('3'));
        assert!(sqlite_version_number() >= 3_000_000);
    }
}
