//! Query criteria and SQL rendering for sqlscope.
//!
//! [`SearchCriteria`] accumulates the directives of a fluent chain: filters,
//! ordering, projection, paging, grouping, joins and the raw/unscoped flags.
//! [`Renderer`] turns a criteria into SQL for one table, binding every
//! argument as a placeholder.
//!
//! # Example
//!
//! ```ignore
//! use sqlscope_query::{args, Renderer, SearchCriteria};
//!
//! let search = SearchCriteria::new()
//!     .filter("age > ?", args![18])
//!     .order("name")
//!     .limit(10);
//!
//! let mut vars = Vec::new();
//! let sql = Renderer::new(Dialect::Sqlite, "users", &mut vars).combined_sql(&search);
//! // WHERE (age > ?1) ORDER BY name LIMIT 10
//! ```

pub mod clause;
pub mod condition;
pub mod render;
pub mod search;

pub use clause::{NullsOrder, OrderBy, OrderDirection, OrderTerm};
pub use condition::{Condition, Query};
pub use render::{Renderer, append_clause, quote_path};
pub use search::SearchCriteria;

pub use sqlscope_core::{Dialect, Value};

/// Build a `Vec<Value>` of positional arguments.
///
/// ```ignore
/// session.filter("name = ? AND age > ?", args!["jinzhu", 18])
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($value)),+]
    };
}
