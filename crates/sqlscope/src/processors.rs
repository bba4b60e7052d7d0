//! The default processors.
//!
//! Each one works only through the [`Scope`] it is given. A processor that
//! finds an error already recorded skips its statement but still traces.
//!
//! In raw mode the first AND condition is the whole statement, run as is.
//! Otherwise insert, update and soft delete read and write the destination
//! record, so they reject any destination that is not a record of the
//! scope's model before issuing SQL.

use crate::scope::Scope;
use sqlscope_core::error::DestinationError;
use sqlscope_core::{CREATED_AT, DELETED_AT, Error, Result, Shape, UPDATED_AT, Value};
use sqlscope_query::{OrderDirection, append_clause};
use std::time::Instant;

/// Name of the default query processor.
pub const QUERY: &str = "sqlscope:query";
/// Name of the default insert processor.
pub const INSERT: &str = "sqlscope:insert";
/// Name of the default update processor.
pub const UPDATE: &str = "sqlscope:update";
/// Name of the default delete processor.
pub const DELETE: &str = "sqlscope:delete";

/// Key of an [`OrderDirection`] the query processor orders the primary key by.
pub const ORDER_BY_PRIMARY_KEY: &str = "sqlscope:order_by_primary_key";

/// Select rows into the destination.
///
/// A collection is cleared and grows one element per row; a record is
/// filled from every row in turn. Any other destination is an error and
/// nothing is executed.
pub fn query(scope: &mut Scope<'_>) {
    let started = Instant::now();
    if let Err(err) = check_destination(scope) {
        scope.err(err);
        scope.trace(started);
        return;
    }

    order_by_primary_key(scope);
    scope.prepare_query_sql();
    if !scope.has_error() {
        fetch(scope);
    }
    scope.trace(started);
}

fn check_destination(scope: &mut Scope<'_>) -> Result<()> {
    let result = match scope.shape() {
        None => Err(DestinationError {
            type_name: "()",
            operation: "query",
        }),
        Some(Shape::Unsupported(type_name)) => Err(DestinationError {
            type_name,
            operation: "query",
        }),
        Some(Shape::Collection(collection)) => {
            collection.clear_elements();
            Ok(())
        }
        Some(Shape::Record(_)) => Ok(()),
    };
    result.map_err(Error::from)
}

fn order_by_primary_key(scope: &mut Scope<'_>) {
    let Some(direction) = scope.get::<OrderDirection>(ORDER_BY_PRIMARY_KEY) else {
        return;
    };
    let Some(key) = scope.meta().and_then(|m| m.primary_field()) else {
        return;
    };
    let term = format!(
        "{}.{} {}",
        scope.quoted_table_name(),
        scope.quote(key.column_name),
        direction.as_sql()
    );
    let search = scope.search().order(term);
    *scope.search_mut() = search;
}

fn fetch(scope: &mut Scope<'_>) {
    scope.set_rows_affected(0);
    let rows = match scope.query_rows() {
        Ok(rows) => rows,
        Err(err) => {
            scope.err(err);
            return;
        }
    };

    let mut value = scope.take_value();
    if let Some(dest) = value.as_deref_mut() {
        for item in rows {
            let row = match item {
                Ok(row) => row,
                Err(err) => {
                    scope.err(err);
                    break;
                }
            };
            scope.set_rows_affected(scope.rows_affected() + 1);
            let scanned = match dest.shape() {
                Shape::Record(record) => scope.scan(&row, record),
                Shape::Collection(collection) => scope.scan(&row, collection.push_element()),
                Shape::Unsupported(_) => Ok(()),
            };
            if let Err(err) = scanned {
                scope.err(err);
                break;
            }
        }
    }
    scope.restore_value(value);
}

/// Insert the destination record.
///
/// Every field but the primary key is written, except omitted ones. A
/// database-assigned key is written back when the record's key is blank.
pub fn insert(scope: &mut Scope<'_>) {
    let started = Instant::now();
    if !scope.has_error() {
        if scope.search().is_raw() {
            exec_raw(scope);
        } else {
            insert_record(scope);
        }
    }
    scope.trace(started);
}

fn insert_record(scope: &mut Scope<'_>) {
    if !require_record(scope, "insert") {
        return;
    }
    let now = Value::now();
    for name in [CREATED_AT, UPDATED_AT] {
        if !stamp(scope, name, &now) {
            return;
        }
    }

    let mut columns = Vec::new();
    let mut placeholders = Vec::new();
    for field in scope.fields() {
        if field.is_primary_key() || is_omitted(scope, field.name(), field.column_name()) {
            continue;
        }
        columns.push(scope.quote(field.column_name()));
        placeholders.push(scope.add_to_vars(field.value));
    }

    if columns.is_empty() {
        let table = scope.table_name().to_string();
        scope.err(Error::model_validation(format!(
            "nothing to insert into '{table}': no columns besides the primary key"
        )));
        return;
    }

    scope.raw(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        scope.quoted_table_name(),
        columns.join(","),
        placeholders.join(",")
    ));

    match scope.exec() {
        Ok(result) => {
            scope.set_rows_affected(result.rows_affected);
            if let (Some(id), Some(key)) = (result.last_insert_id, scope.primary_field()) {
                if key.is_blank() {
                    if let Err(err) = scope.set_field(key.name(), Value::BigInt(id)) {
                        scope.err(err);
                    }
                }
            }
        }
        Err(err) => scope.err(err),
    }
}

/// Update the destination record.
///
/// Assigns every normal, non-key, non-omitted field. With nothing to assign
/// no statement runs and the row count is left alone.
pub fn update(scope: &mut Scope<'_>) {
    let started = Instant::now();
    if !scope.has_error() {
        if scope.search().is_raw() {
            exec_raw(scope);
        } else {
            update_record(scope);
        }
    }
    scope.trace(started);
}

fn update_record(scope: &mut Scope<'_>) {
    if !require_record(scope, "update") || !stamp(scope, UPDATED_AT, &Value::now()) {
        return;
    }

    let mut assignments = Vec::new();
    for field in scope.fields() {
        if field.is_primary_key()
            || !field.is_normal()
            || is_omitted(scope, field.name(), field.column_name())
        {
            continue;
        }
        let column = scope.quote(field.column_name());
        let placeholder = scope.add_to_vars(field.value);
        assignments.push(format!("{column} = {placeholder}"));
    }
    if assignments.is_empty() {
        return;
    }

    let mut sql = format!(
        "UPDATE {} SET {}",
        scope.quoted_table_name(),
        assignments.join(", ")
    );
    let condition = scope.combined_condition_sql();
    append_clause(&mut sql, &condition);
    scope.raw(sql);

    match scope.exec() {
        Ok(result) => scope.set_rows_affected(result.rows_affected),
        Err(err) => scope.err(err),
    }
}

/// Delete rows matching the scope.
///
/// An unscoped delete of a model with a `deleted_at` field stamps the record
/// instead of removing the rows, and so needs a record destination. The
/// statement runs, and the row count is written, even when an earlier error
/// left the statement empty.
pub fn delete(scope: &mut Scope<'_>) {
    let started = Instant::now();
    if !scope.has_error() {
        prepare_delete(scope);
    }

    match scope.exec() {
        Ok(result) => scope.set_rows_affected(result.rows_affected),
        Err(err) => scope.err(err),
    }
    scope.trace(started);
}

fn prepare_delete(scope: &mut Scope<'_>) {
    if scope.search().is_raw() {
        let sql = scope.raw_statement();
        scope.raw(sql);
        return;
    }

    let soft_delete = scope
        .field_by_name(DELETED_AT)
        .filter(|_| scope.search().is_unscoped());
    let Some(field) = soft_delete else {
        let mut sql = format!("DELETE FROM {}", scope.quoted_table_name());
        let condition = scope.combined_condition_sql();
        append_clause(&mut sql, &condition);
        scope.raw(sql);
        return;
    };

    if !require_record(scope, "soft delete") {
        return;
    }
    let now = Value::now();
    let placeholder = scope.add_to_vars(now.clone());
    let mut sql = format!(
        "UPDATE {} SET {} = {}",
        scope.quoted_table_name(),
        scope.quote(field.column_name()),
        placeholder
    );
    let condition = scope.combined_condition_sql();
    append_clause(&mut sql, &condition);
    scope.raw(sql);
    if let Err(err) = scope.set_field(field.name(), now) {
        scope.err(err);
    }
}

/// Run the raw statement and record its row count.
fn exec_raw(scope: &mut Scope<'_>) {
    let sql = scope.raw_statement();
    scope.raw(sql);
    match scope.exec() {
        Ok(result) => scope.set_rows_affected(result.rows_affected),
        Err(err) => scope.err(err),
    }
}

/// Record a destination error unless the destination is a record of the
/// scope's model.
fn require_record(scope: &mut Scope<'_>, operation: &'static str) -> bool {
    if scope.has_record() {
        return true;
    }
    let type_name = match scope.shape() {
        None => "()",
        Some(Shape::Record(_)) => "record of another model",
        Some(Shape::Collection(_)) => "collection",
        Some(Shape::Unsupported(type_name)) => type_name,
    };
    scope.err(Error::from(DestinationError {
        type_name,
        operation,
    }));
    false
}

/// Set a timestamp field if the model has it. False when writing it failed.
fn stamp(scope: &mut Scope<'_>, name: &str, now: &Value) -> bool {
    if scope.field_by_name(name).is_none() {
        return true;
    }
    match scope.set_field(name, now.clone()) {
        Ok(()) => true,
        Err(err) => {
            scope.err(err);
            false
        }
    }
}

fn is_omitted(scope: &Scope<'_>, name: &str, column: &str) -> bool {
    let search = scope.search();
    search.is_omitted(name) || search.is_omitted(column)
}
