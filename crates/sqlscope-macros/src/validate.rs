//! Compile-time validation for the Model derive macro.
//!
//! All problems are collected and reported together, each pointing at the
//! offending struct or field.

use std::collections::HashSet;

use proc_macro2::Span;
use syn::{Error, Type};

use crate::parse::ModelDef;

/// Validate a parsed model definition.
pub fn validate_model(model: &ModelDef) -> Result<(), Error> {
    let mut errors = Vec::new();

    if !model.generics.params.is_empty() {
        errors.push(Error::new(
            model.name.span(),
            "Model cannot be derived for generic structs",
        ));
    }
    if model.mapped_fields().next().is_none() {
        errors.push(Error::new(
            model.name.span(),
            "Model struct must have at least one mapped field",
        ));
    }
    validate_table_name(&model.table_name, model.name.span(), &mut errors);
    validate_columns(model, &mut errors);

    let keys: Vec<_> = model.mapped_fields().filter(|f| f.primary_key).collect();
    for extra in keys.iter().skip(1) {
        errors.push(Error::new(
            extra.name.span(),
            "only one field can be the primary key",
        ));
    }

    for field in &model.fields {
        if field.skip && (field.primary_key || field.computed) {
            errors.push(Error::new(
                field.name.span(),
                "#[sqlscope(skip)] cannot be combined with other field attributes",
            ));
        }
        if field.primary_key && field.computed {
            errors.push(Error::new(
                field.name.span(),
                "a primary key cannot be computed",
            ));
        }
        if matches!(field.ty, Type::Reference(_) | Type::Ptr(_)) {
            errors.push(Error::new(
                field.name.span(),
                "reference and pointer fields are not supported; use owned types instead",
            ));
        }
    }

    match errors.into_iter().reduce(|mut combined, err| {
        combined.combine(err);
        combined
    }) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn validate_table_name(table_name: &str, span: Span, errors: &mut Vec<Error>) {
    const DANGEROUS_CHARS: &[char] = &[';', '\'', '"', '`', '-', '/', '*', '\\', '\0', '\n', '\r'];

    if table_name.trim().is_empty() {
        errors.push(Error::new(span, "table name cannot be empty or whitespace"));
        return;
    }
    if let Some(ch) = table_name.chars().find(|c| DANGEROUS_CHARS.contains(c)) {
        errors.push(Error::new(
            span,
            format!(
                "table name contains invalid character '{ch}'; \
                 table names should only contain alphanumeric characters and underscores"
            ),
        ));
    }
}

/// No two mapped fields may answer to the same column name.
fn validate_columns(model: &ModelDef, errors: &mut Vec<Error>) {
    let mut seen: HashSet<&str> = HashSet::new();
    for field in model.mapped_fields() {
        if !seen.insert(field.column_name.as_str()) {
            errors.push(Error::new(
                field.name.span(),
                format!(
                    "duplicate column name '{}'; another field already maps to this column",
                    field.column_name
                ),
            ));
        }
    }
}
