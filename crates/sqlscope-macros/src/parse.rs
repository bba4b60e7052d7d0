//! Parsing logic for the Model derive macro.
//!
//! Extracts struct-level and field-level `#[sqlscope(...)]` attributes into
//! [`ModelDef`] and [`FieldDef`], which drive code generation.

use quote::ToTokens;
use syn::{Attribute, Data, DeriveInput, Error, Fields, Generics, Ident, Lit, Result, Type};

/// Parsed model definition from a struct with `#[derive(Model)]`.
#[derive(Debug)]
pub struct ModelDef {
    /// The struct name (e.g., `User`).
    pub name: Ident,
    /// The SQL table name (e.g., `"users"`).
    pub table_name: String,
    /// Parsed field definitions, skipped fields included.
    pub fields: Vec<FieldDef>,
    pub generics: Generics,
}

/// Parsed field definition from a struct field.
#[derive(Debug)]
pub struct FieldDef {
    /// The Rust field name (e.g., `created_at`).
    pub name: Ident,
    /// The SQL column name.
    pub column_name: String,
    pub ty: Type,
    /// `Option<T>` fields are nullable.
    pub nullable: bool,
    pub primary_key: bool,
    /// Scanned from query results but never written by inserts or updates.
    pub computed: bool,
    /// Not mapped at all.
    pub skip: bool,
}

impl ModelDef {
    /// Fields that map to a column.
    pub fn mapped_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| !f.skip)
    }
}

/// Parse a `DeriveInput` into a `ModelDef`.
pub fn parse_model(input: &DeriveInput) -> Result<ModelDef> {
    let name = input.ident.clone();
    let table_name = parse_struct_attrs(&input.attrs)?
        .unwrap_or_else(|| pluralize(&to_snake_case(&name.to_string())));

    let mut fields = match &input.data {
        Data::Struct(data) => parse_fields(&data.fields)?,
        Data::Enum(_) => {
            return Err(Error::new_spanned(
                input,
                "Model can only be derived for structs, not enums",
            ));
        }
        Data::Union(_) => {
            return Err(Error::new_spanned(
                input,
                "Model can only be derived for structs, not unions",
            ));
        }
    };

    // Without an explicit key, a field named `id` is the primary key.
    if !fields.iter().any(|f| f.primary_key) {
        if let Some(id) = fields.iter_mut().find(|f| !f.skip && f.name == "id") {
            id.primary_key = true;
        }
    }

    Ok(ModelDef {
        name,
        table_name,
        fields,
        generics: input.generics.clone(),
    })
}

/// Parse struct-level `#[sqlscope(table = "...")]`.
fn parse_struct_attrs(attrs: &[Attribute]) -> Result<Option<String>> {
    let mut table_name: Option<String> = None;

    for attr in attrs {
        if !attr.path().is_ident("sqlscope") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let value: Lit = meta.value()?.parse()?;
                let Lit::Str(lit_str) = value else {
                    return Err(Error::new_spanned(
                        value,
                        "expected string literal for table name",
                    ));
                };
                if table_name.is_some() {
                    return Err(Error::new_spanned(
                        meta.path,
                        "duplicate sqlscope attribute: table",
                    ));
                }
                table_name = Some(lit_str.value());
                Ok(())
            } else {
                let path = meta.path.to_token_stream().to_string();
                Err(meta.error(format!(
                    "unknown sqlscope struct attribute `{path}`; expected `table`"
                )))
            }
        })?;
    }

    Ok(table_name)
}

fn parse_fields(fields: &Fields) -> Result<Vec<FieldDef>> {
    let Fields::Named(named) = fields else {
        return Err(Error::new_spanned(
            fields,
            "Model can only be derived for structs with named fields",
        ));
    };

    named
        .named
        .iter()
        .map(|field| {
            let name = field
                .ident
                .clone()
                .ok_or_else(|| Error::new_spanned(field, "expected a named field"))?;
            let attrs = parse_field_attrs(&field.attrs)?;
            Ok(FieldDef {
                column_name: attrs.column.unwrap_or_else(|| name.to_string()),
                nullable: is_option(&field.ty),
                ty: field.ty.clone(),
                primary_key: attrs.primary_key,
                computed: attrs.computed,
                skip: attrs.skip,
                name,
            })
        })
        .collect()
}

#[derive(Default)]
struct FieldAttrs {
    column: Option<String>,
    primary_key: bool,
    computed: bool,
    skip: bool,
}

fn parse_field_attrs(attrs: &[Attribute]) -> Result<FieldAttrs> {
    let mut result = FieldAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("sqlscope") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            let path = &meta.path;

            if path.is_ident("primary_key") {
                result.primary_key = true;
            } else if path.is_ident("computed") {
                result.computed = true;
            } else if path.is_ident("skip") {
                result.skip = true;
            } else if path.is_ident("column") {
                let value: Lit = meta.value()?.parse()?;
                if let Lit::Str(lit_str) = value {
                    result.column = Some(lit_str.value());
                } else {
                    return Err(Error::new_spanned(
                        value,
                        "expected string literal for column name",
                    ));
                }
            } else {
                let name = path.to_token_stream().to_string();
                return Err(meta.error(format!(
                    "unknown sqlscope field attribute `{name}`; expected one of \
                     `primary_key`, `column`, `computed`, `skip`"
                )));
            }
            Ok(())
        })?;
    }

    Ok(result)
}

/// Is the type spelled `Option<...>`?
pub fn is_option(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    path.qself.is_none()
        && path
            .path
            .segments
            .last()
            .is_some_and(|seg| seg.ident == "Option")
}

/// Convert a type name to snake_case (e.g., `UserProfile` -> `user_profile`).
fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let chars: Vec<char> = s.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                let next = chars.get(i + 1).copied();
                // Word boundary, or the last capital of an acronym before a word.
                if prev.is_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_uppercase() && next.is_some_and(char::is_lowercase))
                {
                    result.push('_');
                }
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }

    result
}

/// Simple English pluralization of the last word of a snake_case name.
fn pluralize(name: &str) -> String {
    let (head, word) = match name.rfind('_') {
        Some(idx) => name.split_at(idx + 1),
        None => ("", name),
    };

    let plural = match word {
        "" => String::new(),
        "person" => "people".to_string(),
        "child" => "children".to_string(),
        "man" => "men".to_string(),
        "woman" => "women".to_string(),
        "mouse" => "mice".to_string(),
        "datum" => "data".to_string(),
        "index" => "indices".to_string(),
        _ if word.ends_with('s')
            || word.ends_with('x')
            || word.ends_with('z')
            || word.ends_with("ch")
            || word.ends_with("sh") =>
        {
            format!("{word}es")
        }
        _ => match word.strip_suffix('y') {
            Some(stem) if stem.chars().last().is_some_and(|c| !"aeiou".contains(c)) => {
                format!("{stem}ies")
            }
            _ => format!("{word}s"),
        },
    };

    format!("{head}{plural}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn snake_case_names() {
        assert_eq!(to_snake_case("User"), "user");
        assert_eq!(to_snake_case("UserProfile"), "user_profile");
        assert_eq!(to_snake_case("HTTPRequest"), "http_request");
        assert_eq!(to_snake_case("Order2Item"), "order2_item");
    }

    #[test]
    fn pluralized_table_names() {
        assert_eq!(pluralize("user"), "users");
        assert_eq!(pluralize("user_profile"), "user_profiles");
        assert_eq!(pluralize("person"), "people");
        assert_eq!(pluralize("category"), "categories");
        assert_eq!(pluralize("key"), "keys");
        assert_eq!(pluralize("address"), "addresses");
        assert_eq!(pluralize("box"), "boxes");
    }

    #[test]
    fn defaults_from_struct_name() {
        let input: DeriveInput = parse_quote! {
            struct CreditCard {
                id: i64,
                number: String,
                deleted_at: Option<i64>,
            }
        };
        let model = parse_model(&input).unwrap();
        assert_eq!(model.table_name, "credit_cards");
        assert!(model.fields[0].primary_key);
        assert!(model.fields[2].nullable);
        assert!(!model.fields[1].nullable);
    }

    #[test]
    fn explicit_attributes() {
        let input: DeriveInput = parse_quote! {
            #[sqlscope(table = "people")]
            struct User {
                #[sqlscope(primary_key, column = "user_id")]
                key: i64,
                id: i64,
                #[sqlscope(computed)]
                score: i32,
                #[sqlscope(skip)]
                cache: Vec<u8>,
            }
        };
        let model = parse_model(&input).unwrap();
        assert_eq!(model.table_name, "people");
        assert_eq!(model.fields[0].column_name, "user_id");
        assert!(model.fields[0].primary_key);
        assert!(!model.fields[1].primary_key);
        assert!(model.fields[2].computed);
        assert_eq!(model.mapped_fields().count(), 3);
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let input: DeriveInput = parse_quote! {
            struct User {
                #[sqlscope(unique)]
                id: i64,
            }
        };
        let err = parse_model(&input).unwrap_err();
        assert!(err.to_string().contains("unknown sqlscope field attribute"));
    }

    #[test]
    fn enums_are_rejected() {
        let input: DeriveInput = parse_quote! {
            enum Status { On, Off }
        };
        assert!(parse_model(&input).is_err());
    }
}
