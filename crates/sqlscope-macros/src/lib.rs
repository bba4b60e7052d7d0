//! Procedural macros for sqlscope.
//!
//! `#[derive(Model)]` turns a struct with named fields into a record type:
//! it generates the static field table, by-name field access, and the
//! destination impls that let the struct, `Vec<Struct>` and
//! `Vec<Box<Struct>>` receive query results.
//!
//! Generated code refers to `sqlscope_core`, so the crate (or a `use` of its
//! re-export from `sqlscope`) must be in scope where the derive is used.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, quote};

mod parse;
mod validate;

use parse::{ModelDef, parse_model};

/// Derive macro for the `Model` trait.
///
/// # Attributes
///
/// - `#[sqlscope(table = "name")]` - Override the table name (defaults to the
///   pluralized snake_case struct name)
/// - `#[sqlscope(primary_key)]` - Mark the primary key (defaults to a field named `id`)
/// - `#[sqlscope(column = "name")]` - Override the column name
/// - `#[sqlscope(computed)]` - Read from query results, left out of updates
/// - `#[sqlscope(skip)]` - Not mapped to any column
///
/// # Example
///
/// ```ignore
/// use sqlscope::Model;
///
/// #[derive(Debug, Default, Model)]
/// struct User {
///     id: i64,
///     name: String,
///     #[sqlscope(column = "mail")]
///     email: String,
///     created_at: Option<i64>,
///     deleted_at: Option<i64>,
/// }
/// ```
#[proc_macro_derive(Model, attributes(sqlscope))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as syn::DeriveInput);

    let model = match parse_model(&input) {
        Ok(m) => m,
        Err(e) => return e.to_compile_error().into(),
    };

    if let Err(e) = validate::validate_model(&model) {
        return e.to_compile_error().into();
    }

    generate_model_impl(&model).into()
}

/// Match arm pattern for a field: its Rust name, and its column name if different.
fn field_pattern(name: &str, column: &str) -> TokenStream2 {
    if name == column {
        quote! { #name }
    } else {
        quote! { #name | #column }
    }
}

fn generate_model_impl(model: &ModelDef) -> TokenStream2 {
    let name = &model.name;
    let name_str = name.to_string();
    let table_name = &model.table_name;

    let field_infos = model.mapped_fields().map(|field| {
        let field_name = field.name.to_string();
        let column = &field.column_name;
        let rust_type = field.ty.to_token_stream().to_string().replace(' ', "");
        let nullable = field.nullable;
        let primary_key = field.primary_key;
        let normal = !field.computed;
        quote! {
            sqlscope_core::FieldInfo::new(#field_name, #column)
                .rust_type(#rust_type)
                .nullable(#nullable)
                .primary_key(#primary_key)
                .normal(#normal)
        }
    });
    let field_count = model.mapped_fields().count();

    let get_arms = model.mapped_fields().map(|field| {
        let ident = &field.name;
        let pattern = field_pattern(&ident.to_string(), &field.column_name);
        quote! {
            #pattern => ::std::option::Option::Some(
                sqlscope_core::Value::from(::std::clone::Clone::clone(&self.#ident)),
            ),
        }
    });

    let set_arms = model.mapped_fields().map(|field| {
        let ident = &field.name;
        let pattern = field_pattern(&ident.to_string(), &field.column_name);
        quote! {
            #pattern => {
                self.#ident = sqlscope_core::FromValue::from_value(&value)?;
            }
        }
    });

    quote! {
        impl sqlscope_core::Model for #name {
            const TABLE_NAME: &'static str = #table_name;

            fn fields() -> &'static [sqlscope_core::FieldInfo] {
                static FIELDS: [sqlscope_core::FieldInfo; #field_count] = [#(#field_infos),*];
                &FIELDS
            }

            fn get_field(&self, name: &str) -> ::std::option::Option<sqlscope_core::Value> {
                match name {
                    #(#get_arms)*
                    _ => ::std::option::Option::None,
                }
            }

            fn set_field(
                &mut self,
                name: &str,
                value: sqlscope_core::Value,
            ) -> sqlscope_core::Result<()> {
                match name {
                    #(#set_arms)*
                    _ => return ::std::result::Result::Err(
                        sqlscope_core::Error::unknown_field(#name_str, name),
                    ),
                }
                ::std::result::Result::Ok(())
            }
        }

        impl sqlscope_core::Destination for #name {
            fn shape(&mut self) -> sqlscope_core::Shape<'_> {
                sqlscope_core::Shape::Record(self)
            }
        }

        impl sqlscope_core::Element for #name {
            fn element_meta() -> sqlscope_core::ModelMeta {
                <#name as sqlscope_core::Model>::meta()
            }

            fn new_element() -> Self {
                ::std::default::Default::default()
            }

            fn as_record(&mut self) -> &mut dyn sqlscope_core::Record {
                self
            }
        }

        impl sqlscope_core::Element for ::std::boxed::Box<#name> {
            fn element_meta() -> sqlscope_core::ModelMeta {
                <#name as sqlscope_core::Model>::meta()
            }

            fn new_element() -> Self {
                ::std::default::Default::default()
            }

            fn as_record(&mut self) -> &mut dyn sqlscope_core::Record {
                &mut **self
            }
        }
    }
}
