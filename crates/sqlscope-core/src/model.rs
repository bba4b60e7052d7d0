//! Record types mapped to database tables.
//!
//! `Model` is the static, per-type contract generated by `#[derive(Model)]`.
//! `Record` is its object-safe face, used wherever a record is handled
//! without knowing its concrete type.

use crate::Result;
use crate::field::FieldInfo;
use crate::value::Value;

/// Conventional name of the creation timestamp field.
pub const CREATED_AT: &str = "created_at";
/// Conventional name of the update timestamp field.
pub const UPDATED_AT: &str = "updated_at";
/// Conventional name of the soft-delete timestamp field.
pub const DELETED_AT: &str = "deleted_at";

/// Table name and field table of a record type.
#[derive(Debug, Clone, Copy)]
pub struct ModelMeta {
    pub table_name: &'static str,
    pub fields: &'static [FieldInfo],
}

impl ModelMeta {
    pub const fn new(table_name: &'static str, fields: &'static [FieldInfo]) -> Self {
        Self { table_name, fields }
    }

    /// The primary key field, if the type declares one.
    pub fn primary_field(&self) -> Option<&'static FieldInfo> {
        self.fields.iter().find(|f| f.primary_key)
    }

    /// Look up a field by Rust name or column name.
    pub fn field(&self, name: &str) -> Option<&'static FieldInfo> {
        self.fields.iter().find(|f| f.matches(name))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// Types that map to a database table.
///
/// # Example
///
/// ```ignore
/// use sqlscope::Model;
///
/// #[derive(Debug, Default, Model)]
/// #[sqlscope(table = "users")]
/// struct User {
///     #[sqlscope(primary_key)]
///     id: i64,
///     name: String,
///     deleted_at: Option<i64>,
/// }
/// ```
pub trait Model: Default + Send + Sync + 'static {
    /// The name of the database table.
    const TABLE_NAME: &'static str;

    /// Field metadata for every mapped column, in declaration order.
    fn fields() -> &'static [FieldInfo];

    /// Read a field by Rust name or column name.
    fn get_field(&self, name: &str) -> Option<Value>;

    /// Write a field by Rust name or column name.
    fn set_field(&mut self, name: &str, value: Value) -> Result<()>;

    fn meta() -> ModelMeta {
        ModelMeta::new(Self::TABLE_NAME, Self::fields())
    }
}

/// Object-safe access to a record of any model type.
pub trait Record {
    /// Table metadata of the record's model.
    fn record_meta(&self) -> ModelMeta;

    fn field_value(&self, name: &str) -> Option<Value>;

    fn set_field_value(&mut self, name: &str, value: Value) -> Result<()>;
}

impl<M: Model> Record for M {
    fn record_meta(&self) -> ModelMeta {
        M::meta()
    }

    fn field_value(&self, name: &str) -> Option<Value> {
        self.get_field(name)
    }

    fn set_field_value(&mut self, name: &str, value: Value) -> Result<()> {
        self.set_field(name, value)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::FromValue;
    use crate::error::Error;

    #[derive(Debug, Default, Clone, PartialEq)]
    pub(crate) struct Note {
        pub id: i64,
        pub body: String,
        pub deleted_at: Option<i64>,
    }

    static NOTE_FIELDS: [FieldInfo; 3] = [
        FieldInfo::new("id", "id").primary_key(true),
        FieldInfo::new("body", "body"),
        FieldInfo::new("deleted_at", "deleted_at").nullable(true),
    ];

    impl Model for Note {
        const TABLE_NAME: &'static str = "notes";

        fn fields() -> &'static [FieldInfo] {
            &NOTE_FIELDS
        }

        fn get_field(&self, name: &str) -> Option<Value> {
            match name {
                "id" => Some(Value::from(self.id)),
                "body" => Some(Value::from(self.body.clone())),
                "deleted_at" => Some(Value::from(self.deleted_at)),
                _ => None,
            }
        }

        fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
            match name {
                "id" => self.id = FromValue::from_value(&value)?,
                "body" => self.body = FromValue::from_value(&value)?,
                "deleted_at" => self.deleted_at = FromValue::from_value(&value)?,
                _ => return Err(Error::unknown_field("Note", name)),
            }
            Ok(())
        }
    }

    #[test]
    fn meta_lookups() {
        let meta = Note::meta();
        assert_eq!(meta.table_name, "notes");
        assert_eq!(meta.primary_field().map(|f| f.name), Some("id"));
        assert!(meta.has_field(DELETED_AT));
        assert!(!meta.has_field(UPDATED_AT));
    }

    #[test]
    fn record_is_object_safe() {
        let mut note = Note::default();
        let record: &mut dyn Record = &mut note;
        record.set_field_value("body", Value::from("hi")).unwrap();
        record
            .set_field_value("deleted_at", Value::Timestamp(12))
            .unwrap();
        assert_eq!(record.field_value("body"), Some(Value::from("hi")));
        assert_eq!(record.record_meta().table_name, Note::meta().table_name);
        assert!(record.set_field_value("nope", Value::Null).is_err());
        assert_eq!(note.deleted_at, Some(12));
    }
}
