//! Field metadata and field descriptors.

/// Static metadata about a model field/column.
///
/// One table of these is generated per record type by `#[derive(Model)]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// Rust field name
    pub name: &'static str,
    /// Database column name (may differ from field name)
    pub column_name: &'static str,
    /// Rust type of the field, as written in the struct
    pub rust_type: &'static str,
    /// Whether this field is nullable (`Option<T>`)
    pub nullable: bool,
    /// Whether this is the primary key
    pub primary_key: bool,
    /// Whether this field takes part in normal persistence.
    ///
    /// Computed fields are scanned from query results but never updated.
    pub normal: bool,
}

impl FieldInfo {
    /// Create a new, normal, non-key field.
    pub const fn new(name: &'static str, column_name: &'static str) -> Self {
        Self {
            name,
            column_name,
            rust_type: "",
            nullable: false,
            primary_key: false,
            normal: true,
        }
    }

    /// Set the database column name.
    pub const fn column(mut self, name: &'static str) -> Self {
        self.column_name = name;
        self
    }

    pub const fn rust_type(mut self, ty: &'static str) -> Self {
        self.rust_type = ty;
        self
    }

    pub const fn nullable(mut self, value: bool) -> Self {
        self.nullable = value;
        self
    }

    /// Mark this field as the primary key.
    pub const fn primary_key(mut self, value: bool) -> Self {
        self.primary_key = value;
        self
    }

    /// Mark this field as part of normal persistence (false for computed fields).
    pub const fn normal(mut self, value: bool) -> Self {
        self.normal = value;
        self
    }

    /// Does this field answer to `name`, by Rust field name or column name?
    pub fn matches(&self, name: &str) -> bool {
        self.name == name || self.column_name == name
    }
}

/// A field of one concrete record: its metadata plus its current value.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub info: &'static FieldInfo,
    pub value: crate::Value,
}

impl Field {
    pub fn new(info: &'static FieldInfo, value: crate::Value) -> Self {
        Self { info, value }
    }

    pub fn name(&self) -> &'static str {
        self.info.name
    }

    pub fn column_name(&self) -> &'static str {
        self.info.column_name
    }

    pub fn is_primary_key(&self) -> bool {
        self.info.primary_key
    }

    pub fn is_normal(&self) -> bool {
        self.info.normal
    }

    /// Is the current value NULL or the zero value of its type?
    pub fn is_blank(&self) -> bool {
        self.value.is_blank()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    static ID: FieldInfo = FieldInfo::new("id", "id").primary_key(true).rust_type("i64");
    static TOTAL: FieldInfo = FieldInfo::new("total", "order_total").normal(false);

    #[test]
    fn builder_sets_flags() {
        assert!(ID.primary_key);
        assert!(ID.normal);
        assert_eq!(ID.rust_type, "i64");
        assert!(!TOTAL.normal);
        assert!(!TOTAL.primary_key);
    }

    #[test]
    fn matches_field_or_column_name() {
        assert!(TOTAL.matches("total"));
        assert!(TOTAL.matches("order_total"));
        assert!(!TOTAL.matches("id"));
    }

    #[test]
    fn field_descriptor_blank() {
        assert!(Field::new(&ID, Value::BigInt(0)).is_blank());
        let field = Field::new(&ID, Value::BigInt(3));
        assert!(!field.is_blank());
        assert!(field.is_primary_key());
        assert_eq!(field.column_name(), "id");
    }
}
