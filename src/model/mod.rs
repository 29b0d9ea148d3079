//! Normalized records produced from raw schema metadata and consumed by the renderer.
//!
//! Records are rebuilt for every table on every run. The builder that creates a record is its
//! only mutator; the renderer only reads them.

pub mod naming;

pub use naming::{convention_name, ConventionKind};

use crate::schema::ReferentialAction;
use indexmap::IndexMap;
use std::fmt;

/// Kind of an index as the migration DSL names it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexKind {
    Primary,
    Unique,
    Index,
}

impl IndexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexKind::Primary => "primary",
            IndexKind::Unique => "unique",
            IndexKind::Index => "index",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRecord {
    pub kind: IndexKind,
    pub columns: Vec<String>,
    /// Present only when the stored name differs from the convention name
    pub explicit_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRecord {
    pub local_column: String,
    pub referenced_column: String,
    pub referenced_table: String,
    pub on_update: ReferentialAction,
    pub on_delete: ReferentialAction,
    /// Present only when the stored name differs from `{table}_{column}_foreign`
    pub explicit_name: Option<String>,
}

/// Semantic column type, named after the migration DSL method that creates it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Increments,
    TinyInteger,
    SmallInteger,
    Integer,
    BigInteger,
    Decimal,
    Float,
    Double,
    Boolean,
    String,
    Char,
    Text,
    Enum,
    Date,
    DateTime,
    DateTimeTz,
    Time,
    Timestamp,
    Binary,
    Uuid,
    SoftDeletes,
    Timestamps,
    /// Standalone multi-column index statement
    Index(IndexKind),
    /// Any raw type without a dedicated mapping, passed through unchanged
    Other(String),
}

impl TypeTag {
    /// Map a raw introspected type name onto its semantic type
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "tinyint" => TypeTag::TinyInteger,
            "smallint" => TypeTag::SmallInteger,
            "bigint" => TypeTag::BigInteger,
            "datetime" => TypeTag::DateTime,
            "datetimetz" => TypeTag::DateTimeTz,
            "blob" => TypeTag::Binary,
            "guid" => TypeTag::Uuid,
            "integer" => TypeTag::Integer,
            "decimal" => TypeTag::Decimal,
            "float" => TypeTag::Float,
            "double" => TypeTag::Double,
            "boolean" => TypeTag::Boolean,
            "string" => TypeTag::String,
            "text" => TypeTag::Text,
            "date" => TypeTag::Date,
            "time" => TypeTag::Time,
            "enum" => TypeTag::Enum,
            other => TypeTag::Other(other.to_string()),
        }
    }

    /// Name of the DSL method emitting this type
    pub fn method(&self) -> &str {
        match self {
            TypeTag::Increments => "increments",
            TypeTag::TinyInteger => "tinyInteger",
            TypeTag::SmallInteger => "smallInteger",
            TypeTag::Integer => "integer",
            TypeTag::BigInteger => "bigInteger",
            TypeTag::Decimal => "decimal",
            TypeTag::Float => "float",
            TypeTag::Double => "double",
            TypeTag::Boolean => "boolean",
            TypeTag::String => "string",
            TypeTag::Char => "char",
            TypeTag::Text => "text",
            TypeTag::Enum => "enum",
            TypeTag::Date => "date",
            TypeTag::DateTime => "dateTime",
            TypeTag::DateTimeTz => "dateTimeTz",
            TypeTag::Time => "time",
            TypeTag::Timestamp => "timestamp",
            TypeTag::Binary => "binary",
            TypeTag::Uuid => "uuid",
            TypeTag::SoftDeletes => "softDeletes",
            TypeTag::Timestamps => "timestamps",
            TypeTag::Index(kind) => kind.as_str(),
            TypeTag::Other(raw) => raw.as_str(),
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            TypeTag::TinyInteger | TypeTag::SmallInteger | TypeTag::Integer | TypeTag::BigInteger
        )
    }

    pub fn is_precision_numeric(&self) -> bool {
        matches!(self, TypeTag::Decimal | TypeTag::Float | TypeTag::Double)
    }

    /// Types whose default values are always quoted, numeric or not
    pub fn is_string_like(&self) -> bool {
        matches!(
            self,
            TypeTag::String | TypeTag::Char | TypeTag::Text | TypeTag::Enum
        )
    }
}

/// Positional argument following the field name in a DSL call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Auto-increment flag on integer columns
    AutoIncrement,
    Length(u32),
    Precision(u32),
    Scale(u32),
    Values(Vec<String>),
    /// Explicit index name on a multi-column index
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultValue {
    /// Database expression, emitted unquoted inside a raw-expression call
    Raw(String),
    /// Emitted as a quoted string literal
    Quoted(String),
    /// Numeric literal emitted as-is
    Bare(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDecorator {
    pub kind: IndexKind,
    pub name: Option<String>,
}

/// One chained modifier, in rendering order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decorator {
    Unsigned,
    Default(DefaultValue),
    Nullable,
    Index(IndexDecorator),
}

/// Decorator slots of a field.
///
/// Each modifier has a fixed slot, so rendering order (unsigned, default, nullable, index) does
/// not depend on the order in which the builder set them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decorators {
    unsigned: bool,
    default: Option<DefaultValue>,
    nullable: bool,
    index: Option<IndexDecorator>,
}

impl Decorators {
    pub fn set_unsigned(&mut self) {
        self.unsigned = true;
    }

    pub fn set_default(&mut self, value: DefaultValue) {
        self.default = Some(value);
    }

    pub fn set_nullable(&mut self) {
        self.nullable = true;
    }

    pub fn set_index(&mut self, kind: IndexKind, name: Option<String>) {
        self.index = Some(IndexDecorator { kind, name });
    }

    pub fn is_unsigned(&self) -> bool {
        self.unsigned
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn index(&self) -> Option<&IndexDecorator> {
        self.index.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        !self.unsigned && self.default.is_none() && !self.nullable && self.index.is_none()
    }

    /// Decorators in rendering order
    pub fn to_vec(&self) -> Vec<Decorator> {
        let mut out = Vec::new();
        if self.unsigned {
            out.push(Decorator::Unsigned);
        }
        if let Some(default) = &self.default {
            out.push(Decorator::Default(default.clone()));
        }
        if self.nullable {
            out.push(Decorator::Nullable);
        }
        if let Some(index) = &self.index {
            out.push(Decorator::Index(index.clone()));
        }
        out
    }
}

/// What a field statement is keyed on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldName {
    Column(String),
    /// Column list of a multi-column index
    Columns(Vec<String>),
    /// Helpers such as `timestamps()` and `softDeletes()`
    Unnamed,
}

impl FieldName {
    pub fn is_unnamed(&self) -> bool {
        matches!(self, FieldName::Unnamed)
    }
}

/// One column or one multi-column index, as a single migration statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: FieldName,
    pub type_tag: TypeTag,
    pub args: Vec<Arg>,
    pub decorators: Decorators,
}

impl Field {
    pub fn column(name: impl Into<String>, type_tag: TypeTag) -> Self {
        Self {
            name: FieldName::Column(name.into()),
            type_tag,
            args: Vec::new(),
            decorators: Decorators::default(),
        }
    }

    pub fn unnamed(type_tag: TypeTag) -> Self {
        Self {
            name: FieldName::Unnamed,
            type_tag,
            args: Vec::new(),
            decorators: Decorators::default(),
        }
    }

    pub fn multi_column_index(index: &IndexRecord) -> Self {
        Self {
            name: FieldName::Columns(index.columns.clone()),
            type_tag: TypeTag::Index(index.kind),
            args: index
                .explicit_name
                .iter()
                .map(|name| Arg::Name(name.clone()))
                .collect(),
            decorators: Decorators::default(),
        }
    }

    pub fn column_name(&self) -> Option<&str> {
        match &self.name {
            FieldName::Column(name) => Some(name),
            _ => None,
        }
    }
}

/// Ordered field set of one table.
///
/// Column statements are keyed by the column they came from; a helper that replaced a column
/// (`timestamps`, `softDeletes`) keeps that column's key and position. Multi-column indexes
/// follow the columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableFields {
    columns: IndexMap<String, Field>,
    indexes: Vec<Field>,
}

impl TableFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for a column key, keeping its original position
    pub fn insert(&mut self, key: impl Into<String>, field: Field) {
        self.columns.insert(key.into(), field);
    }

    pub fn push_index(&mut self, field: Field) {
        self.indexes.push(field);
    }

    pub fn get(&self, key: &str) -> Option<&Field> {
        self.columns.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.columns.contains_key(key)
    }

    /// Column keys in table order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// All statements: columns first, then multi-column indexes
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.columns.values().chain(self.indexes.iter())
    }

    pub fn len(&self) -> usize {
        self.columns.len() + self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.indexes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_map() {
        assert_eq!(TypeTag::from_raw("tinyint"), TypeTag::TinyInteger);
        assert_eq!(TypeTag::from_raw("smallint"), TypeTag::SmallInteger);
        assert_eq!(TypeTag::from_raw("bigint"), TypeTag::BigInteger);
        assert_eq!(TypeTag::from_raw("datetime"), TypeTag::DateTime);
        assert_eq!(TypeTag::from_raw("blob"), TypeTag::Binary);
        assert_eq!(TypeTag::from_raw("json"), TypeTag::Other("json".to_string()));
        assert_eq!(TypeTag::from_raw("json").method(), "json");
        assert_eq!(TypeTag::DateTime.method(), "dateTime");
    }

    #[test]
    fn test_decorator_order_is_fixed() {
        let mut decorators = Decorators::default();
        decorators.set_index(IndexKind::Unique, None);
        decorators.set_nullable();
        decorators.set_default(DefaultValue::Bare("0".to_string()));
        decorators.set_unsigned();

        assert_eq!(
            decorators.to_vec(),
            vec![
                Decorator::Unsigned,
                Decorator::Default(DefaultValue::Bare("0".to_string())),
                Decorator::Nullable,
                Decorator::Index(IndexDecorator {
                    kind: IndexKind::Unique,
                    name: None
                }),
            ]
        );
    }

    #[test]
    fn test_table_fields_replace_keeps_position() {
        let mut fields = TableFields::new();
        fields.insert("id", Field::column("id", TypeTag::Increments));
        fields.insert("updated_at", Field::column("updated_at", TypeTag::DateTime));
        fields.insert("title", Field::column("title", TypeTag::String));
        fields.insert("updated_at", Field::unnamed(TypeTag::Timestamps));

        let keys: Vec<&str> = fields.keys().collect();
        assert_eq!(keys, vec!["id", "updated_at", "title"]);
        assert_eq!(
            fields.get("updated_at").unwrap().type_tag,
            TypeTag::Timestamps
        );
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn test_multi_column_index_field() {
        let index = IndexRecord {
            kind: IndexKind::Unique,
            columns: vec!["team_id".to_string(), "user_id".to_string()],
            explicit_name: Some("membership".to_string()),
        };
        let field = Field::multi_column_index(&index);
        assert_eq!(field.type_tag, TypeTag::Index(IndexKind::Unique));
        assert_eq!(field.args, vec![Arg::Name("membership".to_string())]);
        assert!(field.column_name().is_none());
    }
}
