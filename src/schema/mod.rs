//! Raw schema metadata as reported by an introspection source.
//!
//! Everything in this module is source-shaped: types are the generic raw names the
//! introspection layer normalizes to (`integer`, `bigint`, `datetime`, `string`, ...), not the
//! migration DSL's semantic types. Translation happens in [`crate::generators`].

pub mod snapshot;

pub use snapshot::{SchemaSnapshot, TableSnapshot};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single column as reported by the introspection layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Generic raw type name (`integer`, `string`, `datetime`, `enum`, ...)
    pub raw_type: String,
    /// Declared type as the database spells it, e.g. `enum('draft','published')`
    #[serde(default)]
    pub native_type: Option<String>,
    #[serde(default)]
    pub length: Option<u32>,
    #[serde(default = "default_precision")]
    pub precision: u32,
    #[serde(default)]
    pub scale: u32,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub unsigned: bool,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub fixed_width: bool,
}

fn default_precision() -> u32 {
    10
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, raw_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_type: raw_type.into(),
            native_type: None,
            length: None,
            precision: default_precision(),
            scale: 0,
            nullable: false,
            default: None,
            unsigned: false,
            auto_increment: false,
            fixed_width: false,
        }
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = precision;
        self.scale = scale;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.fixed_width = true;
        self
    }

    pub fn native(mut self, native_type: impl Into<String>) -> Self {
        self.native_type = Some(native_type.into());
        self
    }
}

/// An index as reported by the introspection layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub is_primary: bool,
    #[serde(default)]
    pub is_unique: bool,
}

impl IndexDescriptor {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            is_primary: false,
            is_unique: false,
        }
    }

    pub fn primary(mut self) -> Self {
        self.is_primary = true;
        self.is_unique = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }
}

/// A foreign key constraint as reported by the introspection layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDescriptor {
    pub name: String,
    pub local_columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    /// Source-specific options; only `onUpdate` and `onDelete` are read
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl ForeignKeyDescriptor {
    pub fn new(
        name: impl Into<String>,
        local_column: impl Into<String>,
        referenced_table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            local_columns: vec![local_column.into()],
            referenced_table: referenced_table.into(),
            referenced_columns: vec![referenced_column.into()],
            options: BTreeMap::new(),
        }
    }

    pub fn on_update(mut self, action: impl Into<String>) -> Self {
        self.options.insert("onUpdate".to_string(), action.into());
        self
    }

    pub fn on_delete(mut self, action: impl Into<String>) -> Self {
        self.options.insert("onDelete".to_string(), action.into());
        self
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }
}

/// Standard referential actions for foreign key constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReferentialAction {
    #[default]
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
    NoAction,
}

impl ReferentialAction {
    /// Parse a referential action as sources commonly spell it
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().replace('_', " ").as_str() {
            "RESTRICT" => Some(Self::Restrict),
            "CASCADE" => Some(Self::Cascade),
            "SET NULL" => Some(Self::SetNull),
            "SET DEFAULT" => Some(Self::SetDefault),
            "NO ACTION" => Some(Self::NoAction),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
            Self::NoAction => "NO ACTION",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Read access to a relational schema.
///
/// Implementations are synchronous from the generator's point of view; sources that need
/// asynchronous I/O load a [`SchemaSnapshot`] up front (see [`crate::db::PgIntrospector`]).
pub trait SchemaIntrospector {
    fn list_tables(&self) -> Vec<String>;

    /// Columns in ordinal order; empty when the table does not exist
    fn list_columns(&self, table: &str) -> Vec<ColumnDescriptor>;

    fn list_indexes(&self, table: &str) -> Vec<IndexDescriptor>;

    fn list_foreign_keys(&self, table: &str) -> Vec<ForeignKeyDescriptor>;

    /// Best-effort enum value lookup; an empty list means unknown
    fn enum_values(&self, table: &str, column: &str) -> Vec<String>;

    /// Prefix the connection prepends to every table name
    fn table_prefix(&self) -> &str {
        ""
    }
}
