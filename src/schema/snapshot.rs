use super::{ColumnDescriptor, ForeignKeyDescriptor, IndexDescriptor, SchemaIntrospector};
use crate::error::{ErrorContext, MigenError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// In-memory copy of a schema, usable as an introspection source.
///
/// Snapshots are what live introspection produces, and they round-trip through JSON so
/// migrations can be generated without a database connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    #[serde(default)]
    pub table_prefix: String,
    #[serde(default)]
    pub tables: IndexMap<String, TableSnapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    pub indexes: Vec<IndexDescriptor>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
    #[serde(default)]
    pub enum_values: BTreeMap<String, Vec<String>>,
}

impl SchemaSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    pub fn with_table(mut self, name: impl Into<String>, table: TableSnapshot) -> Self {
        self.tables.insert(name.into(), table);
        self
    }

    pub fn insert_table(&mut self, name: impl Into<String>, table: TableSnapshot) {
        self.tables.insert(name.into(), table);
    }

    pub fn table(&self, name: &str) -> Option<&TableSnapshot> {
        self.tables.get(name)
    }

    /// Load a snapshot previously written with [`SchemaSnapshot::save_to_file`]
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => MigenError::FileNotFound(path.to_path_buf()),
            _ => MigenError::FileRead {
                path: path.to_path_buf(),
                message: "could not read schema snapshot".to_string(),
                source,
            },
        })?;
        let snapshot: SchemaSnapshot = serde_json::from_str(&content).file_context(path)?;
        Ok(snapshot)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).file_context(path)?;
        fs::write(path, content).file_context(path)?;
        Ok(())
    }
}

impl TableSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    pub fn index(mut self, index: IndexDescriptor) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn foreign_key(mut self, foreign_key: ForeignKeyDescriptor) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    pub fn enum_values(mut self, column: impl Into<String>, values: &[&str]) -> Self {
        self.enum_values.insert(
            column.into(),
            values.iter().map(|v| v.to_string()).collect(),
        );
        self
    }
}

impl SchemaIntrospector for SchemaSnapshot {
    fn list_tables(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    fn list_columns(&self, table: &str) -> Vec<ColumnDescriptor> {
        self.table(table).map(|t| t.columns.clone()).unwrap_or_default()
    }

    fn list_indexes(&self, table: &str) -> Vec<IndexDescriptor> {
        self.table(table).map(|t| t.indexes.clone()).unwrap_or_default()
    }

    fn list_foreign_keys(&self, table: &str) -> Vec<ForeignKeyDescriptor> {
        self.table(table)
            .map(|t| t.foreign_keys.clone())
            .unwrap_or_default()
    }

    fn enum_values(&self, table: &str, column: &str) -> Vec<String> {
        self.table(table)
            .and_then(|t| t.enum_values.get(column).cloned())
            .unwrap_or_default()
    }

    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }
}
