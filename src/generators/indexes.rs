use crate::model::{convention_name, IndexKind, IndexRecord};
use crate::schema::IndexDescriptor;
use indexmap::IndexMap;
use tracing::debug;

/// Indexes of one table, split by how they are rendered
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedIndexes {
    /// Single-column indexes keyed by column, attached to that column's statement
    pub single: IndexMap<String, IndexRecord>,
    /// Multi-column indexes, rendered as standalone statements
    pub multi: Vec<IndexRecord>,
}

impl ClassifiedIndexes {
    pub fn for_column(&self, column: &str) -> Option<&IndexRecord> {
        self.single.get(column)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IndexClassifier {
    ignore_index_names: bool,
}

impl IndexClassifier {
    pub fn new(ignore_index_names: bool) -> Self {
        Self { ignore_index_names }
    }

    pub fn classify(&self, table: &str, raw_indexes: &[IndexDescriptor]) -> ClassifiedIndexes {
        let mut classified = ClassifiedIndexes::default();

        for raw in raw_indexes {
            if raw.columns.is_empty() {
                debug!(table, index = %raw.name, "Skipping index without columns");
                continue;
            }

            let record = self.to_record(table, raw);
            if record.columns.len() == 1 {
                classified.single.insert(record.columns[0].clone(), record);
            } else {
                classified.multi.push(record);
            }
        }

        classified
    }

    fn to_record(&self, table: &str, raw: &IndexDescriptor) -> IndexRecord {
        let kind = if raw.is_primary {
            IndexKind::Primary
        } else if raw.is_unique {
            IndexKind::Unique
        } else {
            IndexKind::Index
        };

        let explicit_name = if self.ignore_index_names
            || raw.name == convention_name(table, &raw.columns, kind.into())
        {
            None
        } else {
            Some(raw.name.replace(' ', ""))
        };

        IndexRecord {
            kind,
            columns: raw.columns.clone(),
            explicit_name,
        }
    }
}
