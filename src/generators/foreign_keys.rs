use crate::model::{convention_name, ConventionKind, ForeignKeyRecord};
use crate::schema::{ForeignKeyDescriptor, ReferentialAction};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct ForeignKeyExtractor {
    ignore_foreign_key_names: bool,
}

impl ForeignKeyExtractor {
    pub fn new(ignore_foreign_key_names: bool) -> Self {
        Self {
            ignore_foreign_key_names,
        }
    }

    /// Normalize a table's foreign keys.
    ///
    /// Composite keys are reduced to their first column pair.
    pub fn extract(&self, table: &str, raw_foreign_keys: &[ForeignKeyDescriptor]) -> Vec<ForeignKeyRecord> {
        raw_foreign_keys
            .iter()
            .filter_map(|raw| self.to_record(table, raw))
            .collect()
    }

    fn to_record(&self, table: &str, raw: &ForeignKeyDescriptor) -> Option<ForeignKeyRecord> {
        let (Some(local_column), Some(referenced_column)) =
            (raw.local_columns.first(), raw.referenced_columns.first())
        else {
            warn!(table, constraint = %raw.name, "Skipping foreign key without columns");
            return None;
        };

        if raw.local_columns.len() > 1 {
            debug!(
                table,
                constraint = %raw.name,
                columns = raw.local_columns.len(),
                "Composite foreign key reduced to its first column"
            );
        }

        let default_name = convention_name(
            table,
            std::slice::from_ref(local_column),
            ConventionKind::Foreign,
        );
        let explicit_name = if self.ignore_foreign_key_names || raw.name == default_name {
            None
        } else {
            Some(raw.name.clone())
        };

        Some(ForeignKeyRecord {
            local_column: local_column.clone(),
            referenced_column: referenced_column.clone(),
            referenced_table: raw.referenced_table.clone(),
            on_update: action(table, raw, "onUpdate"),
            on_delete: action(table, raw, "onDelete"),
            explicit_name,
        })
    }
}

fn action(table: &str, raw: &ForeignKeyDescriptor, key: &str) -> ReferentialAction {
    match raw.option(key) {
        None => ReferentialAction::default(),
        Some(value) => ReferentialAction::parse(value).unwrap_or_else(|| {
            warn!(table, constraint = %raw.name, key, value, "Unknown referential action, using RESTRICT");
            ReferentialAction::default()
        }),
    }
}
