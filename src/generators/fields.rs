use super::indexes::{ClassifiedIndexes, IndexClassifier};
use crate::model::{Arg, DefaultValue, Field, TableFields, TypeTag};
use crate::schema::{ColumnDescriptor, SchemaIntrospector};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// Precision and scale the migration framework assumes for `decimal`, `float` and `double`
const DEFAULT_PRECISION: (u32, u32) = (8, 2);

/// Length the migration framework assumes for `string` and `char`
const DEFAULT_STRING_LENGTH: u32 = 255;

const CURRENT_TIMESTAMP: &str = "CURRENT_TIMESTAMP";

/// Builds the normalized field set of a table from its raw column metadata
pub struct ColumnModelBuilder<'a> {
    introspector: &'a dyn SchemaIntrospector,
    classifier: IndexClassifier,
}

/// What the per-column rules decided, before the shared default and nullability rules run
enum ColumnOutcome {
    Emit {
        key: String,
        field: Field,
        nullable: bool,
        attach_index: bool,
    },
    /// Column was folded into an existing entry
    Merged,
}

impl<'a> ColumnModelBuilder<'a> {
    pub fn new(introspector: &'a dyn SchemaIntrospector, ignore_index_names: bool) -> Self {
        Self {
            introspector,
            classifier: IndexClassifier::new(ignore_index_names),
        }
    }

    /// Build the field set of `table`; `None` when the table has no columns
    pub fn build(&self, table: &str) -> Option<TableFields> {
        let columns = self.introspector.list_columns(table);
        if columns.is_empty() {
            debug!(table, "No columns found, skipping table");
            return None;
        }

        let indexes = self
            .classifier
            .classify(table, &self.introspector.list_indexes(table));

        Some(self.build_from(table, &columns, &indexes))
    }

    pub fn build_from(
        &self,
        table: &str,
        columns: &[ColumnDescriptor],
        indexes: &ClassifiedIndexes,
    ) -> TableFields {
        let mut fields = TableFields::new();

        for column in columns {
            let (key, mut field, nullable, attach_index) =
                match self.apply_type_rules(table, column, &mut fields) {
                    ColumnOutcome::Merged => continue,
                    ColumnOutcome::Emit {
                        key,
                        field,
                        nullable,
                        attach_index,
                    } => (key, field, nullable, attach_index),
                };

            if let Some(default) = &column.default {
                let value = default_value(&mut field.type_tag, default);
                field.decorators.set_default(value);
            }

            if nullable {
                field.decorators.set_nullable();
            }

            if attach_index && field.type_tag != TypeTag::Increments {
                if let Some(index) = indexes.for_column(&column.name) {
                    field
                        .decorators
                        .set_index(index.kind, index.explicit_name.clone());
                }
            }

            debug!(table, column = %column.name, type_tag = field.type_tag.method(), "Mapped column");
            fields.insert(key, field);
        }

        for index in &indexes.multi {
            fields.push_index(Field::multi_column_index(index));
        }

        fields
    }

    fn apply_type_rules(
        &self,
        table: &str,
        column: &ColumnDescriptor,
        fields: &mut TableFields,
    ) -> ColumnOutcome {
        let mut field = Field::column(&column.name, TypeTag::from_raw(&column.raw_type));
        let mut nullable = column.nullable;
        let mut attach_index = true;

        if field.type_tag.is_integer() {
            if field.type_tag == TypeTag::Integer && column.unsigned && column.auto_increment {
                field.type_tag = TypeTag::Increments;
                attach_index = false;
            } else {
                if column.unsigned {
                    field.decorators.set_unsigned();
                }
                if column.auto_increment {
                    field.args.push(Arg::AutoIncrement);
                    attach_index = false;
                }
            }
        } else if field.type_tag == TypeTag::Enum {
            field.args.push(Arg::Values(self.enum_values(table, column)));
        } else if field.type_tag.is_precision_numeric() {
            let (default_precision, default_scale) = DEFAULT_PRECISION;
            if column.precision != default_precision || column.scale != default_scale {
                field.args.push(Arg::Precision(column.precision));
                if column.scale != default_scale {
                    field.args.push(Arg::Scale(column.scale));
                }
            }
            if column.unsigned {
                field.decorators.set_unsigned();
            }
        } else if field.type_tag == TypeTag::DateTime {
            match column.name.as_str() {
                "deleted_at" if nullable => {
                    field = Field::unnamed(TypeTag::SoftDeletes);
                    nullable = false;
                }
                "created_at" if fields.contains_key("updated_at") => {
                    fields.insert("updated_at", Field::unnamed(TypeTag::Timestamps));
                    return ColumnOutcome::Merged;
                }
                "updated_at" if fields.contains_key("created_at") => {
                    fields.insert("created_at", Field::unnamed(TypeTag::Timestamps));
                    return ColumnOutcome::Merged;
                }
                _ => {}
            }
        } else {
            if field.type_tag == TypeTag::String && column.fixed_width {
                field.type_tag = TypeTag::Char;
            }
            if let Some(length) = column.length {
                let is_default_length = matches!(field.type_tag, TypeTag::String | TypeTag::Char)
                    && length == DEFAULT_STRING_LENGTH;
                if length > 0 && !is_default_length {
                    field.args.push(Arg::Length(length));
                }
            }
        }

        ColumnOutcome::Emit {
            key: column.name.clone(),
            field,
            nullable,
            attach_index,
        }
    }

    fn enum_values(&self, table: &str, column: &ColumnDescriptor) -> Vec<String> {
        let parsed = column
            .native_type
            .as_deref()
            .map(parse_enum_values)
            .unwrap_or_default();

        if parsed.is_empty() {
            self.introspector.enum_values(table, &column.name)
        } else {
            parsed
        }
    }
}

/// Values of a declared enum type such as `enum('draft','it''s live')`
pub fn parse_enum_values(native_type: &str) -> Vec<String> {
    static VALUE: OnceLock<Regex> = OnceLock::new();
    let value = VALUE.get_or_init(|| Regex::new(r"'((?:[^']|'')*)'").expect("valid regex"));

    let Some(open) = native_type.find('(') else {
        return Vec::new();
    };

    value
        .captures_iter(&native_type[open..])
        .map(|caps| caps[1].replace("''", "'"))
        .collect()
}

fn default_value(type_tag: &mut TypeTag, default: &str) -> DefaultValue {
    if default.trim().eq_ignore_ascii_case(CURRENT_TIMESTAMP) {
        if *type_tag == TypeTag::DateTime {
            *type_tag = TypeTag::Timestamp;
        }
        DefaultValue::Raw(CURRENT_TIMESTAMP.to_string())
    } else if type_tag.is_string_like() || !is_numeric(default) {
        DefaultValue::Quoted(default.to_string())
    } else {
        DefaultValue::Bare(default.trim().to_string())
    }
}

fn is_numeric(value: &str) -> bool {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    NUMBER
        .get_or_init(|| {
            Regex::new(r"^\s*[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?\s*$").expect("valid regex")
        })
        .is_match(value)
}
