use crate::error::{ErrorContext, Result};
use crate::schema::{
    ColumnDescriptor, ForeignKeyDescriptor, IndexDescriptor, ReferentialAction, SchemaSnapshot,
    TableSnapshot,
};
use std::collections::HashMap;
use tokio_postgres::Client;
use tracing::{debug, info};

/// Name every primary key index is reported under, whatever Postgres called it
pub const PRIMARY_INDEX_NAME: &str = "PRIMARY";

/// Reads one Postgres schema into a [`SchemaSnapshot`]
pub struct PgIntrospector<'a> {
    client: &'a Client,
    schema: String,
}

impl<'a> PgIntrospector<'a> {
    pub fn new(client: &'a Client, schema: impl Into<String>) -> Self {
        Self {
            client,
            schema: schema.into(),
        }
    }

    pub async fn load(&self) -> Result<SchemaSnapshot> {
        let tables = self.tables().await?;
        let enum_types = self.enum_types().await?;
        let mut indexes = self.indexes().await?;
        let mut foreign_keys = self.foreign_keys().await?;

        let mut snapshot = SchemaSnapshot::new();
        for table in tables {
            let columns = self.columns(&table).await.table_context(&table)?;

            let mut table_snapshot = TableSnapshot::new();
            for column in columns {
                if column.raw_type == "enum" {
                    if let Some(values) = column.native_type.as_ref().and_then(|t| enum_types.get(t)) {
                        table_snapshot
                            .enum_values
                            .insert(column.name.clone(), values.clone());
                    }
                }
                table_snapshot.columns.push(column);
            }
            table_snapshot.indexes = indexes.remove(&table).unwrap_or_default();
            table_snapshot.foreign_keys = foreign_keys.remove(&table).unwrap_or_default();

            debug!(
                table = %table,
                columns = table_snapshot.columns.len(),
                indexes = table_snapshot.indexes.len(),
                foreign_keys = table_snapshot.foreign_keys.len(),
                "Introspected table"
            );
            snapshot.insert_table(table, table_snapshot);
        }

        info!(schema = %self.schema, tables = snapshot.tables.len(), "Loaded schema");
        Ok(snapshot)
    }

    async fn tables(&self) -> Result<Vec<String>> {
        let rows = self
            .client
            .query(
                r#"
                SELECT c.relname::text
                FROM pg_catalog.pg_class c
                JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
                WHERE n.nspname = $1
                  AND c.relkind IN ('r', 'p')
                  AND NOT c.relispartition
                ORDER BY c.relname
                "#,
                &[&self.schema],
            )
            .await?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    async fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let rows = self
            .client
            .query(
                r#"
                SELECT
                    c.column_name::text,
                    c.udt_name::text,
                    c.is_nullable = 'YES' AS nullable,
                    c.column_default::text,
                    c.character_maximum_length::int4,
                    c.numeric_precision::int4,
                    c.numeric_scale::int4,
                    c.is_identity = 'YES' AS is_identity,
                    t.typtype = 'e' AS is_enum
                FROM information_schema.columns c
                JOIN pg_catalog.pg_namespace tn ON tn.nspname = c.udt_schema
                JOIN pg_catalog.pg_type t ON t.typname = c.udt_name AND t.typnamespace = tn.oid
                WHERE c.table_schema = $1 AND c.table_name = $2
                ORDER BY c.ordinal_position
                "#,
                &[&self.schema, &table],
            )
            .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let name: String = row.get(0);
                let udt_name: String = row.get(1);
                let default: Option<String> = row.get(3);
                let length: Option<i32> = row.get(4);
                let precision: Option<i32> = row.get(5);
                let scale: Option<i32> = row.get(6);
                let is_identity: bool = row.get(7);
                let is_enum: bool = row.get(8);

                let (raw_type, fixed_width) = if is_enum {
                    ("enum".to_string(), false)
                } else {
                    map_type(&udt_name)
                };

                let auto_increment = is_identity
                    || default.as_deref().is_some_and(|d| d.starts_with("nextval("));

                let mut column = ColumnDescriptor::new(name, raw_type);
                column.native_type = Some(udt_name.clone());
                column.nullable = row.get(2);
                column.fixed_width = fixed_width;
                column.auto_increment = auto_increment;
                column.length = length.and_then(|l| u32::try_from(l).ok());
                (column.precision, column.scale) = numeric_precision(&udt_name, precision, scale);
                if !auto_increment {
                    column.default = default.as_deref().and_then(|d| normalize_default(d, &udt_name));
                }
                column
            })
            .collect())
    }

    async fn indexes(&self) -> Result<HashMap<String, Vec<IndexDescriptor>>> {
        let rows = self
            .client
            .query(
                r#"
                SELECT
                    t.relname::text AS table_name,
                    i.relname::text AS index_name,
                    COALESCE(
                        array_agg(a.attname::text ORDER BY array_position(ix.indkey, a.attnum)),
                        ARRAY[]::text[]
                    ) AS columns,
                    ix.indisunique,
                    ix.indisprimary
                FROM pg_catalog.pg_class t
                JOIN pg_catalog.pg_index ix ON t.oid = ix.indrelid
                JOIN pg_catalog.pg_class i ON i.oid = ix.indexrelid
                JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
                JOIN pg_catalog.pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey)
                WHERE n.nspname = $1 AND t.relkind IN ('r', 'p')
                GROUP BY t.relname, i.relname, ix.indisunique, ix.indisprimary
                ORDER BY t.relname, i.relname
                "#,
                &[&self.schema],
            )
            .await?;

        let mut by_table: HashMap<String, Vec<IndexDescriptor>> = HashMap::new();
        for row in rows {
            let table: String = row.get(0);
            let is_primary: bool = row.get(4);
            let name: String = if is_primary {
                PRIMARY_INDEX_NAME.to_string()
            } else {
                row.get(1)
            };

            by_table.entry(table).or_default().push(IndexDescriptor {
                name,
                columns: row.get(2),
                is_primary,
                is_unique: row.get(3),
            });
        }
        Ok(by_table)
    }

    async fn foreign_keys(&self) -> Result<HashMap<String, Vec<ForeignKeyDescriptor>>> {
        let rows = self
            .client
            .query(
                r#"
                SELECT
                    cl.relname::text AS table_name,
                    con.conname::text,
                    ref.relname::text AS referenced_table,
                    ARRAY(
                        SELECT a.attname::text
                        FROM unnest(con.conkey) WITH ORDINALITY k(attnum, ord)
                        JOIN pg_catalog.pg_attribute a
                            ON a.attrelid = con.conrelid AND a.attnum = k.attnum
                        ORDER BY k.ord
                    ) AS local_columns,
                    ARRAY(
                        SELECT a.attname::text
                        FROM unnest(con.confkey) WITH ORDINALITY k(attnum, ord)
                        JOIN pg_catalog.pg_attribute a
                            ON a.attrelid = con.confrelid AND a.attnum = k.attnum
                        ORDER BY k.ord
                    ) AS referenced_columns,
                    con.confupdtype::text,
                    con.confdeltype::text
                FROM pg_catalog.pg_constraint con
                JOIN pg_catalog.pg_class cl ON cl.oid = con.conrelid
                JOIN pg_catalog.pg_namespace n ON n.oid = cl.relnamespace
                JOIN pg_catalog.pg_class ref ON ref.oid = con.confrelid
                WHERE con.contype = 'f' AND n.nspname = $1
                ORDER BY cl.relname, con.conname
                "#,
                &[&self.schema],
            )
            .await?;

        let mut by_table: HashMap<String, Vec<ForeignKeyDescriptor>> = HashMap::new();
        for row in rows {
            let table: String = row.get(0);
            let on_update: String = row.get(5);
            let on_delete: String = row.get(6);

            let mut options = std::collections::BTreeMap::new();
            options.insert("onUpdate".to_string(), action_from_code(&on_update).as_sql().to_string());
            options.insert("onDelete".to_string(), action_from_code(&on_delete).as_sql().to_string());

            by_table.entry(table).or_default().push(ForeignKeyDescriptor {
                name: row.get(1),
                referenced_table: row.get(2),
                local_columns: row.get(3),
                referenced_columns: row.get(4),
                options,
            });
        }
        Ok(by_table)
    }

    async fn enum_types(&self) -> Result<HashMap<String, Vec<String>>> {
        let rows = self
            .client
            .query(
                r#"
                SELECT t.typname::text, array_agg(e.enumlabel::text ORDER BY e.enumsortorder)
                FROM pg_catalog.pg_type t
                JOIN pg_catalog.pg_enum e ON e.enumtypid = t.oid
                GROUP BY t.typname
                "#,
                &[],
            )
            .await?;
        Ok(rows.iter().map(|row| (row.get(0), row.get(1))).collect())
    }
}

/// Generic raw type for a Postgres type name, plus whether it is fixed width
fn map_type(udt_name: &str) -> (String, bool) {
    let raw = match udt_name {
        "int2" => "smallint",
        "int4" => "integer",
        "int8" => "bigint",
        "numeric" => "decimal",
        "float4" => "float",
        "float8" => "double",
        "varchar" => "string",
        "bpchar" => return ("string".to_string(), true),
        "text" => "text",
        "bool" => "boolean",
        "timestamp" => "datetime",
        "timestamptz" => "datetimetz",
        "date" => "date",
        "time" | "timetz" => "time",
        "bytea" => "blob",
        "json" | "jsonb" => "json",
        "uuid" => "guid",
        other => other,
    };
    (raw.to_string(), false)
}

/// Precision and scale as reported for a column; floats report the framework's defaults
fn numeric_precision(udt_name: &str, precision: Option<i32>, scale: Option<i32>) -> (u32, u32) {
    match udt_name {
        "float4" | "float8" => (8, 2),
        _ => (
            precision.and_then(|p| u32::try_from(p).ok()).unwrap_or(10),
            scale.and_then(|s| u32::try_from(s).ok()).unwrap_or(0),
        ),
    }
}

/// Literal default value behind a Postgres default expression
fn normalize_default(expr: &str, udt_name: &str) -> Option<String> {
    let expr = expr.trim();
    let lower = expr.to_lowercase();

    if lower.starts_with("null") {
        return None;
    }
    if lower.starts_with("now()") || lower.starts_with("current_timestamp") {
        return Some("CURRENT_TIMESTAMP".to_string());
    }
    if udt_name == "bool" {
        return match lower.as_str() {
            "true" => Some("1".to_string()),
            "false" => Some("0".to_string()),
            _ => Some(expr.to_string()),
        };
    }

    if let Some(rest) = expr.strip_prefix('\'') {
        // 'literal'::type, with '' as an escaped quote
        let mut literal = String::new();
        let mut chars = rest.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    literal.push('\'');
                    continue;
                }
                return Some(literal);
            }
            literal.push(c);
        }
        return Some(expr.to_string());
    }

    let unwrapped = expr.split("::").next().unwrap_or(expr);
    Some(unwrapped.trim_start_matches('(').trim_end_matches(')').to_string())
}

fn action_from_code(code: &str) -> ReferentialAction {
    match code {
        "c" => ReferentialAction::Cascade,
        "n" => ReferentialAction::SetNull,
        "d" => ReferentialAction::SetDefault,
        "a" => ReferentialAction::NoAction,
        _ => ReferentialAction::Restrict,
    }
}
