//! Rendering of normalized records into migration DSL source text.

use crate::model::{
    convention_name, Arg, ConventionKind, Decorator, DefaultValue, Field, FieldName,
    ForeignKeyRecord, TableFields,
};

/// Indentation of the statement itself inside a migration method body
const STATEMENT_INDENT: &str = "\t\t";
/// Indentation of the `$table->...` lines inside a schema closure
const ITEM_INDENT: &str = "\t\t\t";

/// Renders migration statements for one connection
#[derive(Debug, Clone, Default)]
pub struct MigrationRenderer {
    /// Named connection the statements are scoped to; `None` for the default connection
    connection: Option<String>,
    table_prefix: String,
}

impl MigrationRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connection(mut self, connection: Option<String>) -> Self {
        self.connection = connection;
        self
    }

    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }

    /// `Schema::create(...)` with one statement per field
    pub fn render_create(&self, table: &str, fields: &TableFields) -> String {
        let items: Vec<String> = fields.iter().map(render_field).collect();
        self.schema_block("create", table, &items)
    }

    /// `Schema::table(...)` adding the given foreign keys
    pub fn render_foreign_keys(&self, table: &str, foreign_keys: &[ForeignKeyRecord]) -> String {
        let items: Vec<String> = foreign_keys
            .iter()
            .map(|fk| self.render_foreign_key(fk))
            .collect();
        self.schema_block("table", table, &items)
    }

    /// `Schema::table(...)` dropping the given foreign keys by name
    pub fn render_drop_foreign_keys(
        &self,
        table: &str,
        foreign_keys: &[ForeignKeyRecord],
    ) -> String {
        let items: Vec<String> = foreign_keys
            .iter()
            .map(|fk| {
                let name = fk.explicit_name.clone().unwrap_or_else(|| {
                    convention_name(
                        table,
                        std::slice::from_ref(&fk.local_column),
                        ConventionKind::Foreign,
                    )
                });
                format!("$table->dropForeign({});", quote(&name))
            })
            .collect();
        self.schema_block("table", table, &items)
    }

    pub fn render_drop(&self, table: &str) -> String {
        format!(
            "Schema::{}drop({});",
            self.connection_prefix(),
            quote(self.strip_prefix(table))
        )
    }

    fn render_foreign_key(&self, fk: &ForeignKeyRecord) -> String {
        let mut foreign_args = quote(&fk.local_column);
        if let Some(name) = &fk.explicit_name {
            foreign_args.push_str(", ");
            foreign_args.push_str(&quote(name));
        }

        format!(
            "$table->foreign({})->references({})->on({})->onUpdate({})->onDelete({});",
            foreign_args,
            quote(&fk.referenced_column),
            quote(self.strip_prefix(&fk.referenced_table)),
            quote(fk.on_update.as_sql()),
            quote(fk.on_delete.as_sql()),
        )
    }

    fn schema_block(&self, method: &str, table: &str, items: &[String]) -> String {
        let mut out = format!(
            "Schema::{}{}({}, function(Blueprint $table)\n{}{{\n",
            self.connection_prefix(),
            method,
            quote(self.strip_prefix(table)),
            STATEMENT_INDENT
        );
        for item in items {
            out.push_str(ITEM_INDENT);
            out.push_str(item);
            out.push('\n');
        }
        out.push_str(STATEMENT_INDENT);
        out.push_str("});");
        out
    }

    fn connection_prefix(&self) -> String {
        match &self.connection {
            Some(connection) => format!("connection({})->", quote(connection)),
            None => String::new(),
        }
    }

    fn strip_prefix<'t>(&self, table: &'t str) -> &'t str {
        if self.table_prefix.is_empty() {
            return table;
        }
        table.strip_prefix(self.table_prefix.as_str()).unwrap_or(table)
    }
}

/// One `$table->...;` statement
pub fn render_field(field: &Field) -> String {
    let mut params = Vec::new();
    match &field.name {
        FieldName::Column(name) => params.push(quote(name)),
        FieldName::Columns(columns) => params.push(quote_list(columns)),
        FieldName::Unnamed => {}
    }
    params.extend(field.args.iter().map(render_arg));

    let mut out = format!("$table->{}({})", field.type_tag.method(), params.join(", "));
    for decorator in field.decorators.to_vec() {
        chain(&mut out, &render_decorator(&decorator));
    }
    out.push(';');
    out
}

fn render_arg(arg: &Arg) -> String {
    match arg {
        Arg::AutoIncrement => "true".to_string(),
        Arg::Length(n) | Arg::Precision(n) | Arg::Scale(n) => n.to_string(),
        Arg::Values(values) => quote_list(values),
        Arg::Name(name) => quote(name),
    }
}

fn render_decorator(decorator: &Decorator) -> String {
    match decorator {
        Decorator::Unsigned => "unsigned".to_string(),
        Decorator::Default(DefaultValue::Raw(expr)) => format!("default(DB::raw({}))", quote(expr)),
        Decorator::Default(DefaultValue::Quoted(value)) => format!("default({})", quote(value)),
        Decorator::Default(DefaultValue::Bare(value)) => format!("default({})", value),
        Decorator::Nullable => "nullable".to_string(),
        Decorator::Index(index) => match &index.name {
            Some(name) => format!("{}({})", index.kind, quote(name)),
            None => index.kind.to_string(),
        },
    }
}

/// Append a chained modifier, adding an empty argument list when `call` has none
fn chain(out: &mut String, call: &str) {
    out.push_str("->");
    out.push_str(call);
    if !call.contains('(') {
        out.push_str("()");
    }
}

/// Single-quoted string literal
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn quote_list(values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| quote(v)).collect();
    format!("[{}]", quoted.join(", "))
}
