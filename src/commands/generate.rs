use crate::analysis::{DependencyResolver, TableGraph};
use crate::commands::open_schema;
use crate::config::{GeneratorOptions, MigenConfig};
use crate::db::{MigrationRepository, MIGRATIONS_TABLE};
use crate::error::{MigenError, Result};
use crate::generators::{ColumnModelBuilder, ForeignKeyExtractor};
use crate::log_migration;
use crate::model::TableFields;
use crate::output::OutputHandler;
use crate::schema::SchemaIntrospector;
use crate::syntax::MigrationRenderer;
use crate::writer::{FileSink, MigrationSink};
use heck::ToUpperCamelCase;
use indexmap::IndexMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Separates consecutive statements inside one migration method body
const STATEMENT_SEPARATOR: &str = "\n\n\t\t";

/// One migration ready to hand to a [`MigrationSink`]
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationDefinition {
    /// Underscored migration name, e.g. `create_users_table`
    pub name: String,
    /// Class name derived from the migration name, e.g. `CreateUsersTable`
    pub class_name: String,
    pub table: String,
    pub up: String,
    pub down: String,
}

impl MigrationDefinition {
    pub fn new(
        name: impl Into<String>,
        table: impl Into<String>,
        up: impl Into<String>,
        down: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            class_name: name.to_upper_camel_case(),
            name,
            table: table.into(),
            up: up.into(),
            down: down.into(),
        }
    }
}

/// Migrations produced by one generation run
#[derive(Debug, Clone, Default)]
pub struct Generation {
    /// Tables that got a create migration, in creation order
    pub tables: Vec<String>,
    /// Requested tables that produced no migration
    pub skipped: Vec<String>,
    pub migrations: Vec<MigrationDefinition>,
}

/// Turns an introspected schema into migration definitions
pub struct Generator<'a> {
    introspector: &'a dyn SchemaIntrospector,
    options: &'a GeneratorOptions,
}

impl<'a> Generator<'a> {
    pub fn new(introspector: &'a dyn SchemaIntrospector, options: &'a GeneratorOptions) -> Self {
        Self {
            introspector,
            options,
        }
    }

    /// The requested tables, or every table when none are requested, minus excluded ones
    pub fn select_tables(&self, requested: &[String]) -> Vec<String> {
        let candidates = if requested.is_empty() {
            self.introspector.list_tables()
        } else {
            requested.to_vec()
        };

        let mut selected: Vec<String> = Vec::with_capacity(candidates.len());
        for table in candidates {
            if self.is_excluded(&table) {
                debug!(table = %table, "Excluded table");
            } else if !selected.contains(&table) {
                selected.push(table);
            }
        }
        selected
    }

    pub fn generate(&self, requested: &[String]) -> Result<Generation> {
        let tables = self.select_tables(requested);
        let builder = ColumnModelBuilder::new(self.introspector, self.options.ignore_index_names);
        let extractor = ForeignKeyExtractor::new(self.options.ignore_foreign_key_names);
        let renderer = MigrationRenderer::new()
            .with_connection(self.options.connection_name.clone())
            .with_table_prefix(self.table_prefix());

        let ordered = self.ordered_fields(&tables, &builder)?;

        let skipped: Vec<String> = tables
            .iter()
            .filter(|table| !ordered.contains_key(*table))
            .cloned()
            .collect();
        for table in &skipped {
            warn!(table = %table, "Table has no columns, skipping");
        }

        let separate = self.options.separate_foreign_key_migrations;
        let mut migrations = Vec::with_capacity(ordered.len());
        let mut deferred_foreign_keys = Vec::new();

        for (table, fields) in &ordered {
            let foreign_keys =
                extractor.extract(table, &self.introspector.list_foreign_keys(table));

            let mut up = renderer.render_create(table, fields);
            let mut down = renderer.render_drop(table);

            if !foreign_keys.is_empty() {
                if separate {
                    deferred_foreign_keys.push((table, foreign_keys));
                } else {
                    up = [up, renderer.render_foreign_keys(table, &foreign_keys)]
                        .join(STATEMENT_SEPARATOR);
                    down = [renderer.render_drop_foreign_keys(table, &foreign_keys), down]
                        .join(STATEMENT_SEPARATOR);
                }
            }

            debug!(table = %table, fields = fields.len(), "Rendered create migration");
            migrations.push(MigrationDefinition::new(
                format!("create_{table}_table"),
                table.as_str(),
                up,
                down,
            ));
        }

        for (table, foreign_keys) in deferred_foreign_keys {
            debug!(table = %table, count = foreign_keys.len(), "Rendered foreign key migration");
            migrations.push(MigrationDefinition::new(
                format!("add_foreign_keys_to_{table}_table"),
                table.as_str(),
                renderer.render_foreign_keys(table, &foreign_keys),
                renderer.render_drop_foreign_keys(table, &foreign_keys),
            ));
        }

        Ok(Generation {
            tables: ordered.into_keys().collect(),
            skipped,
            migrations,
        })
    }

    /// Dependency graph of the selected tables under the configured mode
    pub fn dependency_graph(&self, requested: &[String]) -> TableGraph {
        let tables = self.select_tables(requested);
        let builder = ColumnModelBuilder::new(self.introspector, self.options.ignore_index_names);
        DependencyResolver::new(self.introspector, &builder)
            .graph(&tables, self.options.dependency_mode)
    }

    fn ordered_fields(
        &self,
        tables: &[String],
        builder: &ColumnModelBuilder<'_>,
    ) -> Result<IndexMap<String, TableFields>> {
        if !self.options.check_table_dependencies {
            return Ok(fields_in_order(tables, builder));
        }

        let resolver = DependencyResolver::new(self.introspector, builder);
        let resolved = match resolver.resolve(tables, self.options.dependency_mode) {
            Ok(resolved) => resolved,
            Err(MigenError::CircularDependency(cycle))
                if self.options.separate_foreign_key_migrations =>
            {
                warn!(
                    cycle = %cycle.join(" -> "),
                    "Tables reference each other, keeping the requested order"
                );
                fields_in_order(tables, builder)
            }
            Err(e) => return Err(e),
        };

        Ok(resolved
            .into_iter()
            .filter(|(table, _)| !self.is_excluded(table))
            .collect())
    }

    fn is_excluded(&self, table: &str) -> bool {
        table == MIGRATIONS_TABLE || self.options.excluded_tables.iter().any(|t| t == table)
    }

    fn table_prefix(&self) -> String {
        self.options
            .table_prefix
            .clone()
            .unwrap_or_else(|| self.introspector.table_prefix().to_string())
    }
}

fn fields_in_order(
    tables: &[String],
    builder: &ColumnModelBuilder<'_>,
) -> IndexMap<String, TableFields> {
    tables
        .iter()
        .filter_map(|table| builder.build(table).map(|fields| (table.clone(), fields)))
        .collect()
}

/// Hand every migration to `sink`, returning the identifiers they were stored under
pub fn write_all(
    migrations: &[MigrationDefinition],
    sink: &mut dyn MigrationSink,
) -> Result<Vec<String>> {
    migrations.iter().map(|migration| sink.write(migration)).collect()
}

#[derive(Debug)]
pub struct GenerateResult {
    pub tables: Vec<String>,
    pub skipped: Vec<String>,
    /// Identifiers (file stems) of the written migrations
    pub migrations: Vec<String>,
    pub migrations_dir: PathBuf,
    pub cleared: usize,
    pub logged: usize,
    pub batch: Option<i32>,
    pub duration: Duration,
}

pub async fn execute_generate(
    config: &MigenConfig,
    requested: &[String],
    output: &dyn OutputHandler,
) -> Result<GenerateResult> {
    let started = Instant::now();
    let log_migrations = config.log_migrations.unwrap_or(false);
    let source = open_schema(config, log_migrations).await?;

    let options = config.generator_options();
    let generation = Generator::new(&source.snapshot, &options).generate(requested)?;
    for table in &generation.skipped {
        output.warning(&format!("Table '{table}' has no columns, skipping"));
    }

    let migrations_dir = config.migrations_dir();
    let mut sink = FileSink::new(&migrations_dir);
    if let Some(template) = &config.template {
        sink = sink.with_template_file(template)?;
    }

    let cleared = if config.clear.unwrap_or(false) {
        sink.clear()?
    } else {
        0
    };

    let repository = match (&source.client, log_migrations) {
        (Some(client), true) => {
            let repository = MigrationRepository::new(client);
            if !repository.exists().await? {
                repository.create_repository().await?;
            }
            Some(repository)
        }
        _ => None,
    };

    let batch = match &repository {
        Some(repository) => {
            let next = repository.next_batch_number().await?;
            let batch = config.batch.unwrap_or(0);
            info!(next_batch = next, batch, "Logging generated migrations");
            Some(batch)
        }
        None => None,
    };

    output.heading(&format!(
        "Generating {} migrations in {}",
        generation.migrations.len(),
        migrations_dir.display()
    ));

    let mut written = Vec::with_capacity(generation.migrations.len());
    let mut logged = 0;
    for migration in &generation.migrations {
        let identifier = sink.write(migration)?;
        log_migration!(identifier.as_str(), "created");
        output.migration_written(&identifier);

        if let (Some(repository), Some(batch)) = (&repository, batch) {
            repository.log(&identifier, batch).await?;
            output.migration_logged(&identifier, batch);
            logged += 1;
        }

        written.push(identifier);
    }

    Ok(GenerateResult {
        tables: generation.tables,
        skipped: generation.skipped,
        migrations: written,
        migrations_dir,
        cleared,
        logged,
        batch,
        duration: started.elapsed(),
    })
}

#[cfg(feature = "cli")]
pub fn print_generate_summary(result: &GenerateResult) {
    use crate::logging::format_duration;
    use owo_colors::OwoColorize;

    println!("\n{}", "=== Migen Generate Summary ===".bold().blue());

    if result.migrations.is_empty() {
        println!("\n{}", "No migrations generated".yellow());
    } else {
        println!("\n{}:", "Migrations Written".bold());
        for migration in &result.migrations {
            println!("  {} {}", "+".green().bold(), migration.cyan());
        }
    }

    if !result.skipped.is_empty() {
        println!("\n{}:", "Skipped Tables".bold());
        for table in &result.skipped {
            println!("  {} {} (no columns)", "-".yellow(), table.dimmed());
        }
    }

    if result.cleared > 0 {
        println!("\n{} {} existing migration files removed", "↓".yellow(), result.cleared);
    }

    if let Some(batch) = result.batch {
        println!("{} {} migrations logged in batch {}", "✓".green(), result.logged, batch);
    }

    println!(
        "\n{} {} tables, {} migrations in {} ({})",
        "✓".green().bold(),
        result.tables.len(),
        result.migrations.len(),
        result.migrations_dir.display().to_string().cyan(),
        format_duration(result.duration).dimmed()
    );
}
