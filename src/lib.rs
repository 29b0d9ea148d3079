//! Reverse-engineer an existing relational schema into Laravel migrations.
//!
//! The pipeline is synchronous and works against any [`SchemaIntrospector`]:
//! columns become [`model::Field`]s, indexes and foreign keys are normalized, tables are
//! optionally reordered by their dependencies, and everything is rendered to Schema builder
//! statements. [`db::PgIntrospector`] loads a live PostgreSQL schema into a
//! [`SchemaSnapshot`], which is itself an introspector.
//!
//! ```no_run
//! use migen::{generate_migrations, GeneratorOptions, MemorySink, SchemaSnapshot};
//!
//! # fn main() -> migen::Result<()> {
//! let snapshot = SchemaSnapshot::load_from_file("schema.json".as_ref())?;
//! let mut sink = MemorySink::new();
//! let written = generate_migrations(&snapshot, &[], &GeneratorOptions::default(), &mut sink)?;
//! # Ok(())
//! # }
//! ```

pub mod analysis;
#[cfg(feature = "cli")]
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod generators;
pub mod logging;
pub mod model;
pub mod output;
pub mod schema;
pub mod syntax;
pub mod writer;

pub use analysis::{DependencyMode, DependencyResolver, TableGraph};
pub use commands::{Generation, Generator, MigrationDefinition};
pub use config::{GeneratorOptions, MigenConfig};
pub use error::{MigenError, Result};
pub use schema::{SchemaIntrospector, SchemaSnapshot, TableSnapshot};
pub use syntax::MigrationRenderer;
pub use writer::{FileSink, MemorySink, MigrationSink};

/// Generate migrations for `tables` (all tables when empty) and hand them to `sink`.
///
/// Returns the identifiers the sink stored them under, in write order.
pub fn generate_migrations(
    introspector: &dyn SchemaIntrospector,
    tables: &[String],
    options: &GeneratorOptions,
    sink: &mut dyn MigrationSink,
) -> Result<Vec<String>> {
    let generation = Generator::new(introspector, options).generate(tables)?;
    commands::write_all(&generation.migrations, sink)
}
