use crate::analysis::DependencyMode;
use crate::config::CliOverrides;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Clone, Debug)]
#[command(name = "migen")]
#[command(about = "Generate Laravel migrations from an existing PostgreSQL schema")]
#[command(version)]
pub struct Cli {
    /// Increase verbosity level (can be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Generate a sample configuration file
    Init,

    /// Write migrations for the given tables (all tables when none are given)
    Generate {
        /// Tables to generate, comma-separated or as separate arguments
        #[arg(value_delimiter = ',')]
        tables: Vec<String>,

        /// Comma-separated list of tables to generate
        #[arg(short = 't', long = "tables", value_delimiter = ',')]
        tables_list: Vec<String>,

        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        generation: GenerationArgs,

        /// Directory the migration files are written to
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Custom migration template
        #[arg(long)]
        template: Option<PathBuf>,

        /// Record the generated migrations in the migrations table
        #[arg(long)]
        log: bool,

        /// Batch number to log the migrations under (default 0)
        #[arg(long, requires = "log")]
        batch: Option<i32>,

        /// Delete existing migration files in the target directory first
        #[arg(long)]
        clear: bool,
    },

    /// Show the tables and migrations a generate run would produce
    Plan {
        /// Tables to plan, comma-separated or as separate arguments
        #[arg(value_delimiter = ',')]
        tables: Vec<String>,

        /// Comma-separated list of tables to plan
        #[arg(short = 't', long = "tables", value_delimiter = ',')]
        tables_list: Vec<String>,

        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        generation: GenerationArgs,

        /// Output dependency graph in Graphviz DOT format to the specified file
        #[arg(long)]
        output_graph: Option<PathBuf>,
    },

    /// Dump the live schema to a JSON snapshot usable with --schema-file
    Snapshot {
        /// File to write
        #[arg(short, long, default_value = "schema.json")]
        output: PathBuf,

        /// PostgreSQL connection string
        #[arg(long)]
        connection_string: Option<String>,

        /// Schema to read tables from
        #[arg(long)]
        schema: Option<String>,
    },
}

/// Where the schema is read from
#[derive(Args, Clone, Debug, Default)]
pub struct SourceArgs {
    /// PostgreSQL connection string
    #[arg(long)]
    pub connection_string: Option<String>,

    /// Schema to read tables from
    #[arg(long)]
    pub schema: Option<String>,

    /// Generate from a JSON snapshot instead of a live database
    #[arg(long)]
    pub schema_file: Option<PathBuf>,
}

/// Switches shared by generate and plan
#[derive(Args, Clone, Debug, Default)]
pub struct GenerationArgs {
    /// Comma-separated list of tables to skip
    #[arg(short, long, value_delimiter = ',')]
    pub ignore: Vec<String>,

    /// Connection name the generated statements are scoped to
    #[arg(short, long)]
    pub connection: Option<String>,

    /// Don't emit index names
    #[arg(long)]
    pub default_index_names: bool,

    /// Don't emit foreign key names
    #[arg(long)]
    pub default_fk_names: bool,

    /// Put foreign keys in the create migrations instead of separate ones
    #[arg(long)]
    pub combine_fks: bool,

    /// Order tables so referenced tables are created first
    #[arg(long)]
    pub check_dependencies: bool,

    /// How dependencies are found: naming or foreign-keys
    #[arg(long, value_parser = parse_dependency_mode)]
    pub dependency_mode: Option<DependencyMode>,
}

fn parse_dependency_mode(s: &str) -> Result<DependencyMode, String> {
    s.parse().map_err(|e: crate::error::MigenError| e.to_string())
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Commands {
    /// Tables named on the command line, positional first
    pub fn requested_tables(&self) -> Vec<String> {
        match self {
            Commands::Generate {
                tables, tables_list, ..
            }
            | Commands::Plan {
                tables, tables_list, ..
            } => tables.iter().chain(tables_list).cloned().collect(),
            Commands::Init | Commands::Snapshot { .. } => Vec::new(),
        }
    }

    /// Values to merge over the config file
    pub fn overrides(&self) -> CliOverrides {
        match self {
            Commands::Init => CliOverrides::default(),
            Commands::Generate {
                source,
                generation,
                path,
                template,
                log,
                batch,
                clear,
                ..
            } => CliOverrides {
                migrations_dir: path.clone(),
                template: template.clone(),
                log_migrations: *log,
                batch: *batch,
                clear: *clear,
                ..shared_overrides(source, generation)
            },
            Commands::Plan {
                source, generation, ..
            } => shared_overrides(source, generation),
            Commands::Snapshot {
                connection_string,
                schema,
                ..
            } => CliOverrides {
                connection_string: connection_string.clone(),
                schema: schema.clone(),
                ..Default::default()
            },
        }
    }
}

fn shared_overrides(source: &SourceArgs, generation: &GenerationArgs) -> CliOverrides {
    CliOverrides {
        connection_string: source.connection_string.clone(),
        schema: source.schema.clone(),
        schema_file: source.schema_file.clone(),
        connection_name: generation.connection.clone(),
        ignore: generation.ignore.clone(),
        ignore_index_names: generation.default_index_names,
        ignore_foreign_key_names: generation.default_fk_names,
        combine_foreign_keys: generation.combine_fks,
        check_table_dependencies: generation.check_dependencies,
        dependency_mode: generation.dependency_mode,
        ..Default::default()
    }
}
