use crate::analysis::DependencyMode;
use crate::commands::generate::Generator;
use crate::commands::open_schema;
use crate::config::MigenConfig;
use crate::error::{ErrorContext, Result};
#[cfg(feature = "cli")]
use owo_colors::OwoColorize;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug)]
pub struct PlanResult {
    /// Tables in the order their create migrations would be written
    pub tables: Vec<String>,
    pub skipped: Vec<String>,
    /// Migration names in write order
    pub migrations: Vec<String>,
    /// Each table with the tables it must be created after
    pub dependencies: Vec<(String, Vec<String>)>,
    pub dependency_mode: DependencyMode,
    pub ordered_by_dependencies: bool,
    pub graph_file: Option<PathBuf>,
}

/// Work out what `generate` would write without touching the migrations directory
pub async fn execute_plan(
    config: &MigenConfig,
    requested: &[String],
    output_graph: Option<PathBuf>,
) -> Result<PlanResult> {
    let source = open_schema(config, false).await?;
    let options = config.generator_options();
    let generator = Generator::new(&source.snapshot, &options);

    let generation = generator.generate(requested)?;
    let graph = generator.dependency_graph(requested);
    debug!(
        tables = graph.node_count(),
        edges = graph.edge_count(),
        "Built table dependency graph"
    );

    let dependencies = generation
        .tables
        .iter()
        .map(|table| (table.clone(), graph.dependencies_of(table)))
        .collect();

    if let Some(path) = &output_graph {
        fs::write(path, graph.to_graphviz()).file_context(path)?;
    }

    Ok(PlanResult {
        tables: generation.tables,
        skipped: generation.skipped,
        migrations: generation.migrations.into_iter().map(|m| m.name).collect(),
        dependencies,
        dependency_mode: options.dependency_mode,
        ordered_by_dependencies: options.check_table_dependencies,
        graph_file: output_graph,
    })
}

#[cfg(feature = "cli")]
pub fn print_plan_summary(plan: &PlanResult) {
    println!("\n{}", "=== Migen Plan Summary ===".bold().blue());

    let ordering = if plan.ordered_by_dependencies {
        format!("ordered by {} dependencies", plan.dependency_mode)
    } else {
        "requested order".to_string()
    };
    println!("\n{} ({}):", "Tables".bold(), ordering.dimmed());

    for (position, (table, depends_on)) in plan.dependencies.iter().enumerate() {
        if depends_on.is_empty() {
            println!("  {:>3}. {}", position + 1, table.cyan());
        } else {
            println!(
                "  {:>3}. {} {} {}",
                position + 1,
                table.cyan(),
                "→".dimmed(),
                depends_on.join(", ").dimmed()
            );
        }
    }

    if !plan.skipped.is_empty() {
        println!("\n{}:", "Skipped Tables".bold());
        for table in &plan.skipped {
            println!("  {} {} (no columns)", "-".yellow(), table.dimmed());
        }
    }

    println!("\n{}:", "Migrations".bold());
    for migration in &plan.migrations {
        println!("  {} {}", "+".green().bold(), migration);
    }

    if let Some(path) = &plan.graph_file {
        println!(
            "\n{} Dependency graph written to {}",
            "✓".green().bold(),
            path.display().to_string().cyan()
        );
    }
}
