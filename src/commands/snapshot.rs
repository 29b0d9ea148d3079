use crate::commands::connect;
use crate::config::MigenConfig;
use crate::db::PgIntrospector;
use crate::error::Result;
#[cfg(feature = "cli")]
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug)]
pub struct SnapshotResult {
    pub path: PathBuf,
    pub tables: usize,
}

/// Dump the live schema to a JSON file usable with `--schema-file`
pub async fn execute_snapshot(config: &MigenConfig, path: &Path) -> Result<SnapshotResult> {
    let client = connect(config).await?;
    let snapshot = PgIntrospector::new(&client, config.schema()).load().await?;

    snapshot.save_to_file(path)?;
    info!(path = %path.display(), tables = snapshot.tables.len(), "Wrote schema snapshot");

    Ok(SnapshotResult {
        path: path.to_path_buf(),
        tables: snapshot.tables.len(),
    })
}

#[cfg(feature = "cli")]
pub fn print_snapshot_summary(result: &SnapshotResult) {
    println!(
        "{} Saved {} tables to {}",
        "✓".green().bold(),
        result.tables,
        result.path.display().to_string().cyan()
    );
}
