pub mod generate;
pub mod plan;
pub mod snapshot;

pub use generate::{execute_generate, write_all, GenerateResult, Generation, Generator, MigrationDefinition};
pub use plan::{execute_plan, PlanResult};
pub use snapshot::{execute_snapshot, SnapshotResult};

#[cfg(feature = "cli")]
pub use generate::print_generate_summary;
#[cfg(feature = "cli")]
pub use plan::print_plan_summary;
#[cfg(feature = "cli")]
pub use snapshot::print_snapshot_summary;

use crate::config::MigenConfig;
use crate::db::{connect_to_database, DatabaseConfig, PgIntrospector};
use crate::error::{MigenError, Result};
use crate::schema::SchemaSnapshot;
use tokio_postgres::Client;
use tracing::info;

/// The schema a command works from, plus the live connection when one was opened
pub(crate) struct SchemaSource {
    pub snapshot: SchemaSnapshot,
    pub client: Option<Client>,
}

/// Load the schema from `schema_file`, or introspect the configured database.
///
/// With `needs_client` a connection is opened even when a snapshot file is used.
pub(crate) async fn open_schema(config: &MigenConfig, needs_client: bool) -> Result<SchemaSource> {
    let client = if config.schema_file.is_none() || needs_client {
        Some(connect(config).await?)
    } else {
        None
    };

    let snapshot = match (&config.schema_file, &client) {
        (Some(path), _) => {
            info!(path = %path.display(), "Loading schema snapshot");
            SchemaSnapshot::load_from_file(path)?
        }
        (None, Some(client)) => PgIntrospector::new(client, config.schema()).load().await?,
        (None, None) => {
            return Err(MigenError::Configuration(
                "no schema source: set connection_string or schema_file".to_string(),
            ))
        }
    };

    Ok(SchemaSource { snapshot, client })
}

pub(crate) async fn connect(config: &MigenConfig) -> Result<Client> {
    let url = config.connection_string.as_deref().ok_or_else(|| {
        MigenError::Configuration(
            "no connection string: pass --connection-string or set connection_string in migen.toml"
                .to_string(),
        )
    })?;

    let db_config = DatabaseConfig::from_url(url)?.merge_tls_config(config.build_tls_config()?);
    connect_to_database(&db_config).await
}
