use crate::error::{MigenError, Result};
use tokio_postgres::Client;
use tracing::{debug, info};

/// Default name of the framework's migration log table
pub const MIGRATIONS_TABLE: &str = "migrations";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecord {
    pub migration: String,
    pub batch: i32,
}

/// The framework's `migrations(id, migration, batch)` log table.
///
/// Logging a generated migration marks it as already run, so the framework will not try to
/// create tables that exist.
pub struct MigrationRepository<'a> {
    client: &'a Client,
    table: String,
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

impl<'a> MigrationRepository<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self {
            client,
            table: MIGRATIONS_TABLE.to_string(),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Whether the log table exists in the current schema
    pub async fn exists(&self) -> Result<bool> {
        let row = self
            .client
            .query_one(
                r#"
                SELECT EXISTS (
                    SELECT 1 FROM information_schema.tables
                    WHERE table_schema = current_schema() AND table_name = $1
                )
                "#,
                &[&self.table],
            )
            .await?;
        Ok(row.get(0))
    }

    /// Create the log table with the framework's layout
    pub async fn create_repository(&self) -> Result<()> {
        self.client
            .execute(
                &format!(
                    r#"
                    CREATE TABLE IF NOT EXISTS {} (
                        id SERIAL PRIMARY KEY,
                        migration VARCHAR(255) NOT NULL,
                        batch INTEGER NOT NULL
                    )
                    "#,
                    quote_ident(&self.table)
                ),
                &[],
            )
            .await?;
        info!(table = %self.table, "Created migration log table");
        Ok(())
    }

    /// `max(batch) + 1`, or 1 for an empty log
    pub async fn next_batch_number(&self) -> Result<i32> {
        let row = self
            .client
            .query_one(
                &format!(
                    "SELECT COALESCE(MAX(batch), 0) + 1 FROM {}",
                    quote_ident(&self.table)
                ),
                &[],
            )
            .await?;
        Ok(row.get(0))
    }

    /// Record a migration as run in `batch`
    pub async fn log(&self, migration: &str, batch: i32) -> Result<()> {
        self.client
            .execute(
                &format!(
                    "INSERT INTO {} (migration, batch) VALUES ($1, $2)",
                    quote_ident(&self.table)
                ),
                &[&migration, &batch],
            )
            .await
            .map_err(|e| MigenError::MigrationLog {
                migration: migration.to_string(),
                message: e.to_string(),
            })?;
        debug!(migration, batch, "Logged migration");
        Ok(())
    }

    /// Logged migrations in run order
    pub async fn logged_migrations(&self) -> Result<Vec<MigrationRecord>> {
        let rows = self
            .client
            .query(
                &format!(
                    "SELECT migration, batch FROM {} ORDER BY batch, migration",
                    quote_ident(&self.table)
                ),
                &[],
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| MigrationRecord {
                migration: row.get(0),
                batch: row.get(1),
            })
            .collect())
    }
}
