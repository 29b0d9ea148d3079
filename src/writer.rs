use crate::commands::generate::MigrationDefinition;
use crate::error::{ErrorContext, MigenError, Result};
use chrono::{Duration, Local, NaiveDateTime};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DEFAULT_TEMPLATE: &str = r#"<?php

use Illuminate\Database\Migrations\Migration;
use Illuminate\Database\Schema\Blueprint;
use Illuminate\Support\Facades\Schema;

class {{class}} extends Migration {

	/**
	 * Run the migrations.
	 *
	 * @return void
	 */
	public function up()
	{
		{{up}}
	}


	/**
	 * Reverse the migrations.
	 *
	 * @return void
	 */
	public function down()
	{
		{{down}}
	}

}
"#;

/// Destination for generated migrations
pub trait MigrationSink {
    /// Persist one migration and return the identifier it was stored under
    fn write(&mut self, migration: &MigrationDefinition) -> Result<String>;
}

/// Fill a migration template's `{{class}}`, `{{up}}` and `{{down}}` placeholders
pub fn render_template(template: &str, migration: &MigrationDefinition) -> String {
    template
        .replace("{{class}}", &migration.class_name)
        .replace("{{up}}", &migration.up)
        .replace("{{down}}", &migration.down)
}

/// Writes `{Y_m_d_His}_{name}.php` files into a migrations directory
#[derive(Debug)]
pub struct FileSink {
    dir: PathBuf,
    template: String,
    base_time: NaiveDateTime,
    written: i64,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            template: DEFAULT_TEMPLATE.to_string(),
            base_time: Local::now().naive_local(),
            written: 0,
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_template_file(self, path: &Path) -> Result<Self> {
        let template = fs::read_to_string(path).file_context(path)?;
        Ok(self.with_template(template))
    }

    /// Fix the time the date prefixes count from
    pub fn with_base_time(mut self, base_time: NaiveDateTime) -> Self {
        self.base_time = base_time;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Remove existing migration files from the target directory, returning how many were removed
    pub fn clear(&self) -> Result<usize> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        for entry in fs::read_dir(&self.dir).file_context(&self.dir)? {
            let path = entry.file_context(&self.dir)?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "php") {
                fs::remove_file(&path).file_context(&path)?;
                debug!(path = %path.display(), "Removed existing migration");
                removed += 1;
            }
        }

        info!(dir = %self.dir.display(), removed, "Cleared migrations directory");
        Ok(removed)
    }

    /// Date prefix of the next file; each file is one second after the previous one
    fn next_prefix(&mut self) -> String {
        self.written += 1;
        (self.base_time + Duration::seconds(self.written))
            .format("%Y_%m_%d_%H%M%S")
            .to_string()
    }
}

impl MigrationSink for FileSink {
    fn write(&mut self, migration: &MigrationDefinition) -> Result<String> {
        fs::create_dir_all(&self.dir).file_context(&self.dir)?;

        let identifier = format!("{}_{}", self.next_prefix(), migration.name.replace('/', "_"));
        let path = self.dir.join(format!("{}.php", identifier));

        fs::write(&path, render_template(&self.template, migration)).map_err(|source| {
            MigenError::FileWrite {
                message: format!("could not write migration {}", migration.name),
                path: path.clone(),
                source,
            }
        })?;
        info!(path = %path.display(), "Wrote migration");

        Ok(identifier)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredMigration {
    pub identifier: String,
    pub contents: String,
}

/// Keeps rendered migrations in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub migrations: Vec<StoredMigration>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MigrationSink for MemorySink {
    fn write(&mut self, migration: &MigrationDefinition) -> Result<String> {
        let identifier = format!("{:04}_{}", self.migrations.len() + 1, migration.name);
        self.migrations.push(StoredMigration {
            identifier: identifier.clone(),
            contents: render_template(DEFAULT_TEMPLATE, migration),
        });
        Ok(identifier)
    }
}
