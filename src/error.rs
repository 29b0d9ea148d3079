use std::path::PathBuf;
use thiserror::Error;

/// Main error type for migen
#[derive(Error, Debug)]
pub enum MigenError {
    // Schema Source Errors
    #[error("Failed to connect to database: {message}")]
    DatabaseConnection {
        message: String,
        #[source]
        source: tokio_postgres::Error,
    },

    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: tokio_postgres::Error,
    },

    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    #[error("Failed to introspect table {table}: {message}")]
    Introspection {
        table: String,
        message: String,
    },

    #[error("Invalid schema snapshot {path}: {message}")]
    InvalidSnapshot {
        path: PathBuf,
        message: String,
    },

    // File System Errors
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    #[error("Failed to read {path}: {message}")]
    FileRead {
        path: PathBuf,
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {message}")]
    FileWrite {
        path: PathBuf,
        message: String,
        #[source]
        source: std::io::Error,
    },

    // Dependency Resolution Errors
    #[error("Circular dependency detected between tables: {}", .0.join(" -> "))]
    CircularDependency(Vec<String>),

    // Migration Log Errors
    #[error("Failed to log migration {migration}: {message}")]
    MigrationLog {
        migration: String,
        message: String,
    },

    // Configuration Errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to load configuration from {path}: {message}")]
    ConfigLoad {
        path: PathBuf,
        message: String,
    },

    // General Errors
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for MigenError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => MigenError::FileNotFound(PathBuf::from("unknown")),
            std::io::ErrorKind::PermissionDenied => {
                MigenError::PermissionDenied(PathBuf::from("unknown"))
            }
            _ => MigenError::Other(err.to_string()),
        }
    }
}

impl From<tokio_postgres::Error> for MigenError {
    fn from(err: tokio_postgres::Error) -> Self {
        // tokio_postgres does not expose a connect-specific error kind
        if err.to_string().contains("connect") {
            MigenError::DatabaseConnection {
                message: err.to_string(),
                source: err,
            }
        } else {
            MigenError::Database {
                message: err.to_string(),
                source: err,
            }
        }
    }
}

impl From<serde_json::Error> for MigenError {
    fn from(err: serde_json::Error) -> Self {
        MigenError::InvalidSnapshot {
            path: PathBuf::from("unknown"),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for MigenError {
    fn from(err: toml::de::Error) -> Self {
        MigenError::ConfigLoad {
            path: PathBuf::from("migen.toml"),
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for MigenError {
    fn from(err: url::ParseError) -> Self {
        MigenError::InvalidConnectionString(err.to_string())
    }
}

/// Result type alias for migen operations
pub type Result<T> = std::result::Result<T, MigenError>;

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context about which file caused the error
    fn file_context(self, path: impl Into<PathBuf>) -> Result<T>;

    /// Add context about which table was being processed
    fn table_context(self, table: &str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<MigenError>,
{
    fn file_context(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| {
            let mut err = e.into();
            let path = path.into();
            match &mut err {
                MigenError::FileNotFound(p) => *p = path,
                MigenError::PermissionDenied(p) => *p = path,
                MigenError::FileRead { path: p, .. } => *p = path,
                MigenError::FileWrite { path: p, .. } => *p = path,
                MigenError::InvalidSnapshot { path: p, .. } => *p = path,
                MigenError::ConfigLoad { path: p, .. } => *p = path,
                _ => {}
            }
            err
        })
    }

    fn table_context(self, table: &str) -> Result<T> {
        self.map_err(|e| match e.into() {
            MigenError::Database { message, .. } | MigenError::Other(message) => {
                MigenError::Introspection {
                    table: table.to_string(),
                    message,
                }
            }
            err => err,
        })
    }
}

/// Helper function to format error with all its causes
pub fn format_error_chain(err: &MigenError) -> String {
    use std::error::Error;

    let mut output = format!("Error: {}", err);

    let mut current_err: &dyn Error = err;
    while let Some(source) = current_err.source() {
        output.push_str(&format!("\n  Caused by: {}", source));
        current_err = source;
    }

    output
}

/// Helper function to suggest fixes for common errors
pub fn suggest_fix(err: &MigenError) -> Option<String> {
    match err {
        MigenError::DatabaseConnection { .. } => Some(
            "Suggestions:\n\
             - Check if PostgreSQL is running\n\
             - Verify the connection string is correct\n\
             - Or generate offline with --schema-file <snapshot.json>"
                .to_string(),
        ),
        MigenError::InvalidConnectionString(_) => Some(
            "Connection string should be in format:\n\
             postgres://[user[:password]@][host][:port][/dbname][?sslmode=...]"
                .to_string(),
        ),
        MigenError::FileNotFound(path) => Some(format!(
            "File not found: {}\n\
             - Check if the path is correct\n\
             - Ensure you're running migen from the project root",
            path.display()
        )),
        MigenError::CircularDependency(tables) => Some(format!(
            "Tables {} reference each other through foreign keys.\n\
             - Keep foreign keys in separate migrations (separate_foreign_key_migrations = true)\n\
             - Or use the naming dependency mode",
            tables.join(", ")
        )),
        MigenError::Configuration(_) | MigenError::ConfigLoad { .. } => Some(
            "Run 'migen init' to write a sample migen.toml.example".to_string(),
        ),
        _ => None,
    }
}
