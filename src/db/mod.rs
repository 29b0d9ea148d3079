pub mod connection;
pub mod introspect;
pub mod state;
pub mod tls;

pub use connection::{connect_to_database, connect_with_url, DatabaseConfig};
pub use introspect::PgIntrospector;
pub use state::{MigrationRecord, MigrationRepository, MIGRATIONS_TABLE};
pub use tls::{TlsConfig, TlsMode};
