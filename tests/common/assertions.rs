use migen::writer::StoredMigration;
use migen::MigrationDefinition;

/// Assert that migrations were produced with exactly these names, in this order
pub fn assert_migration_names(migrations: &[MigrationDefinition], expected: &[&str]) {
    let names: Vec<&str> = migrations.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(
        names, expected,
        "Expected migrations {:?}, but generated {:?}",
        expected, names
    );
}

pub fn find_migration<'a>(migrations: &'a [MigrationDefinition], name: &str) -> &'a MigrationDefinition {
    migrations
        .iter()
        .find(|m| m.name == name)
        .unwrap_or_else(|| panic!("Expected a migration named '{}'", name))
}

/// Assert that the up method of a migration contains a statement line
pub fn assert_up_contains(migration: &MigrationDefinition, statement: &str) {
    assert!(
        migration.up.contains(statement),
        "Expected '{}' up to contain\n  {}\nbut it was:\n{}",
        migration.name,
        statement,
        migration.up
    );
}

pub fn assert_up_lacks(migration: &MigrationDefinition, fragment: &str) {
    assert!(
        !migration.up.contains(fragment),
        "Expected '{}' up not to contain '{}', but it was:\n{}",
        migration.name,
        fragment,
        migration.up
    );
}

/// Assert that `first` is created before `second`
pub fn assert_created_before(tables: &[String], first: &str, second: &str) {
    let position = |table: &str| {
        tables
            .iter()
            .position(|t| t == table)
            .unwrap_or_else(|| panic!("Table '{}' missing from {:?}", table, tables))
    };
    assert!(
        position(first) < position(second),
        "Expected '{}' to be created before '{}', order was {:?}",
        first,
        second,
        tables
    );
}

pub fn assert_stored_contains(stored: &StoredMigration, fragment: &str) {
    assert!(
        stored.contents.contains(fragment),
        "Expected stored migration '{}' to contain '{}'",
        stored.identifier,
        fragment
    );
}
