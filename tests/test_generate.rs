mod common;

use chrono::NaiveDate;
use common::{assertions::*, fixtures::snapshots, init_test_tracing};
use migen::commands::execute_generate;
use migen::output::CollectingOutputHandler;
use migen::schema::ColumnDescriptor;
use migen::writer::MigrationSink;
use migen::{
    generate_migrations, FileSink, GeneratorOptions, Generator, MemorySink, MigenConfig,
    SchemaSnapshot, TableSnapshot,
};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_generate_all_tables_with_separate_foreign_keys() {
    init_test_tracing();

    let snapshot = snapshots::blog();
    let options = GeneratorOptions::default();
    let generation = Generator::new(&snapshot, &options).generate(&[]).unwrap();

    assert_migration_names(
        &generation.migrations,
        &[
            "create_comments_table",
            "create_posts_table",
            "create_users_table",
            "create_tags_table",
            "add_foreign_keys_to_comments_table",
            "add_foreign_keys_to_posts_table",
        ],
    );
    assert!(generation.skipped.is_empty());
    assert!(!generation.tables.contains(&"migrations".to_string()));
}

#[test]
fn test_generated_create_statements() {
    let snapshot = snapshots::blog();
    let options = GeneratorOptions::default();
    let generation = Generator::new(&snapshot, &options).generate(&[]).unwrap();

    let posts = find_migration(&generation.migrations, "create_posts_table");
    assert_eq!(posts.class_name, "CreatePostsTable");
    assert!(posts.up.starts_with("Schema::create('posts', function(Blueprint $table)\n\t\t{\n"));
    assert_up_contains(posts, "\t\t\t$table->increments('id');\n");
    assert_up_contains(posts, "$table->integer('user_id')->unsigned();");
    assert_up_contains(posts, "$table->string('title');");
    assert_up_contains(posts, "$table->string('slug', 100)->unique();");
    assert_up_contains(posts, "$table->enum('status', ['draft', 'published'])->default('draft');");
    assert_up_contains(posts, "$table->decimal('rating', 10);");
    assert_up_contains(posts, "$table->softDeletes();");
    assert_up_contains(posts, "$table->timestamps();");
    assert_up_contains(posts, "$table->index(['user_id', 'status']);");
    assert_up_lacks(posts, "created_at");
    assert_up_lacks(posts, "dateTime");
    assert!(posts.up.ends_with("\t\t});"));
    assert_eq!(posts.down, "Schema::drop('posts');");

    let users = find_migration(&generation.migrations, "create_users_table");
    assert_up_contains(users, "$table->string('email')->unique();");
    assert_up_contains(users, "$table->boolean('is_admin')->default(0);");

    let comments = find_migration(&generation.migrations, "create_comments_table");
    assert_up_contains(comments, "$table->integer('post_id')->unsigned()->index();");
    assert_up_contains(comments, "$table->integer('user_id')->unsigned()->nullable();");
    assert_up_lacks(comments, "foreign(");
}

#[test]
fn test_generated_foreign_key_migrations() {
    let snapshot = snapshots::blog();
    let options = GeneratorOptions::default();
    let generation = Generator::new(&snapshot, &options).generate(&[]).unwrap();

    let comments = find_migration(&generation.migrations, "add_foreign_keys_to_comments_table");
    assert!(comments.up.starts_with("Schema::table('comments', function(Blueprint $table)"));
    assert_up_contains(
        comments,
        "$table->foreign('post_id')->references('id')->on('posts')->onUpdate('RESTRICT')->onDelete('CASCADE');",
    );
    assert_up_contains(
        comments,
        "$table->foreign('user_id', 'comments_author_fk')->references('id')->on('users')->onUpdate('RESTRICT')->onDelete('SET NULL');",
    );
    assert!(comments.down.contains("$table->dropForeign('comments_post_id_foreign');"));
    assert!(comments.down.contains("$table->dropForeign('comments_author_fk');"));
}

#[test]
fn test_ignore_names_drops_explicit_names() {
    let snapshot = SchemaSnapshot::new().with_table(
        "orders",
        TableSnapshot::new()
            .column(snapshots::increments("id"))
            .column(ColumnDescriptor::new("reference", "string").length(40))
            .column(ColumnDescriptor::new("customer_id", "integer").unsigned())
            .index(migen::schema::IndexDescriptor::new("orders_ref_key", &["reference"]).unique())
            .foreign_key(migen::schema::ForeignKeyDescriptor::new(
                "orders_customer_fkey",
                "customer_id",
                "customers",
                "id",
            )),
    );

    let named = GeneratorOptions::default();
    let generation = Generator::new(&snapshot, &named).generate(&[]).unwrap();
    assert_up_contains(&generation.migrations[0], "->unique('orders_ref_key');");
    assert_up_contains(&generation.migrations[1], "$table->foreign('customer_id', 'orders_customer_fkey')");

    let unnamed = GeneratorOptions {
        ignore_index_names: true,
        ignore_foreign_key_names: true,
        ..Default::default()
    };
    let generation = Generator::new(&snapshot, &unnamed).generate(&[]).unwrap();
    assert_up_contains(&generation.migrations[0], "$table->string('reference', 40)->unique();");
    assert_up_contains(&generation.migrations[1], "$table->foreign('customer_id')->references('id')");
    assert!(generation.migrations[1]
        .down
        .contains("$table->dropForeign('orders_customer_id_foreign');"));
}

#[test]
fn test_table_prefix_and_connection() {
    let snapshot = SchemaSnapshot::new()
        .with_prefix("wp_")
        .with_table(
            "wp_posts",
            TableSnapshot::new()
                .column(snapshots::increments("id"))
                .column(ColumnDescriptor::new("author_id", "integer").unsigned())
                .foreign_key(migen::schema::ForeignKeyDescriptor::new(
                    "wp_posts_author_id_foreign",
                    "author_id",
                    "wp_authors",
                    "id",
                )),
        );
    let options = GeneratorOptions {
        connection_name: Some("legacy".to_string()),
        ..Default::default()
    };

    let generation = Generator::new(&snapshot, &options).generate(&[]).unwrap();

    let create = &generation.migrations[0];
    assert_eq!(create.name, "create_wp_posts_table");
    assert!(create.up.starts_with("Schema::connection('legacy')->create('posts',"));
    assert_eq!(create.down, "Schema::connection('legacy')->drop('posts');");
    assert_up_contains(&generation.migrations[1], "->on('authors')");
}

#[test]
fn test_requested_and_excluded_tables() {
    let snapshot = snapshots::blog();
    let options = GeneratorOptions {
        excluded_tables: vec!["migrations".to_string(), "tags".to_string()],
        ..Default::default()
    };
    let generator = Generator::new(&snapshot, &options);

    let generation = generator
        .generate(&["tags".to_string(), "users".to_string(), "missing".to_string()])
        .unwrap();

    assert_migration_names(&generation.migrations, &["create_users_table"]);
    assert_eq!(generation.skipped, vec!["missing".to_string()]);
}

#[test]
fn test_generate_migrations_into_memory_sink() {
    let snapshot = snapshots::blog();
    let mut sink = MemorySink::new();

    let identifiers = generate_migrations(
        &snapshot,
        &["users".to_string()],
        &GeneratorOptions::default(),
        &mut sink,
    )
    .unwrap();

    assert_eq!(identifiers, vec!["0001_create_users_table".to_string()]);
    let stored = &sink.migrations[0];
    assert_stored_contains(stored, "class CreateUsersTable extends Migration {");
    assert_stored_contains(stored, "\tpublic function up()\n\t{\n\t\tSchema::create('users'");
    assert_stored_contains(stored, "\tpublic function down()\n\t{\n\t\tSchema::drop('users');\n\t}");
}

#[test]
fn test_file_sink_prefixes_advance_per_file() {
    let temp_dir = tempdir().unwrap();
    let base = NaiveDate::from_ymd_opt(2024, 3, 9)
        .unwrap()
        .and_hms_opt(23, 59, 58)
        .unwrap();
    let mut sink = FileSink::new(temp_dir.path()).with_base_time(base);

    let snapshot = snapshots::blog();
    let options = GeneratorOptions::default();
    let generation = Generator::new(&snapshot, &options)
        .generate(&["tags".to_string(), "users".to_string()])
        .unwrap();

    let identifiers: Vec<String> = generation
        .migrations
        .iter()
        .map(|m| sink.write(m).unwrap())
        .collect();

    assert_eq!(
        identifiers,
        vec![
            "2024_03_09_235959_create_tags_table".to_string(),
            "2024_03_10_000000_create_users_table".to_string(),
        ]
    );
    let contents =
        fs::read_to_string(temp_dir.path().join("2024_03_10_000000_create_users_table.php")).unwrap();
    assert!(contents.starts_with("<?php"));
    assert!(contents.contains("$table->string('email')->unique();"));
}

#[tokio::test]
async fn test_execute_generate_from_snapshot_file() {
    init_test_tracing();

    let temp_dir = tempdir().unwrap();
    let schema_file = temp_dir.path().join("schema.json");
    snapshots::blog().save_to_file(&schema_file).unwrap();

    let migrations_dir = temp_dir.path().join("database").join("migrations");
    fs::create_dir_all(&migrations_dir).unwrap();
    fs::write(migrations_dir.join("2014_10_12_000000_stale.php"), "<?php").unwrap();
    fs::write(migrations_dir.join(".gitkeep"), "").unwrap();

    let template = temp_dir.path().join("migration.stub");
    fs::write(&template, "// {{class}}\nup: {{up}}\ndown: {{down}}\n").unwrap();

    let config = MigenConfig {
        schema_file: Some(schema_file),
        migrations_dir: Some(migrations_dir.clone()),
        template: Some(template),
        check_table_dependencies: Some(true),
        separate_foreign_key_migrations: Some(false),
        clear: Some(true),
        ..Default::default()
    };
    let output = CollectingOutputHandler::new();

    let result = execute_generate(&config, &["comments".to_string()], &output)
        .await
        .unwrap();

    assert_eq!(result.cleared, 1);
    assert_eq!(result.logged, 0);
    assert_eq!(result.batch, None);
    assert_eq!(result.tables, vec!["users", "posts", "comments"]);
    assert_eq!(output.written_migrations(), result.migrations);
    assert!(result.migrations[0].ends_with("_create_users_table"));
    assert!(migrations_dir.join(".gitkeep").exists());

    let comments_file = migrations_dir.join(format!("{}.php", result.migrations[2]));
    let contents = fs::read_to_string(comments_file).unwrap();
    assert!(contents.starts_with("// CreateCommentsTable\nup: Schema::create('comments'"));
    assert!(contents.contains("});\n\n\t\tSchema::table('comments'"));
    assert!(contents.contains("down: Schema::table('comments'"));

    let php_files = fs::read_dir(&migrations_dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "php"))
        .count();
    assert_eq!(php_files, 3);
}

#[tokio::test]
async fn test_execute_generate_without_schema_source() {
    let output = CollectingOutputHandler::new();

    let result = execute_generate(&MigenConfig::default(), &[], &output).await;

    assert!(matches!(result, Err(migen::MigenError::Configuration(_))));
}
