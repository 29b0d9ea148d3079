mod common;

use common::{assertions::*, fixtures, init_test_tracing, TestEnvironment};
use migen::commands::{execute_generate, execute_snapshot};
use migen::db::{MigrationRepository, PgIntrospector};
use migen::output::CollectingOutputHandler;
use migen::{GeneratorOptions, Generator, SchemaIntrospector, SchemaSnapshot};
use std::fs;

#[tokio::test]
async fn test_introspect_blog_schema() -> Result<(), Box<dyn std::error::Error>> {
    init_test_tracing();

    let env = TestEnvironment::new().await?;
    env.execute_sql(fixtures::sql::CREATE_BLOG_SCHEMA).await?;

    let snapshot = PgIntrospector::new(&env.client, "public").load().await?;

    assert_eq!(snapshot.list_tables(), vec!["comments", "posts", "users"]);

    let users = snapshot.list_columns("users");
    assert_eq!(users[0].name, "id");
    assert_eq!(users[0].raw_type, "integer");
    assert!(users[0].auto_increment);
    assert_eq!(users[0].default, None);
    assert_eq!(users[1].length, Some(255));
    assert_eq!(users[2].default.as_deref(), Some("0"));

    let primary = snapshot
        .list_indexes("users")
        .into_iter()
        .find(|index| index.is_primary)
        .expect("primary key index");
    assert_eq!(primary.name, "PRIMARY");

    assert_eq!(snapshot.enum_values("posts", "status"), vec!["draft", "published"]);

    let post_foreign_keys = snapshot.list_foreign_keys("posts");
    assert_eq!(post_foreign_keys[0].referenced_table, "users");
    assert_eq!(post_foreign_keys[0].option("onDelete"), Some("CASCADE"));
    assert_eq!(post_foreign_keys[0].option("onUpdate"), Some("NO ACTION"));

    Ok(())
}

#[tokio::test]
async fn test_generate_from_live_schema() -> Result<(), Box<dyn std::error::Error>> {
    init_test_tracing();

    let env = TestEnvironment::new().await?;
    env.execute_sql(fixtures::sql::CREATE_BLOG_SCHEMA).await?;

    let snapshot = PgIntrospector::new(&env.client, "public").load().await?;
    let options = GeneratorOptions {
        check_table_dependencies: true,
        ..Default::default()
    };
    let generation = Generator::new(&snapshot, &options).generate(&[])?;

    assert_eq!(generation.tables, vec!["users", "posts", "comments"]);

    let users = find_migration(&generation.migrations, "create_users_table");
    assert_up_contains(users, "$table->integer('id', true);");
    assert_up_contains(users, "$table->string('email')->unique();");
    assert_up_contains(users, "$table->boolean('is_admin')->default(0);");
    assert_up_contains(users, "$table->timestamps();");

    let posts = find_migration(&generation.migrations, "create_posts_table");
    assert_up_contains(posts, "$table->string('title', 120);");
    assert_up_contains(posts, "$table->enum('status', ['draft', 'published'])->default('draft');");
    assert_up_contains(posts, "$table->decimal('rating', 10)->nullable();");
    assert_up_contains(
        posts,
        "$table->timestamp('published_at')->default(DB::raw('CURRENT_TIMESTAMP'));",
    );
    assert_up_contains(posts, "$table->softDeletes();");
    assert_up_contains(posts, "$table->index(['user_id', 'status']);");

    let post_keys = find_migration(&generation.migrations, "add_foreign_keys_to_posts_table");
    assert_up_contains(
        post_keys,
        "$table->foreign('user_id')->references('id')->on('users')->onUpdate('NO ACTION')->onDelete('CASCADE');",
    );

    let comment_keys = find_migration(&generation.migrations, "add_foreign_keys_to_comments_table");
    assert_up_contains(comment_keys, "$table->foreign('post_id', 'comments_post_id_fkey')");
    assert!(comment_keys.down.contains("$table->dropForeign('comments_post_id_fkey');"));

    Ok(())
}

#[tokio::test]
async fn test_generate_logs_migrations() -> Result<(), Box<dyn std::error::Error>> {
    init_test_tracing();

    let env = TestEnvironment::new().await?;
    env.execute_sql(fixtures::sql::CREATE_BLOG_SCHEMA).await?;

    let mut config = env.config();
    config.log_migrations = Some(true);
    config.check_table_dependencies = Some(true);
    let output = CollectingOutputHandler::new();

    let result = execute_generate(&config, &["posts".to_string()], &output).await?;

    assert_eq!(result.batch, Some(0));
    assert_eq!(result.logged, 3);
    let logged = env.logged_migrations().await?;
    let identifiers: Vec<String> = logged.iter().map(|(migration, _)| migration.clone()).collect();
    assert_eq!(identifiers, result.migrations);
    assert!(logged.iter().all(|(_, batch)| *batch == 0));
    assert!(identifiers[0].ends_with("_create_users_table"));
    assert!(identifiers[2].ends_with("_add_foreign_keys_to_posts_table"));

    for identifier in &identifiers {
        assert!(env.migrations_dir.join(format!("{identifier}.php")).exists());
    }

    Ok(())
}

#[tokio::test]
async fn test_migration_repository() -> Result<(), Box<dyn std::error::Error>> {
    let env = TestEnvironment::new().await?;
    let repository = MigrationRepository::new(&env.client);

    assert!(!repository.exists().await?);
    repository.create_repository().await?;
    assert!(repository.exists().await?);

    assert_eq!(repository.next_batch_number().await?, 1);
    repository.log("2024_01_01_000001_create_users_table", 0).await?;
    repository.log("2024_01_01_000002_create_posts_table", 3).await?;
    assert_eq!(repository.next_batch_number().await?, 4);

    let records = repository.logged_migrations().await?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].migration, "2024_01_01_000001_create_users_table");
    assert_eq!(records[1].batch, 3);

    Ok(())
}

#[tokio::test]
async fn test_snapshot_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let env = TestEnvironment::new().await?;
    env.execute_sql(fixtures::sql::CREATE_BLOG_SCHEMA).await?;

    let path = env.temp_dir.path().join("schema.json");
    let result = execute_snapshot(&env.config(), &path).await?;
    assert_eq!(result.tables, 3);

    let saved = SchemaSnapshot::load_from_file(&path)?;
    let live = PgIntrospector::new(&env.client, "public").load().await?;
    assert_eq!(saved, live);
    assert!(fs::read_to_string(&path)?.contains("\"post_status\""));

    Ok(())
}
