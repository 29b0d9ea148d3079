use indoc::indoc;

/// In-memory schemas for offline generation tests
pub mod snapshots {
    use migen::schema::{ColumnDescriptor, ForeignKeyDescriptor, IndexDescriptor};
    use migen::{SchemaSnapshot, TableSnapshot};

    pub fn increments(name: &str) -> ColumnDescriptor {
        ColumnDescriptor::new(name, "integer").unsigned().auto_increment()
    }

    pub fn timestamps(table: TableSnapshot) -> TableSnapshot {
        table
            .column(ColumnDescriptor::new("created_at", "datetime").nullable())
            .column(ColumnDescriptor::new("updated_at", "datetime").nullable())
    }

    /// `users`, `posts(user_id)`, `comments(post_id, user_id)` and `tags`, listed children first
    pub fn blog() -> SchemaSnapshot {
        SchemaSnapshot::new()
            .with_table(
                "comments",
                timestamps(
                    TableSnapshot::new()
                        .column(increments("id"))
                        .column(ColumnDescriptor::new("post_id", "integer").unsigned())
                        .column(ColumnDescriptor::new("user_id", "integer").unsigned().nullable())
                        .column(ColumnDescriptor::new("body", "text")),
                )
                .index(IndexDescriptor::new("PRIMARY", &["id"]).primary())
                .index(IndexDescriptor::new("comments_post_id_index", &["post_id"]))
                .foreign_key(
                    ForeignKeyDescriptor::new("comments_post_id_foreign", "post_id", "posts", "id")
                        .on_delete("CASCADE"),
                )
                .foreign_key(
                    ForeignKeyDescriptor::new("comments_author_fk", "user_id", "users", "id")
                        .on_delete("SET NULL"),
                ),
            )
            .with_table(
                "posts",
                timestamps(
                    TableSnapshot::new()
                        .column(increments("id"))
                        .column(ColumnDescriptor::new("user_id", "integer").unsigned())
                        .column(ColumnDescriptor::new("title", "string").length(255))
                        .column(ColumnDescriptor::new("slug", "string").length(100))
                        .column(
                            ColumnDescriptor::new("status", "enum")
                                .native("enum('draft','published')")
                                .default_value("draft"),
                        )
                        .column(ColumnDescriptor::new("rating", "decimal").precision(10, 2))
                        .column(ColumnDescriptor::new("deleted_at", "datetime").nullable()),
                )
                .index(IndexDescriptor::new("PRIMARY", &["id"]).primary())
                .index(IndexDescriptor::new("posts_slug_unique", &["slug"]).unique())
                .index(IndexDescriptor::new("posts_user_id_status_index", &["user_id", "status"]))
                .foreign_key(ForeignKeyDescriptor::new(
                    "posts_user_id_foreign",
                    "user_id",
                    "users",
                    "id",
                )),
            )
            .with_table(
                "users",
                timestamps(
                    TableSnapshot::new()
                        .column(increments("id"))
                        .column(ColumnDescriptor::new("email", "string").length(255))
                        .column(ColumnDescriptor::new("is_admin", "boolean").default_value("0")),
                )
                .index(IndexDescriptor::new("PRIMARY", &["id"]).primary())
                .index(IndexDescriptor::new("users_email_unique", &["email"]).unique()),
            )
            .with_table(
                "tags",
                TableSnapshot::new()
                    .column(increments("id"))
                    .column(ColumnDescriptor::new("label", "string").length(50)),
            )
            .with_table("migrations", TableSnapshot::new().column(increments("id")))
    }

    /// Two tables whose foreign keys point at each other
    pub fn users_and_teams() -> SchemaSnapshot {
        SchemaSnapshot::new()
            .with_table(
                "users",
                TableSnapshot::new()
                    .column(increments("id"))
                    .column(ColumnDescriptor::new("team_id", "integer").unsigned())
                    .foreign_key(ForeignKeyDescriptor::new(
                        "users_team_id_foreign",
                        "team_id",
                        "teams",
                        "id",
                    )),
            )
            .with_table(
                "teams",
                TableSnapshot::new()
                    .column(increments("id"))
                    .column(ColumnDescriptor::new("owner_id", "integer").unsigned())
                    .foreign_key(ForeignKeyDescriptor::new(
                        "teams_owner_id_foreign",
                        "owner_id",
                        "users",
                        "id",
                    )),
            )
    }
}

/// DDL for live introspection tests
pub mod sql {
    use super::*;

    pub const CREATE_BLOG_SCHEMA: &str = indoc! {r#"
        CREATE TYPE post_status AS ENUM ('draft', 'published');

        CREATE TABLE users (
            id SERIAL PRIMARY KEY,
            email VARCHAR(255) NOT NULL,
            is_admin BOOLEAN NOT NULL DEFAULT false,
            created_at TIMESTAMP NULL,
            updated_at TIMESTAMP NULL,
            CONSTRAINT users_email_unique UNIQUE (email)
        );

        CREATE TABLE posts (
            id SERIAL PRIMARY KEY,
            user_id INTEGER NOT NULL,
            title VARCHAR(120) NOT NULL,
            status post_status NOT NULL DEFAULT 'draft',
            rating NUMERIC(10, 2) NULL,
            published_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            deleted_at TIMESTAMP NULL,
            CONSTRAINT posts_user_id_foreign FOREIGN KEY (user_id)
                REFERENCES users (id) ON DELETE CASCADE
        );

        CREATE INDEX posts_user_id_status_index ON posts (user_id, status);

        CREATE TABLE comments (
            id SERIAL PRIMARY KEY,
            post_id INTEGER NOT NULL REFERENCES posts (id),
            body TEXT NOT NULL
        );
    "#};
}
