//! Embedded schema migrations for `SQLite`.
//!
//! # Example
//!
//! ```rust,ignore
//! use folio::sqlite::migrations;
//! use sqlx::SqlitePool;
//!
//! async fn setup_database(pool: &SqlitePool) -> Result<(), sqlx::Error> {
//!     migrations::run(pool).await?;
//!     Ok(())
//! }
//! ```

use sqlx::{Executor, SqlitePool};

const MIGRATIONS: &[(&str, &str)] = &[
    (
        "20250301000001_create_teams_table",
        include_str!("../../migrations_sqlite/20250301000001_create_teams_table.sql"),
    ),
    (
        "20250301000002_create_team_rosters_table",
        include_str!("../../migrations_sqlite/20250301000002_create_team_rosters_table.sql"),
    ),
    (
        "20250301000003_create_folders_table",
        include_str!("../../migrations_sqlite/20250301000003_create_folders_table.sql"),
    ),
    (
        "20250301000004_create_notes_table",
        include_str!("../../migrations_sqlite/20250301000004_create_notes_table.sql"),
    ),
    (
        "20250301000005_create_shares_table",
        include_str!("../../migrations_sqlite/20250301000005_create_shares_table.sql"),
    ),
];

/// Applies pending migrations in order, recording them in `_folio_migrations`.
pub async fn run(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    pool.execute(
        r"
        CREATE TABLE IF NOT EXISTS _folio_migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )
        ",
    )
    .await?;

    for (name, sql) in MIGRATIONS {
        let applied: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _folio_migrations WHERE name = ?)")
                .bind(*name)
                .fetch_one(pool)
                .await?;
        if applied {
            continue;
        }

        // statements are split on `;`, so migrations must not put one inside a literal
        for statement in sql.split(';') {
            let trimmed = statement.trim();
            if !trimmed.is_empty() {
                pool.execute(trimmed).await?;
            }
        }

        sqlx::query("INSERT INTO _folio_migrations (name) VALUES (?)")
            .bind(*name)
            .execute(pool)
            .await?;

        log::info!(target: "folio", "msg=\"migration applied\", name=\"{name}\"");
    }

    Ok(())
}
