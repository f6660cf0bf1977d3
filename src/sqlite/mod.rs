//! `SQLite` implementations of the storage traits.
//!
//! Enable the `sqlx_sqlite` feature to use them. Identifiers are stored as
//! hyphenated UUID text, timestamps as RFC 3339 text.

mod assets;
pub mod migrations;
mod teams;

pub use assets::SqliteAssetRepository;
pub use teams::{SqliteRosterRepository, SqliteTeamRepository};

use std::str::FromStr;

use sqlx::SqlitePool;

use crate::FolioError;

/// Creates every `SQLite` repository from one connection pool.
pub fn create_repositories(
    pool: SqlitePool,
) -> (SqliteTeamRepository, SqliteRosterRepository, SqliteAssetRepository) {
    (
        SqliteTeamRepository::new(pool.clone()),
        SqliteRosterRepository::new(pool.clone()),
        SqliteAssetRepository::new(pool),
    )
}

fn db_err(operation: &str, e: &sqlx::Error) -> FolioError {
    log::error!(target: "folio", "msg=\"database error\", operation=\"{operation}\", error=\"{e}\"");
    FolioError::DatabaseError(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Parses a stored column, reporting unreadable rows as internal errors.
fn column<T>(name: &str, raw: &str) -> Result<T, FolioError>
where
    T: FromStr<Err = FolioError>,
{
    raw.parse()
        .map_err(|_| FolioError::Internal(format!("corrupt {name} column: {raw:?}")))
}
