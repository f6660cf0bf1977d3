use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use super::{column, db_err, is_unique_violation};
use crate::teams::{
    CreateRosterEntry, CreateTeam, RosterEntry, RosterRepository, Team, TeamRepository, TeamRole,
};
use crate::{FolioError, TeamId, UserId};

/// `SQLite`-backed team repository.
#[derive(Debug, Clone)]
pub struct SqliteTeamRepository {
    pool: SqlitePool,
}

impl SqliteTeamRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct TeamRecord {
    id: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TeamRecord> for Team {
    type Error = FolioError;

    fn try_from(row: TeamRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: column("teams.id", &row.id)?,
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl TeamRepository for SqliteTeamRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create(&self, data: CreateTeam) -> Result<Team, FolioError> {
        let now = Utc::now();
        let row: TeamRecord = sqlx::query_as(
            r"
            INSERT INTO teams (id, name, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, name, created_at, updated_at
            ",
        )
        .bind(TeamId::new().to_string())
        .bind(&data.name)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                FolioError::Conflict(format!("team name {:?} is taken", data.name))
            } else {
                db_err("create_team", &e)
            }
        })?;

        row.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_id(&self, id: TeamId) -> Result<Option<Team>, FolioError> {
        let row: Option<TeamRecord> =
            sqlx::query_as("SELECT id, name, created_at, updated_at FROM teams WHERE id = ?")
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_err("find_team_by_id", &e))?;

        row.map(TryInto::try_into).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_name(&self, name: &str) -> Result<Option<Team>, FolioError> {
        let row: Option<TeamRecord> =
            sqlx::query_as("SELECT id, name, created_at, updated_at FROM teams WHERE name = ?")
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_err("find_team_by_name", &e))?;

        row.map(TryInto::try_into).transpose()
    }
}

/// `SQLite`-backed roster repository.
#[derive(Debug, Clone)]
pub struct SqliteRosterRepository {
    pool: SqlitePool,
}

impl SqliteRosterRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct RosterRecord {
    team_id: String,
    user_id: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RosterRecord> for RosterEntry {
    type Error = FolioError;

    fn try_from(row: RosterRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            team_id: column("team_rosters.team_id", &row.team_id)?,
            user_id: column("team_rosters.user_id", &row.user_id)?,
            role: column::<TeamRole>("team_rosters.role", &row.role)?,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl RosterRepository for SqliteRosterRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create(&self, data: CreateRosterEntry) -> Result<RosterEntry, FolioError> {
        let row: RosterRecord = sqlx::query_as(
            r"
            INSERT INTO team_rosters (team_id, user_id, role, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING team_id, user_id, role, created_at
            ",
        )
        .bind(data.team_id.to_string())
        .bind(data.user_id.to_string())
        .bind(data.role.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                FolioError::Conflict(format!(
                    "user {} is already on team {}",
                    data.user_id, data.team_id
                ))
            } else {
                db_err("create_roster_entry", &e)
            }
        })?;

        row.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_role(
        &self,
        team_id: TeamId,
        user_id: UserId,
    ) -> Result<Option<TeamRole>, FolioError> {
        let role: Option<String> =
            sqlx::query_scalar("SELECT role FROM team_rosters WHERE team_id = ? AND user_id = ?")
                .bind(team_id.to_string())
                .bind(user_id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_err("find_role", &e))?;

        role.map(|raw| column("team_rosters.role", &raw)).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn exists(&self, team_id: TeamId, user_id: UserId) -> Result<bool, FolioError> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM team_rosters WHERE team_id = ? AND user_id = ?)",
        )
        .bind(team_id.to_string())
        .bind(user_id.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("roster_exists", &e))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn list_members(&self, team_id: TeamId) -> Result<Vec<RosterEntry>, FolioError> {
        let rows: Vec<RosterRecord> = sqlx::query_as(
            "SELECT team_id, user_id, role, created_at FROM team_rosters WHERE team_id = ? ORDER BY created_at ASC",
        )
        .bind(team_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("list_members", &e))?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete(&self, team_id: TeamId, user_id: UserId) -> Result<(), FolioError> {
        let result = sqlx::query("DELETE FROM team_rosters WHERE team_id = ? AND user_id = ?")
            .bind(team_id.to_string())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| db_err("delete_roster_entry", &e))?;

        if result.rows_affected() == 0 {
            return Err(FolioError::NotFound);
        }

        Ok(())
    }
}
