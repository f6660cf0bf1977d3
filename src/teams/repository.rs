use async_trait::async_trait;

use super::types::{RosterEntry, Team, TeamRole};
use crate::{FolioError, TeamId, UserId};

#[derive(Debug, Clone)]
pub struct CreateTeam {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct CreateRosterEntry {
    pub team_id: TeamId,
    pub user_id: UserId,
    pub role: TeamRole,
}

#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// `Err(FolioError::Conflict)` when the name is taken.
    async fn create(&self, data: CreateTeam) -> Result<Team, FolioError>;
    async fn find_by_id(&self, id: TeamId) -> Result<Option<Team>, FolioError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Team>, FolioError>;
}

/// Authoritative roster storage.
#[async_trait]
pub trait RosterRepository: Send + Sync {
    /// `Err(FolioError::Conflict)` when the user already has an entry in the team.
    async fn create(&self, data: CreateRosterEntry) -> Result<RosterEntry, FolioError>;
    async fn find_role(&self, team_id: TeamId, user_id: UserId)
    -> Result<Option<TeamRole>, FolioError>;
    async fn exists(&self, team_id: TeamId, user_id: UserId) -> Result<bool, FolioError>;
    async fn list_members(&self, team_id: TeamId) -> Result<Vec<RosterEntry>, FolioError>;
    /// `Err(FolioError::NotFound)` when there is no such entry.
    async fn delete(&self, team_id: TeamId, user_id: UserId) -> Result<(), FolioError>;
}
