#![allow(clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use super::repository::{CreateRosterEntry, CreateTeam, RosterRepository, TeamRepository};
use super::types::{RosterEntry, Team, TeamRole};
use crate::{FolioError, TeamId, UserId};

fn lock_err() -> FolioError {
    FolioError::Internal("lock poisoned".into())
}

/// In-memory team storage. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTeamRepository {
    teams: Arc<RwLock<HashMap<TeamId, Team>>>,
}

impl InMemoryTeamRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TeamRepository for InMemoryTeamRepository {
    async fn create(&self, data: CreateTeam) -> Result<Team, FolioError> {
        let mut teams = self.teams.write().map_err(|_| lock_err())?;

        if teams.values().any(|t| t.name == data.name) {
            return Err(FolioError::Conflict(format!(
                "team name {:?} is taken",
                data.name
            )));
        }

        let now = Utc::now();
        let team = Team {
            id: TeamId::new(),
            name: data.name,
            created_at: now,
            updated_at: now,
        };
        teams.insert(team.id, team.clone());

        Ok(team)
    }

    async fn find_by_id(&self, id: TeamId) -> Result<Option<Team>, FolioError> {
        let teams = self.teams.read().map_err(|_| lock_err())?;
        Ok(teams.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Team>, FolioError> {
        let teams = self.teams.read().map_err(|_| lock_err())?;
        Ok(teams.values().find(|t| t.name == name).cloned())
    }
}

/// In-memory roster storage keyed by (team, user). Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRosterRepository {
    entries: Arc<RwLock<HashMap<(TeamId, UserId), RosterEntry>>>,
}

impl InMemoryRosterRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total entries across all teams.
    pub fn len(&self) -> usize {
        self.entries.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RosterRepository for InMemoryRosterRepository {
    async fn create(&self, data: CreateRosterEntry) -> Result<RosterEntry, FolioError> {
        let mut entries = self.entries.write().map_err(|_| lock_err())?;

        let key = (data.team_id, data.user_id);
        if entries.contains_key(&key) {
            return Err(FolioError::Conflict(format!(
                "user {} is already on team {}",
                data.user_id, data.team_id
            )));
        }

        let entry = RosterEntry {
            team_id: data.team_id,
            user_id: data.user_id,
            role: data.role,
            created_at: Utc::now(),
        };
        entries.insert(key, entry.clone());

        Ok(entry)
    }

    async fn find_role(
        &self,
        team_id: TeamId,
        user_id: UserId,
    ) -> Result<Option<TeamRole>, FolioError> {
        let entries = self.entries.read().map_err(|_| lock_err())?;
        Ok(entries.get(&(team_id, user_id)).map(|e| e.role))
    }

    async fn exists(&self, team_id: TeamId, user_id: UserId) -> Result<bool, FolioError> {
        let entries = self.entries.read().map_err(|_| lock_err())?;
        Ok(entries.contains_key(&(team_id, user_id)))
    }

    async fn list_members(&self, team_id: TeamId) -> Result<Vec<RosterEntry>, FolioError> {
        let entries = self.entries.read().map_err(|_| lock_err())?;
        let mut members: Vec<RosterEntry> = entries
            .values()
            .filter(|e| e.team_id == team_id)
            .cloned()
            .collect();
        members.sort_by_key(|e| e.created_at);
        Ok(members)
    }

    async fn delete(&self, team_id: TeamId, user_id: UserId) -> Result<(), FolioError> {
        let mut entries = self.entries.write().map_err(|_| lock_err())?;
        entries
            .remove(&(team_id, user_id))
            .map(|_| ())
            .ok_or(FolioError::NotFound)
    }
}
