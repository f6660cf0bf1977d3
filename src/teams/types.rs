//! Core types for team management.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{FolioError, TeamId, UserId};

/// Longest accepted team name, in characters.
pub const MAX_TEAM_NAME_LEN: usize = 150;

/// A team groups users; folders and notes always belong to exactly one team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    /// Unique across all teams.
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user's role inside one team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamRole {
    /// Exactly one per team, the creator.
    MainManager,
    Manager,
    Member,
}

impl TeamRole {
    /// Convert to string for database storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MainManager => "MAIN_MANAGER",
            Self::Manager => "MANAGER",
            Self::Member => "MEMBER",
        }
    }

    /// True for `MANAGER` and `MAIN_MANAGER`.
    pub fn is_manager(&self) -> bool {
        matches!(self, Self::MainManager | Self::Manager)
    }
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeamRole {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MAIN_MANAGER" => Ok(Self::MainManager),
            "MANAGER" => Ok(Self::Manager),
            "MEMBER" => Ok(Self::Member),
            _ => Err(FolioError::InvalidInput(format!("unknown team role: {s:?}"))),
        }
    }
}

/// Links a user to a team with a role. At most one entry per (team, user).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub team_id: TeamId,
    pub user_id: UserId,
    pub role: TeamRole,
    /// When the user joined the team.
    pub created_at: DateTime<Utc>,
}

/// Account-wide role asserted by the credential layer, independent of teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountRole {
    /// May create teams.
    Manager,
    Member,
}

impl FromStr for AccountRole {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MANAGER" => Ok(Self::Manager),
            "MEMBER" => Ok(Self::Member),
            _ => Err(FolioError::InvalidInput(format!("unknown account role: {s:?}"))),
        }
    }
}

/// The authenticated caller of a team operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub account_role: AccountRole,
}

impl Principal {
    pub fn new(user_id: UserId, account_role: AccountRole) -> Self {
        Self {
            user_id,
            account_role,
        }
    }

    pub fn can_create_teams(&self) -> bool {
        self.account_role == AccountRole::Manager
    }
}

/// Validates and normalizes a team name.
pub fn validate_team_name(name: &str) -> Result<String, FolioError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(FolioError::InvalidInput("team name must not be empty".into()));
    }
    if name.chars().count() > MAX_TEAM_NAME_LEN {
        return Err(FolioError::InvalidInput(format!(
            "team name must be at most {MAX_TEAM_NAME_LEN} characters"
        )));
    }
    Ok(name.to_owned())
}
