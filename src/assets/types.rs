//! Folders, notes and shares.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{FolderId, FolioError, NoteId, ShareId, TeamId, UserId};

/// The two kinds of shareable resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Folder,
    Note,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Note => "note",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "folder" => Ok(Self::Folder),
            "note" => Ok(Self::Note),
            _ => Err(FolioError::InvalidInput(format!("unknown resource kind: {s:?}"))),
        }
    }
}

/// Permission level carried by a share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharePermission {
    Read,
    Write,
}

impl SharePermission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }

    pub fn allows_write(&self) -> bool {
        matches!(self, Self::Write)
    }
}

impl fmt::Display for SharePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SharePermission {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            _ => Err(FolioError::InvalidInput(format!("unknown permission: {s:?}"))),
        }
    }
}

/// Identifies one folder or note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub id: Uuid,
}

impl ResourceRef {
    pub fn folder(id: FolderId) -> Self {
        Self {
            kind: ResourceKind::Folder,
            id: *id.as_uuid(),
        }
    }

    pub fn note(id: NoteId) -> Self {
        Self {
            kind: ResourceKind::Note,
            id: *id.as_uuid(),
        }
    }

    /// Builds a reference from transport-level strings.
    pub fn parse(kind: &str, id: &str) -> Result<Self, FolioError> {
        Ok(match kind.parse::<ResourceKind>()? {
            ResourceKind::Folder => Self::folder(id.parse()?),
            ResourceKind::Note => Self::note(id.parse()?),
        })
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    pub owner_id: UserId,
    pub team_id: TeamId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub owner_id: UserId,
    pub folder_id: FolderId,
    /// Copied from the folder at creation; folders never change teams.
    pub team_id: TeamId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Grants one user a permission on one resource.
///
/// There is at most one share per (resource, user). Folder shares apply to
/// every note in the folder without being copied onto the notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub id: ShareId,
    pub resource: ResourceRef,
    pub user_id: UserId,
    pub permission: SharePermission,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A folder together with its notes, as returned by asset listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderAssets {
    pub folder: Folder,
    pub notes: Vec<Note>,
}
