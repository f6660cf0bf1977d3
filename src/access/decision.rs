use std::fmt;

use serde::{Deserialize, Serialize};

use crate::FolioError;
use crate::assets::SharePermission;

/// What the actor wants to do with a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    /// Update the resource or add a note to a folder.
    Write,
    Delete,
    Share,
    Revoke,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::Share => "share",
            Self::Revoke => "revoke",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable reason codes carried by [`FolioError::Forbidden`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    NoAccess,
    InsufficientPermission,
    TargetNotTeamMember,
    NotTeamMember,
    NotTeamManager,
    NotMainManager,
    CannotRemoveSelf,
    CannotRemoveManager,
    TargetNotManager,
    ManagerAccountRequired,
}

impl DenyReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoAccess => "no access",
            Self::InsufficientPermission => "insufficient permission",
            Self::TargetNotTeamMember => "target not a team member",
            Self::NotTeamMember => "not a team member",
            Self::NotTeamManager => "not a team manager",
            Self::NotMainManager => "not the main manager",
            Self::CannotRemoveSelf => "cannot remove yourself",
            Self::CannotRemoveManager => "cannot remove a manager",
            Self::TargetNotManager => "target is not a manager",
            Self::ManagerAccountRequired => "team creation requires manager account",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Which rule produced a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantSource {
    Owner,
    /// Owner of the folder holding the note. Only consulted for deletes.
    FolderOwner,
    DirectShare,
    /// Share on the parent folder of a note.
    InheritedShare,
    TeamManager,
    /// Plain team membership. Only used for folder creation.
    TeamMember,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub permission: SharePermission,
    pub source: GrantSource,
}

impl Grant {
    pub fn new(permission: SharePermission, source: GrantSource) -> Self {
        Self { permission, source }
    }

    pub(crate) fn full(source: GrantSource) -> Self {
        Self::new(SharePermission::Write, source)
    }
}

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow(Grant),
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow(_))
    }

    pub fn grant(&self) -> Option<Grant> {
        match self {
            Self::Allow(grant) => Some(*grant),
            Self::Deny(_) => None,
        }
    }

    /// Turns a denial into `Err(FolioError::Forbidden)`.
    pub fn into_result(self) -> Result<Grant, FolioError> {
        match self {
            Self::Allow(grant) => Ok(grant),
            Self::Deny(reason) => Err(FolioError::Forbidden(reason)),
        }
    }
}
