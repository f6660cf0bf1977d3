//! Team-scoped folders, notes and shares, with an access-control engine that
//! decides for every operation whether a user may read or mutate a resource.
//!
//! The crate is organised around four components:
//!
//! - [`teams`]: teams, rosters and the membership rules for managers
//! - [`assets`]: folders, notes and shares and the actions over them
//! - [`access`]: the rule chain that turns ownership, shares and team roles
//!   into an allow/deny decision
//! - [`cache`]: a read-through, TTL-based cache of team member sets
//!
//! Collaborators (storage, identity lookups, notification transport, cache
//! backend) are traits. In-memory implementations ship with the crate; a
//! `SQLite` backend is available behind the `sqlx_sqlite` feature.

use std::fmt;

pub mod access;
pub mod assets;
pub mod cache;
pub mod config;
pub mod events;
pub mod identity;
mod ids;
pub mod teams;

#[cfg(feature = "sqlx_sqlite")]
pub mod sqlite;

pub use access::{AccessResolver, Decision, DenyReason, Grant, GrantSource, Operation, Target};
pub use config::FolioConfig;
pub use ids::{FolderId, NoteId, ShareId, TeamId, UserId};

/// Errors surfaced by every folio operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolioError {
    /// The resource, team or roster entry does not exist.
    NotFound,
    /// An access-control rule denied the operation.
    Forbidden(DenyReason),
    /// Malformed identifiers, unknown tags or invalid field values.
    InvalidInput(String),
    /// The entity already exists (duplicate roster entry, team name).
    Conflict(String),
    /// A remote collaborator failed or timed out.
    DownstreamUnavailable(String),
    /// The storage backend failed.
    DatabaseError(String),
    Internal(String),
}

/// Coarse classification of [`FolioError`] for transport layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    InvalidInput,
    Conflict,
    DownstreamUnavailable,
    Storage,
    Internal,
}

impl FolioError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::DownstreamUnavailable(_) => ErrorKind::DownstreamUnavailable,
            Self::DatabaseError(_) => ErrorKind::Storage,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns the deny reason when this is an access-control denial.
    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Self::Forbidden(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl std::error::Error for FolioError {}

impl fmt::Display for FolioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "Not found"),
            Self::Forbidden(reason) => write!(f, "Forbidden: {}", reason.code()),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::DownstreamUnavailable(msg) => write!(f, "Downstream unavailable: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl From<DenyReason> for FolioError {
    fn from(reason: DenyReason) -> Self {
        Self::Forbidden(reason)
    }
}
