//! Identity collaborator: resolves opaque user ids to profile data.
//!
//! The provider behind [`IdentityProvider`] is usually remote. Callers go
//! through [`IdentityClient`], which bounds every call with the timeouts in
//! [`IdentityConfig`](crate::config::IdentityConfig) and maps transport
//! failures to [`FolioError::DownstreamUnavailable`](crate::FolioError).

mod client;
mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{FolioError, UserId};

pub use client::IdentityClient;
pub use memory::InMemoryIdentityProvider;

/// Public profile of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Account-level role label, e.g. `MANAGER` or `MEMBER`.
    pub role_label: String,
}

/// Implement this trait for the identity service (GraphQL, REST, LDAP, ...).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns `Ok(None)` only when the provider explicitly reports the user
    /// as absent. Transport failures are errors.
    async fn get_user(&self, id: UserId) -> Result<Option<UserProfile>, FolioError>;

    /// Unknown ids are omitted from the result.
    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<UserProfile>, FolioError>;
}
