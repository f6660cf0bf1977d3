use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::{IdentityProvider, UserProfile};
use crate::{FolioError, UserId};

/// Identity provider backed by a local map.
///
/// Useful for tests and for deployments where profiles are loaded from
/// configuration.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityProvider {
    users: Arc<RwLock<HashMap<UserId, UserProfile>>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a profile.
    pub fn insert(&self, profile: UserProfile) {
        if let Ok(mut users) = self.users.write() {
            users.insert(profile.id, profile);
        }
    }

    /// Creates a profile with a fresh id and returns it.
    pub fn register(&self, username: &str, email: &str, role_label: &str) -> UserProfile {
        let profile = UserProfile {
            id: UserId::new(),
            username: username.to_owned(),
            email: email.to_owned(),
            role_label: role_label.to_owned(),
        };
        self.insert(profile.clone());
        profile
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn get_user(&self, id: UserId) -> Result<Option<UserProfile>, FolioError> {
        let users = self
            .users
            .read()
            .map_err(|_| FolioError::Internal("lock poisoned".into()))?;
        Ok(users.get(&id).cloned())
    }

    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<UserProfile>, FolioError> {
        let users = self
            .users
            .read()
            .map_err(|_| FolioError::Internal("lock poisoned".into()))?;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }
}
