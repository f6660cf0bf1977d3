use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use super::clock::{Clock, SystemClock};
use crate::FolioError;

/// Set-valued key/value store with per-key TTL.
///
/// Implement this trait for a shared store (redis, memcached, ...). Members
/// are opaque strings; the typed layer lives in
/// [`TeamMembershipCache`](super::TeamMembershipCache).
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Returns `None` when the key is absent or expired.
    async fn members(&self, key: &str) -> Result<Option<Vec<String>>, FolioError>;

    /// Deletes the key, then inserts `members` with a fresh TTL as one
    /// atomic step. An empty `members` leaves the key deleted.
    async fn replace_members(
        &self,
        key: &str,
        members: Vec<String>,
        ttl: Duration,
    ) -> Result<(), FolioError>;

    /// Adds to an existing set. Does nothing when the key is absent, so a
    /// partial set is never mistaken for a full roster.
    async fn add_member(&self, key: &str, member: String) -> Result<(), FolioError>;

    async fn remove_member(&self, key: &str, member: &str) -> Result<(), FolioError>;

    /// Resets the TTL of a live key. Returns false when the key is absent.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, FolioError>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    members: HashSet<String>,
    expires_at: DateTime<Utc>,
}

/// In-process cache backend.
///
/// Suitable for single-instance deployments and tests. Expired keys are
/// dropped lazily on access, or in bulk via [`cleanup_expired`](Self::cleanup_expired).
#[derive(Debug, Clone)]
pub struct InMemoryCacheBackend<C: Clock = SystemClock> {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    clock: C,
}

impl InMemoryCacheBackend<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for InMemoryCacheBackend<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> InMemoryCacheBackend<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// call periodically in long-running applications to prevent memory growth
    pub fn cleanup_expired(&self) {
        let now = self.clock.now();
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|_, entry| entry.expires_at > now);
        }
    }

    /// Number of keys currently held, expired or not.
    pub fn len(&self) -> usize {
        self.entries.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_err() -> FolioError {
        FolioError::Internal("cache lock poisoned".to_owned())
    }
}

#[async_trait]
#[allow(clippy::significant_drop_tightening)]
impl<C: Clock> CacheBackend for InMemoryCacheBackend<C> {
    async fn members(&self, key: &str) -> Result<Option<Vec<String>>, FolioError> {
        let now = self.clock.now();
        let mut entries = self.entries.write().map_err(|_| Self::lock_err())?;

        let Some(entry) = entries.get(key) else {
            return Ok(None);
        };
        if entry.expires_at > now {
            return Ok(Some(entry.members.iter().cloned().collect()));
        }

        entries.remove(key);
        Ok(None)
    }

    async fn replace_members(
        &self,
        key: &str,
        members: Vec<String>,
        ttl: Duration,
    ) -> Result<(), FolioError> {
        let expires_at = self.clock.now() + ttl;
        let mut entries = self.entries.write().map_err(|_| Self::lock_err())?;

        entries.remove(key);
        if !members.is_empty() {
            entries.insert(
                key.to_owned(),
                CacheEntry {
                    members: members.into_iter().collect(),
                    expires_at,
                },
            );
        }

        Ok(())
    }

    async fn add_member(&self, key: &str, member: String) -> Result<(), FolioError> {
        let now = self.clock.now();
        let mut entries = self.entries.write().map_err(|_| Self::lock_err())?;

        if let Some(entry) = entries.get_mut(key).filter(|e| e.expires_at > now) {
            entry.members.insert(member);
        }

        Ok(())
    }

    async fn remove_member(&self, key: &str, member: &str) -> Result<(), FolioError> {
        let mut entries = self.entries.write().map_err(|_| Self::lock_err())?;

        let now_empty = entries.get_mut(key).is_some_and(|entry| {
            entry.members.remove(member);
            entry.members.is_empty()
        });
        // an emptied set disappears, like a redis set
        if now_empty {
            entries.remove(key);
        }

        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, FolioError> {
        let now = self.clock.now();
        let mut entries = self.entries.write().map_err(|_| Self::lock_err())?;

        match entries.get_mut(key) {
            Some(entry) if entry.expires_at > now => {
                entry.expires_at = now + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
