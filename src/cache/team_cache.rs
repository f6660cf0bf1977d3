use std::collections::HashSet;
use std::future::Future;

use tokio::time::timeout;

use super::backend::CacheBackend;
use crate::config::CacheConfig;
use crate::{FolioError, TeamId, UserId};

/// Result of a cache read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Hit(HashSet<UserId>),
    /// No usable cached data. Not an error: consult the roster instead.
    Miss,
}

impl CacheLookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

/// Typed, failure-tolerant view over a [`CacheBackend`].
///
/// Every backend call is bounded by [`CacheConfig::operation_timeout`].
/// Backend errors and timeouts are logged and swallowed: reads degrade to
/// [`CacheLookup::Miss`], writes become no-ops.
#[derive(Debug, Clone)]
pub struct TeamMembershipCache<B> {
    backend: B,
    config: CacheConfig,
}

impl<B: CacheBackend> TeamMembershipCache<B> {
    pub fn new(backend: B, config: CacheConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn key(team_id: TeamId) -> String {
        format!("team:{team_id}:members")
    }

    /// Reads the cached member set and slides its expiration.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub async fn get(&self, team_id: TeamId) -> CacheLookup {
        let key = Self::key(team_id);

        let Some(Some(raw)) = self.bounded("get", team_id, self.backend.members(&key)).await else {
            return CacheLookup::Miss;
        };

        let members: HashSet<UserId> = raw
            .iter()
            .filter_map(|member| match member.parse::<UserId>() {
                Ok(id) => Some(id),
                Err(_) => {
                    log::warn!(
                        target: "folio",
                        "msg=\"invalid member id in cache\", team_id={team_id}, member=\"{member}\""
                    );
                    None
                }
            })
            .collect();

        if members.is_empty() {
            return CacheLookup::Miss;
        }

        self.bounded("refresh_ttl", team_id, self.backend.expire(&key, self.config.ttl))
            .await;

        CacheLookup::Hit(members)
    }

    /// Replaces the cached set. An empty list only clears the key.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, members)))]
    pub async fn store(&self, team_id: TeamId, members: &[UserId]) {
        let key = Self::key(team_id);
        let raw = members.iter().map(ToString::to_string).collect();

        self.bounded(
            "store",
            team_id,
            self.backend.replace_members(&key, raw, self.config.ttl),
        )
        .await;
    }

    pub async fn add_member(&self, team_id: TeamId, user_id: UserId) {
        let key = Self::key(team_id);
        self.bounded(
            "add_member",
            team_id,
            self.backend.add_member(&key, user_id.to_string()),
        )
        .await;
    }

    pub async fn remove_member(&self, team_id: TeamId, user_id: UserId) {
        let key = Self::key(team_id);
        self.bounded(
            "remove_member",
            team_id,
            self.backend.remove_member(&key, &user_id.to_string()),
        )
        .await;
    }

    async fn bounded<T, F>(&self, operation: &str, team_id: TeamId, fut: F) -> Option<T>
    where
        F: Future<Output = Result<T, FolioError>>,
    {
        match timeout(self.config.operation_timeout, fut).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                log::warn!(
                    target: "folio",
                    "msg=\"cache operation failed\", operation=\"{operation}\", team_id={team_id}, error=\"{e}\""
                );
                None
            }
            Err(_) => {
                log::warn!(
                    target: "folio",
                    "msg=\"cache operation timed out\", operation=\"{operation}\", team_id={team_id}"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use async_trait::async_trait;
    use chrono::Duration;

    use super::*;
    use crate::cache::{InMemoryCacheBackend, ManualClock};

    /// Backend that fails every call, standing in for an unreachable server.
    struct UnavailableBackend;

    #[async_trait]
    impl CacheBackend for UnavailableBackend {
        async fn members(&self, _key: &str) -> Result<Option<Vec<String>>, FolioError> {
            Err(FolioError::DownstreamUnavailable("connection refused".into()))
        }

        async fn replace_members(
            &self,
            _key: &str,
            _members: Vec<String>,
            _ttl: Duration,
        ) -> Result<(), FolioError> {
            Err(FolioError::DownstreamUnavailable("connection refused".into()))
        }

        async fn add_member(&self, _key: &str, _member: String) -> Result<(), FolioError> {
            Err(FolioError::DownstreamUnavailable("connection refused".into()))
        }

        async fn remove_member(&self, _key: &str, _member: &str) -> Result<(), FolioError> {
            Err(FolioError::DownstreamUnavailable("connection refused".into()))
        }

        async fn expire(&self, _key: &str, _ttl: Duration) -> Result<bool, FolioError> {
            Err(FolioError::DownstreamUnavailable("connection refused".into()))
        }
    }

    /// Backend that never answers.
    struct HangingBackend;

    #[async_trait]
    impl CacheBackend for HangingBackend {
        async fn members(&self, _key: &str) -> Result<Option<Vec<String>>, FolioError> {
            std::future::pending().await
        }

        async fn replace_members(
            &self,
            _key: &str,
            _members: Vec<String>,
            _ttl: Duration,
        ) -> Result<(), FolioError> {
            std::future::pending().await
        }

        async fn add_member(&self, _key: &str, _member: String) -> Result<(), FolioError> {
            std::future::pending().await
        }

        async fn remove_member(&self, _key: &str, _member: &str) -> Result<(), FolioError> {
            std::future::pending().await
        }

        async fn expire(&self, _key: &str, _ttl: Duration) -> Result<bool, FolioError> {
            std::future::pending().await
        }
    }

    fn cache_with_clock() -> (TeamMembershipCache<InMemoryCacheBackend<ManualClock>>, ManualClock) {
        let clock = ManualClock::default();
        let cache = TeamMembershipCache::new(
            InMemoryCacheBackend::with_clock(clock.clone()),
            CacheConfig::default(),
        );
        (cache, clock)
    }

    #[tokio::test]
    async fn test_store_then_get_roundtrip() {
        let (cache, _clock) = cache_with_clock();
        let team = TeamId::new();
        let members = [UserId::new(), UserId::new(), UserId::new()];

        cache.store(team, &members).await;

        assert_eq!(
            cache.get(team).await,
            CacheLookup::Hit(members.iter().copied().collect())
        );
    }

    #[tokio::test]
    async fn test_get_unset_team_is_miss() {
        let (cache, _clock) = cache_with_clock();
        assert_eq!(cache.get(TeamId::new()).await, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_store_empty_is_miss() {
        let (cache, _clock) = cache_with_clock();
        let team = TeamId::new();

        cache.store(team, &[UserId::new()]).await;
        cache.store(team, &[]).await;

        assert_eq!(cache.get(team).await, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let (cache, clock) = cache_with_clock();
        let team = TeamId::new();
        cache.store(team, &[UserId::new()]).await;

        clock.advance(Duration::hours(23));
        assert!(cache.get(team).await.is_hit());

        // the hit above slid the expiration
        clock.advance(Duration::hours(23));
        assert!(cache.get(team).await.is_hit());

        clock.advance(Duration::hours(25));
        assert_eq!(cache.get(team).await, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_invalid_members_are_skipped() {
        let (cache, _clock) = cache_with_clock();
        let team = TeamId::new();
        let valid = UserId::new();
        cache
            .backend()
            .replace_members(
                &TeamMembershipCache::<InMemoryCacheBackend<ManualClock>>::key(team),
                vec![valid.to_string(), "garbage".to_owned()],
                Duration::hours(1),
            )
            .await
            .unwrap();

        assert_eq!(cache.get(team).await, CacheLookup::Hit(HashSet::from([valid])));
    }

    #[tokio::test]
    async fn test_incremental_helpers() {
        let (cache, _clock) = cache_with_clock();
        let team = TeamId::new();
        let (a, b) = (UserId::new(), UserId::new());

        // no set yet: add is ignored rather than creating a partial roster
        cache.add_member(team, a).await;
        assert_eq!(cache.get(team).await, CacheLookup::Miss);

        cache.store(team, &[a]).await;
        cache.add_member(team, b).await;
        cache.remove_member(team, a).await;

        assert_eq!(cache.get(team).await, CacheLookup::Hit(HashSet::from([b])));
    }

    #[tokio::test]
    async fn test_unavailable_backend_degrades_to_miss() {
        let cache = TeamMembershipCache::new(UnavailableBackend, CacheConfig::default());
        let team = TeamId::new();

        cache.store(team, &[UserId::new()]).await;
        cache.add_member(team, UserId::new()).await;

        assert_eq!(cache.get(team).await, CacheLookup::Miss);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_backend_times_out() {
        let config = CacheConfig {
            operation_timeout: StdDuration::from_millis(50),
            ..Default::default()
        };
        let cache = TeamMembershipCache::new(HangingBackend, config);

        assert_eq!(cache.get(TeamId::new()).await, CacheLookup::Miss);
        cache.store(TeamId::new(), &[UserId::new()]).await;
    }
}
