//! Read side of the team directory.

use std::collections::HashSet;

use async_trait::async_trait;

use super::repository::RosterRepository;
use super::types::TeamRole;
use crate::cache::{CacheBackend, CacheLookup, TeamMembershipCache};
use crate::{FolioError, TeamId, UserId};

/// Membership and role queries used by access decisions.
#[async_trait]
pub trait MembershipLookup: Send + Sync {
    async fn role_of(&self, team_id: TeamId, user_id: UserId)
    -> Result<Option<TeamRole>, FolioError>;

    async fn is_member(&self, team_id: TeamId, user_id: UserId) -> Result<bool, FolioError>;

    /// True for `MANAGER` and `MAIN_MANAGER`.
    async fn is_manager(&self, team_id: TeamId, user_id: UserId) -> Result<bool, FolioError> {
        Ok(self
            .role_of(team_id, user_id)
            .await?
            .is_some_and(|role| role.is_manager()))
    }
}

/// Roster reads with the member-set cache in front.
///
/// Roles always come from the roster because the cache only holds ids.
/// Membership checks consult the cache first; a cached "yes" is trusted for
/// up to one TTL, a cached "no" is confirmed against the roster so newly
/// added members are not refused, and a confirmed newcomer is added to the
/// cached set. The directory never invalidates the cache on roster writes.
#[derive(Debug, Clone)]
pub struct TeamDirectory<R, B> {
    roster: R,
    cache: TeamMembershipCache<B>,
}

impl<R, B> TeamDirectory<R, B>
where
    R: RosterRepository,
    B: CacheBackend,
{
    pub fn new(roster: R, cache: TeamMembershipCache<B>) -> Self {
        Self { roster, cache }
    }

    pub fn roster(&self) -> &R {
        &self.roster
    }

    pub fn cache(&self) -> &TeamMembershipCache<B> {
        &self.cache
    }

    /// Member ids of a team, from the cache when possible.
    pub async fn member_ids(&self, team_id: TeamId) -> Result<HashSet<UserId>, FolioError> {
        match self.cache.get(team_id).await {
            CacheLookup::Hit(members) => Ok(members),
            CacheLookup::Miss => Ok(self.refresh_member_ids(team_id).await?.into_iter().collect()),
        }
    }

    /// Reads member ids from the roster and repopulates the cache.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    pub async fn refresh_member_ids(&self, team_id: TeamId) -> Result<Vec<UserId>, FolioError> {
        let ids: Vec<UserId> = self
            .roster
            .list_members(team_id)
            .await?
            .into_iter()
            .map(|entry| entry.user_id)
            .collect();

        self.cache.store(team_id, &ids).await;

        Ok(ids)
    }
}

#[async_trait]
impl<R, B> MembershipLookup for TeamDirectory<R, B>
where
    R: RosterRepository,
    B: CacheBackend,
{
    async fn role_of(
        &self,
        team_id: TeamId,
        user_id: UserId,
    ) -> Result<Option<TeamRole>, FolioError> {
        self.roster.find_role(team_id, user_id).await
    }

    async fn is_member(&self, team_id: TeamId, user_id: UserId) -> Result<bool, FolioError> {
        if let CacheLookup::Hit(members) = self.cache.get(team_id).await {
            if members.contains(&user_id) {
                return Ok(true);
            }
            if !self.roster.exists(team_id, user_id).await? {
                return Ok(false);
            }
            self.cache.add_member(team_id, user_id).await;
            return Ok(true);
        }

        Ok(self.refresh_member_ids(team_id).await?.contains(&user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCacheBackend;
    use crate::config::CacheConfig;
    use crate::teams::{CreateRosterEntry, InMemoryRosterRepository};

    type Directory = TeamDirectory<InMemoryRosterRepository, InMemoryCacheBackend>;

    fn directory() -> Directory {
        TeamDirectory::new(
            InMemoryRosterRepository::new(),
            TeamMembershipCache::new(InMemoryCacheBackend::new(), CacheConfig::default()),
        )
    }

    async fn add(dir: &Directory, team_id: TeamId, user_id: UserId, role: TeamRole) {
        dir.roster()
            .create(CreateRosterEntry {
                team_id,
                user_id,
                role,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_role_queries() {
        let dir = directory();
        let team = TeamId::new();
        let (main, manager, member) = (UserId::new(), UserId::new(), UserId::new());
        add(&dir, team, main, TeamRole::MainManager).await;
        add(&dir, team, manager, TeamRole::Manager).await;
        add(&dir, team, member, TeamRole::Member).await;

        assert_eq!(dir.role_of(team, main).await.unwrap(), Some(TeamRole::MainManager));
        assert!(dir.is_manager(team, main).await.unwrap());
        assert!(dir.is_manager(team, manager).await.unwrap());
        assert!(!dir.is_manager(team, member).await.unwrap());
        assert!(!dir.is_manager(team, UserId::new()).await.unwrap());
    }

    #[tokio::test]
    async fn test_is_member_populates_cache_on_miss() {
        let dir = directory();
        let team = TeamId::new();
        let member = UserId::new();
        add(&dir, team, member, TeamRole::Member).await;

        assert!(!dir.cache().get(team).await.is_hit());
        assert!(dir.is_member(team, member).await.unwrap());
        assert_eq!(
            dir.cache().get(team).await,
            CacheLookup::Hit(HashSet::from([member]))
        );
    }

    #[tokio::test]
    async fn test_cached_membership_survives_removal_until_refresh() {
        let dir = directory();
        let team = TeamId::new();
        let (keeper, leaver) = (UserId::new(), UserId::new());
        add(&dir, team, keeper, TeamRole::Member).await;
        add(&dir, team, leaver, TeamRole::Member).await;
        assert!(dir.is_member(team, leaver).await.unwrap());

        dir.roster().delete(team, leaver).await.unwrap();

        // stale until the next repopulation
        assert!(dir.is_member(team, leaver).await.unwrap());

        dir.refresh_member_ids(team).await.unwrap();
        assert!(!dir.is_member(team, leaver).await.unwrap());
    }

    #[tokio::test]
    async fn test_cached_negative_is_confirmed_against_roster() {
        let dir = directory();
        let team = TeamId::new();
        let (early, late) = (UserId::new(), UserId::new());
        add(&dir, team, early, TeamRole::Member).await;
        dir.member_ids(team).await.unwrap();

        add(&dir, team, late, TeamRole::Member).await;

        assert!(dir.is_member(team, late).await.unwrap());
        assert!(!dir.is_member(team, UserId::new()).await.unwrap());
        assert_eq!(
            dir.cache().get(team).await,
            CacheLookup::Hit(HashSet::from([early, late]))
        );
    }

    #[tokio::test]
    async fn test_empty_team_is_not_cached() {
        let dir = directory();
        let team = TeamId::new();

        assert!(dir.member_ids(team).await.unwrap().is_empty());
        assert_eq!(dir.cache().get(team).await, CacheLookup::Miss);
    }
}
