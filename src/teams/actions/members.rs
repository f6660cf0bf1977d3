use crate::cache::{CacheBackend, CacheLookup};
use crate::identity::{IdentityClient, IdentityProvider, UserProfile};
use crate::teams::{MembershipLookup, RosterRepository, TeamDirectory, TeamRepository};
use crate::{DenyReason, FolioError, TeamId, UserId};

/// Lists a team's members with their profiles.
///
/// Member ids come from the cache when possible, otherwise from the roster
/// (repopulating the cache). Profiles are resolved through the identity
/// client. A failed or empty profile lookup for cached ids falls back to the
/// roster path once.
pub struct GetMembersAction<T, R, B, P>
where
    T: TeamRepository,
    R: RosterRepository,
    B: CacheBackend,
    P: IdentityProvider,
{
    teams: T,
    directory: TeamDirectory<R, B>,
    identity: IdentityClient<P>,
}

impl<T, R, B, P> GetMembersAction<T, R, B, P>
where
    T: TeamRepository,
    R: RosterRepository,
    B: CacheBackend,
    P: IdentityProvider,
{
    pub fn new(teams: T, directory: TeamDirectory<R, B>, identity: IdentityClient<P>) -> Self {
        Self {
            teams,
            directory,
            identity,
        }
    }

    /// # Returns
    ///
    /// - `Ok(profiles)` - Profiles of the team's members
    /// - `Err(FolioError::NotFound)` - Team does not exist
    /// - `Err(FolioError::Forbidden(NotTeamMember))` - Actor is not on the team
    /// - `Err(FolioError::DownstreamUnavailable(_))` - Identity lookup failed
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "get_members", skip_all, err))]
    pub async fn execute(
        &self,
        team_id: TeamId,
        actor_id: UserId,
    ) -> Result<Vec<UserProfile>, FolioError> {
        self.teams
            .find_by_id(team_id)
            .await?
            .ok_or(FolioError::NotFound)?;

        if !self.directory.is_member(team_id, actor_id).await? {
            return Err(FolioError::Forbidden(DenyReason::NotTeamMember));
        }

        if let CacheLookup::Hit(cached) = self.directory.cache().get(team_id).await {
            let mut ids: Vec<UserId> = cached.into_iter().collect();
            ids.sort();

            match self.identity.get_users(&ids).await {
                Ok(profiles) if !profiles.is_empty() => return Ok(profiles),
                Ok(_) => log::warn!(
                    target: "folio",
                    "msg=\"no profiles for cached members\", team_id={}",
                    team_id
                ),
                Err(err) => log::warn!(
                    target: "folio",
                    "msg=\"profile lookup for cached members failed\", team_id={}, error=\"{}\"",
                    team_id,
                    err
                ),
            }
        }

        let ids = self.directory.refresh_member_ids(team_id).await?;
        self.identity.get_users(&ids).await
    }
}
