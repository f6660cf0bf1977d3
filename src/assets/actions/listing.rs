use super::folder_assets;
use crate::access::AccessResolver;
use crate::assets::{AssetRepository, Folder, FolderAssets};
use crate::teams::MembershipLookup;
use crate::{FolioError, TeamId, UserId};

async fn collect<A, M>(
    resolver: &AccessResolver<A, M>,
    folders: Vec<Folder>,
    actor_id: UserId,
) -> Result<Vec<FolderAssets>, FolioError>
where
    A: AssetRepository,
    M: MembershipLookup,
{
    let mut assets = Vec::with_capacity(folders.len());
    for folder in folders {
        assets.push(folder_assets(resolver, folder, actor_id).await?);
    }
    Ok(assets)
}

/// Lists every folder of a team with its notes. Managers only.
pub struct ListTeamAssetsAction<A, M> {
    resolver: AccessResolver<A, M>,
}

impl<A: AssetRepository, M: MembershipLookup> ListTeamAssetsAction<A, M> {
    pub fn new(assets: A, membership: M) -> Self {
        Self {
            resolver: AccessResolver::new(assets, membership),
        }
    }

    /// # Returns
    ///
    /// - `Ok(assets)` - Folders of the team, oldest first
    /// - `Err(FolioError::Forbidden(NotTeamManager))` - Actor does not manage the team
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "list_team_assets", skip_all, err)
    )]
    pub async fn execute(
        &self,
        team_id: TeamId,
        actor_id: UserId,
    ) -> Result<Vec<FolderAssets>, FolioError> {
        self.resolver.authorize_team_listing(team_id, actor_id).await?;

        let folders = self.resolver.assets().folders_by_team(team_id).await?;
        collect(&self.resolver, folders, actor_id).await
    }
}

#[derive(Debug, Clone)]
pub struct ListUserAssetsInput {
    pub actor_id: UserId,
    /// Whose folders to list.
    pub user_id: UserId,
    /// Required when listing someone else; restricts the result to this team.
    pub team_id: Option<TeamId>,
}

/// Lists the folders a user owns.
pub struct ListUserAssetsAction<A, M> {
    resolver: AccessResolver<A, M>,
}

impl<A: AssetRepository, M: MembershipLookup> ListUserAssetsAction<A, M> {
    pub fn new(assets: A, membership: M) -> Self {
        Self {
            resolver: AccessResolver::new(assets, membership),
        }
    }

    /// Users may list their own folders across all teams. A manager may list
    /// a member's folders within the team they manage.
    ///
    /// # Returns
    ///
    /// - `Ok(assets)` - Owned folders with their notes
    /// - `Err(FolioError::Forbidden(NotTeamManager))` - Actor does not manage the team
    /// - `Err(FolioError::Forbidden(TargetNotTeamMember))` - User is not in the team
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "list_user_assets", skip_all, err)
    )]
    pub async fn execute(&self, input: ListUserAssetsInput) -> Result<Vec<FolderAssets>, FolioError> {
        self.resolver
            .authorize_user_listing(input.actor_id, input.user_id, input.team_id)
            .await?;

        let mut folders = self.resolver.assets().folders_by_owner(input.user_id).await?;
        if let Some(team_id) = input.team_id {
            folders.retain(|f| f.team_id == team_id);
        }

        collect(&self.resolver, folders, input.actor_id).await
    }
}
