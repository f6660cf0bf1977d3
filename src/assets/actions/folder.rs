use super::{folder_assets, load_folder, required};
use crate::access::{AccessResolver, Operation, Target};
use crate::assets::{AssetRepository, CreateFolder, Folder, FolderAssets, UpdateFolder};
use crate::teams::MembershipLookup;
use crate::{FolderId, FolioError, TeamId, UserId};

#[derive(Debug, Clone)]
pub struct CreateFolderInput {
    pub team_id: TeamId,
    pub actor_id: UserId,
    pub name: String,
}

/// Creates a folder owned by the actor inside one of their teams.
pub struct CreateFolderAction<A, M> {
    resolver: AccessResolver<A, M>,
}

impl<A: AssetRepository, M: MembershipLookup> CreateFolderAction<A, M> {
    pub fn new(assets: A, membership: M) -> Self {
        Self {
            resolver: AccessResolver::new(assets, membership),
        }
    }

    /// # Returns
    ///
    /// - `Ok(folder)` - The new folder, owned by the actor
    /// - `Err(FolioError::InvalidInput(_))` - Blank name
    /// - `Err(FolioError::Forbidden(NotTeamMember))` - Actor is not in the team
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "create_folder", skip_all, err)
    )]
    pub async fn execute(&self, input: CreateFolderInput) -> Result<Folder, FolioError> {
        let name = required("folder name", &input.name)?;

        self.resolver
            .authorize_folder_creation(input.team_id, input.actor_id)
            .await?;

        let folder = self
            .resolver
            .assets()
            .create_folder(CreateFolder {
                name,
                owner_id: input.actor_id,
                team_id: input.team_id,
            })
            .await?;

        log::info!(
            target: "folio",
            "msg=\"folder created\", folder_id={}, team_id={}, user_id={}",
            folder.id,
            folder.team_id,
            folder.owner_id
        );

        Ok(folder)
    }
}

/// Fetches a folder with its notes.
pub struct GetFolderAction<A, M> {
    resolver: AccessResolver<A, M>,
}

impl<A: AssetRepository, M: MembershipLookup> GetFolderAction<A, M> {
    pub fn new(assets: A, membership: M) -> Self {
        Self {
            resolver: AccessResolver::new(assets, membership),
        }
    }

    /// # Returns
    ///
    /// - `Ok(assets)` - The folder and every note in it
    /// - `Err(FolioError::NotFound)` - No such folder
    /// - `Err(FolioError::Forbidden(_))` - No read access
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "get_folder", skip_all, err))]
    pub async fn execute(
        &self,
        folder_id: FolderId,
        actor_id: UserId,
    ) -> Result<FolderAssets, FolioError> {
        let folder = load_folder(self.resolver.assets(), folder_id).await?;
        folder_assets(&self.resolver, folder, actor_id).await
    }
}

/// Renames a folder. Needs write access.
pub struct UpdateFolderAction<A, M> {
    resolver: AccessResolver<A, M>,
}

impl<A: AssetRepository, M: MembershipLookup> UpdateFolderAction<A, M> {
    pub fn new(assets: A, membership: M) -> Self {
        Self {
            resolver: AccessResolver::new(assets, membership),
        }
    }

    /// # Returns
    ///
    /// - `Ok(folder)` - The updated folder
    /// - `Err(FolioError::NotFound)` - No such folder, or it was deleted meanwhile
    /// - `Err(FolioError::Forbidden(InsufficientPermission))` - Read-only share
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "update_folder", skip_all, err)
    )]
    pub async fn execute(
        &self,
        folder_id: FolderId,
        actor_id: UserId,
        changes: UpdateFolder,
    ) -> Result<Folder, FolioError> {
        let changes = UpdateFolder {
            name: changes
                .name
                .map(|name| required("folder name", &name))
                .transpose()?,
        };

        let folder = load_folder(self.resolver.assets(), folder_id).await?;
        self.resolver
            .authorize(Target::Folder(&folder), actor_id, Operation::Write)
            .await?;

        let folder = self.resolver.assets().update_folder(folder_id, changes).await?;

        log::info!(
            target: "folio",
            "msg=\"folder updated\", folder_id={}, user_id={}",
            folder.id,
            actor_id
        );

        Ok(folder)
    }
}

/// Deletes a folder with all of its notes and shares.
pub struct DeleteFolderAction<A, M> {
    resolver: AccessResolver<A, M>,
}

impl<A: AssetRepository, M: MembershipLookup> DeleteFolderAction<A, M> {
    pub fn new(assets: A, membership: M) -> Self {
        Self {
            resolver: AccessResolver::new(assets, membership),
        }
    }

    /// Either everything goes or nothing does.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Folder, notes and shares removed
    /// - `Err(FolioError::NotFound)` - No such folder
    /// - `Err(FolioError::Forbidden(_))` - Actor is neither owner nor team manager
    /// - `Err(FolioError::DatabaseError(_))` - The cascade failed and was rolled back
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "delete_folder", skip_all, err)
    )]
    pub async fn execute(&self, folder_id: FolderId, actor_id: UserId) -> Result<(), FolioError> {
        let folder = load_folder(self.resolver.assets(), folder_id).await?;
        self.resolver
            .authorize(Target::Folder(&folder), actor_id, Operation::Delete)
            .await?;

        if let Err(err) = self.resolver.assets().delete_folder(folder_id).await {
            log::error!(
                target: "folio",
                "msg=\"folder delete failed\", folder_id={}, error=\"{}\"",
                folder_id,
                err
            );
            return Err(err);
        }

        log::info!(
            target: "folio",
            "msg=\"folder deleted\", folder_id={}, user_id={}",
            folder_id,
            actor_id
        );

        Ok(())
    }
}
