use super::Loaded;
use crate::access::{AccessResolver, Operation};
use crate::assets::{AssetRepository, CreateShare, ResourceRef, Share, SharePermission};
use crate::teams::MembershipLookup;
use crate::{FolioError, UserId};

#[derive(Debug, Clone)]
pub struct ShareResourceInput {
    pub resource: ResourceRef,
    pub actor_id: UserId,
    pub grantee_id: UserId,
    pub permission: SharePermission,
}

impl ShareResourceInput {
    /// Builds the input from transport-level strings.
    ///
    /// Unknown kinds, malformed ids and permissions other than `read` and
    /// `write` are `Err(FolioError::InvalidInput)`.
    pub fn parse(
        kind: &str,
        resource_id: &str,
        actor_id: UserId,
        grantee_id: &str,
        permission: &str,
    ) -> Result<Self, FolioError> {
        Ok(Self {
            resource: ResourceRef::parse(kind, resource_id)?,
            actor_id,
            grantee_id: grantee_id.parse()?,
            permission: permission.parse()?,
        })
    }
}

/// Grants a team member read or write access to a folder or note.
///
/// Sharing again with the same user replaces the permission.
pub struct ShareResourceAction<A, M> {
    resolver: AccessResolver<A, M>,
}

impl<A: AssetRepository, M: MembershipLookup> ShareResourceAction<A, M> {
    pub fn new(assets: A, membership: M) -> Self {
        Self {
            resolver: AccessResolver::new(assets, membership),
        }
    }

    /// # Returns
    ///
    /// - `Ok(share)` - The created or replaced share
    /// - `Err(FolioError::NotFound)` - No such resource
    /// - `Err(FolioError::Forbidden(_))` - Actor is neither owner nor team manager
    /// - `Err(FolioError::Forbidden(TargetNotTeamMember))` - Grantee is outside the team
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "share_resource", skip_all, err)
    )]
    pub async fn execute(&self, input: ShareResourceInput) -> Result<Share, FolioError> {
        let loaded = Loaded::fetch(self.resolver.assets(), &input.resource).await?;
        self.resolver
            .authorize_share(loaded.target(), input.actor_id, input.grantee_id)
            .await?;

        let share = self
            .resolver
            .assets()
            .upsert_share(CreateShare {
                resource: input.resource,
                user_id: input.grantee_id,
                permission: input.permission,
            })
            .await?;

        log::info!(
            target: "folio",
            "msg=\"resource shared\", resource={}, grantee_id={}, permission={}, user_id={}",
            share.resource,
            share.user_id,
            share.permission,
            input.actor_id
        );

        Ok(share)
    }
}

#[derive(Debug, Clone)]
pub struct RevokeShareInput {
    pub resource: ResourceRef,
    pub actor_id: UserId,
    pub grantee_id: UserId,
}

/// Removes a user's share on a folder or note.
pub struct RevokeShareAction<A, M> {
    resolver: AccessResolver<A, M>,
}

impl<A: AssetRepository, M: MembershipLookup> RevokeShareAction<A, M> {
    pub fn new(assets: A, membership: M) -> Self {
        Self {
            resolver: AccessResolver::new(assets, membership),
        }
    }

    /// Revoking a share that does not exist succeeds.
    ///
    /// # Returns
    ///
    /// - `Ok(true)` - A share was removed
    /// - `Ok(false)` - There was nothing to remove
    /// - `Err(FolioError::NotFound)` - No such resource
    /// - `Err(FolioError::Forbidden(_))` - Actor is neither owner nor team manager
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "revoke_share", skip_all, err))]
    pub async fn execute(&self, input: RevokeShareInput) -> Result<bool, FolioError> {
        let loaded = Loaded::fetch(self.resolver.assets(), &input.resource).await?;
        self.resolver
            .authorize(loaded.target(), input.actor_id, Operation::Revoke)
            .await?;

        let removed = self
            .resolver
            .assets()
            .delete_share(&input.resource, input.grantee_id)
            .await?;

        log::info!(
            target: "folio",
            "msg=\"share revoked\", resource={}, grantee_id={}, removed={}, user_id={}",
            input.resource,
            input.grantee_id,
            removed,
            input.actor_id
        );

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::World;
    use super::*;
    use crate::DenyReason;
    use crate::assets::{CreateFolder, CreateNote, Folder, Note};

    async fn fixture(world: &World, owner: UserId) -> (Folder, Note) {
        let folder = world
            .assets
            .create_folder(CreateFolder {
                name: "Specs".to_owned(),
                owner_id: owner,
                team_id: world.team,
            })
            .await
            .unwrap();
        let note = world
            .assets
            .create_note(CreateNote {
                title: "Intro".to_owned(),
                content: String::new(),
                owner_id: owner,
                folder_id: folder.id,
                team_id: world.team,
            })
            .await
            .unwrap();
        (folder, note)
    }

    #[test]
    fn test_parse_rejects_unknown_tags() {
        let id = uuid::Uuid::new_v4().to_string();
        let actor = UserId::new();

        assert!(ShareResourceInput::parse("note", &id, actor, &id, "read").is_ok());
        for (kind, permission) in [("page", "read"), ("note", "admin")] {
            assert!(matches!(
                ShareResourceInput::parse(kind, &id, actor, &id, permission),
                Err(FolioError::InvalidInput(_))
            ));
        }
        assert!(ShareResourceInput::parse("folder", "42", actor, &id, "read").is_err());
    }

    #[tokio::test]
    async fn test_owner_shares_with_member_and_reshare_replaces() {
        let world = World::new().await;
        let owner = world.member().await;
        let member = world.member().await;
        let (folder, _) = fixture(&world, owner).await;
        let action = ShareResourceAction::new(world.assets.clone(), world.directory.clone());
        let input = |permission| ShareResourceInput {
            resource: ResourceRef::folder(folder.id),
            actor_id: owner,
            grantee_id: member,
            permission,
        };

        let first = action.execute(input(SharePermission::Read)).await.unwrap();
        let second = action.execute(input(SharePermission::Write)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.permission, SharePermission::Write);
    }

    #[tokio::test]
    async fn test_cannot_share_outside_the_team() {
        let world = World::new().await;
        let owner = world.member().await;
        let (_, note) = fixture(&world, owner).await;

        let err = ShareResourceAction::new(world.assets.clone(), world.directory.clone())
            .execute(ShareResourceInput {
                resource: ResourceRef::note(note.id),
                actor_id: owner,
                grantee_id: UserId::new(),
                permission: SharePermission::Read,
            })
            .await
            .unwrap_err();

        assert_eq!(err, FolioError::Forbidden(DenyReason::TargetNotTeamMember));
    }

    #[tokio::test]
    async fn test_manager_shares_foreign_note() {
        let world = World::new().await;
        let owner = world.member().await;
        let member = world.member().await;
        let (_, note) = fixture(&world, owner).await;

        let share = ShareResourceAction::new(world.assets.clone(), world.directory.clone())
            .execute(ShareResourceInput {
                resource: ResourceRef::note(note.id),
                actor_id: world.manager,
                grantee_id: member,
                permission: SharePermission::Write,
            })
            .await
            .unwrap();

        assert_eq!(share.resource, ResourceRef::note(note.id));
    }

    #[tokio::test]
    async fn test_share_missing_resource_is_not_found() {
        let world = World::new().await;

        let err = ShareResourceAction::new(world.assets.clone(), world.directory.clone())
            .execute(ShareResourceInput {
                resource: ResourceRef::note(crate::NoteId::new()),
                actor_id: world.manager,
                grantee_id: world.manager,
                permission: SharePermission::Read,
            })
            .await
            .unwrap_err();

        assert_eq!(err, FolioError::NotFound);
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent_and_guarded() {
        let world = World::new().await;
        let owner = world.member().await;
        let member = world.member().await;
        let (folder, _) = fixture(&world, owner).await;
        let resource = ResourceRef::folder(folder.id);
        ShareResourceAction::new(world.assets.clone(), world.directory.clone())
            .execute(ShareResourceInput {
                resource,
                actor_id: owner,
                grantee_id: member,
                permission: SharePermission::Write,
            })
            .await
            .unwrap();
        let action = RevokeShareAction::new(world.assets.clone(), world.directory.clone());
        let input = |actor_id| RevokeShareInput {
            resource,
            actor_id,
            grantee_id: member,
        };

        // a write share does not allow revoking
        assert_eq!(
            action.execute(input(member)).await.unwrap_err(),
            FolioError::Forbidden(DenyReason::InsufficientPermission)
        );

        assert!(action.execute(input(owner)).await.unwrap());
        assert!(!action.execute(input(owner)).await.unwrap());
        assert!(world.assets.find_share(&resource, member).await.unwrap().is_none());
    }
}
