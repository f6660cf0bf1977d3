use super::{load_folder, load_note, required};
use crate::access::{AccessResolver, Operation, Target};
use crate::assets::{AssetRepository, CreateNote, Note, UpdateNote};
use crate::teams::MembershipLookup;
use crate::{FolderId, FolioError, NoteId, UserId};

#[derive(Debug, Clone)]
pub struct CreateNoteInput {
    pub folder_id: FolderId,
    pub actor_id: UserId,
    pub title: String,
    pub content: String,
}

/// Adds a note to a folder. Needs write access on the folder.
pub struct CreateNoteAction<A, M> {
    resolver: AccessResolver<A, M>,
}

impl<A: AssetRepository, M: MembershipLookup> CreateNoteAction<A, M> {
    pub fn new(assets: A, membership: M) -> Self {
        Self {
            resolver: AccessResolver::new(assets, membership),
        }
    }

    /// The note is owned by the actor and takes the folder's team.
    ///
    /// # Returns
    ///
    /// - `Ok(note)` - The new note
    /// - `Err(FolioError::NotFound)` - No such folder, or it was deleted meanwhile
    /// - `Err(FolioError::Forbidden(_))` - No write access on the folder
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "create_note", skip_all, err))]
    pub async fn execute(&self, input: CreateNoteInput) -> Result<Note, FolioError> {
        let title = required("note title", &input.title)?;

        let folder = load_folder(self.resolver.assets(), input.folder_id).await?;
        self.resolver
            .authorize(Target::Folder(&folder), input.actor_id, Operation::Write)
            .await?;

        let note = self
            .resolver
            .assets()
            .create_note(CreateNote {
                title,
                content: input.content,
                owner_id: input.actor_id,
                folder_id: folder.id,
                team_id: folder.team_id,
            })
            .await?;

        log::info!(
            target: "folio",
            "msg=\"note created\", note_id={}, folder_id={}, user_id={}",
            note.id,
            note.folder_id,
            note.owner_id
        );

        Ok(note)
    }
}

pub struct GetNoteAction<A, M> {
    resolver: AccessResolver<A, M>,
}

impl<A: AssetRepository, M: MembershipLookup> GetNoteAction<A, M> {
    pub fn new(assets: A, membership: M) -> Self {
        Self {
            resolver: AccessResolver::new(assets, membership),
        }
    }

    /// # Returns
    ///
    /// - `Ok(note)` - The note
    /// - `Err(FolioError::NotFound)` - No such note
    /// - `Err(FolioError::Forbidden(NoAccess))` - No read access
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "get_note", skip_all, err))]
    pub async fn execute(&self, note_id: NoteId, actor_id: UserId) -> Result<Note, FolioError> {
        let (note, folder) = load_note(self.resolver.assets(), note_id).await?;
        self.resolver
            .authorize(
                Target::Note {
                    note: &note,
                    folder: &folder,
                },
                actor_id,
                Operation::Read,
            )
            .await?;

        Ok(note)
    }
}

/// Changes a note's title or content. Needs write access.
pub struct UpdateNoteAction<A, M> {
    resolver: AccessResolver<A, M>,
}

impl<A: AssetRepository, M: MembershipLookup> UpdateNoteAction<A, M> {
    pub fn new(assets: A, membership: M) -> Self {
        Self {
            resolver: AccessResolver::new(assets, membership),
        }
    }

    /// # Returns
    ///
    /// - `Ok(note)` - The updated note
    /// - `Err(FolioError::NotFound)` - No such note, or it was deleted meanwhile
    /// - `Err(FolioError::Forbidden(InsufficientPermission))` - Read-only share
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "update_note", skip_all, err))]
    pub async fn execute(
        &self,
        note_id: NoteId,
        actor_id: UserId,
        changes: UpdateNote,
    ) -> Result<Note, FolioError> {
        let changes = UpdateNote {
            title: changes
                .title
                .map(|title| required("note title", &title))
                .transpose()?,
            content: changes.content,
        };

        let (note, folder) = load_note(self.resolver.assets(), note_id).await?;
        self.resolver
            .authorize(
                Target::Note {
                    note: &note,
                    folder: &folder,
                },
                actor_id,
                Operation::Write,
            )
            .await?;

        let note = self.resolver.assets().update_note(note_id, changes).await?;

        log::info!(
            target: "folio",
            "msg=\"note updated\", note_id={}, user_id={}",
            note.id,
            actor_id
        );

        Ok(note)
    }
}

/// Deletes a note and the shares on it.
pub struct DeleteNoteAction<A, M> {
    resolver: AccessResolver<A, M>,
}

impl<A: AssetRepository, M: MembershipLookup> DeleteNoteAction<A, M> {
    pub fn new(assets: A, membership: M) -> Self {
        Self {
            resolver: AccessResolver::new(assets, membership),
        }
    }

    /// Open to the note owner, the folder owner and team managers.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Note removed
    /// - `Err(FolioError::NotFound)` - No such note
    /// - `Err(FolioError::Forbidden(_))` - Shares never grant delete
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "delete_note", skip_all, err))]
    pub async fn execute(&self, note_id: NoteId, actor_id: UserId) -> Result<(), FolioError> {
        let (note, folder) = load_note(self.resolver.assets(), note_id).await?;
        self.resolver
            .authorize(
                Target::Note {
                    note: &note,
                    folder: &folder,
                },
                actor_id,
                Operation::Delete,
            )
            .await?;

        self.resolver.assets().delete_note(note_id).await?;

        log::info!(
            target: "folio",
            "msg=\"note deleted\", note_id={}, folder_id={}, user_id={}",
            note_id,
            folder.id,
            actor_id
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{Directory, World};
    use super::*;
    use crate::DenyReason;
    use crate::assets::{
        CreateFolder, CreateShare, Folder, InMemoryAssetRepository, ResourceRef, SharePermission,
    };

    async fn folder(world: &World, owner: UserId) -> Folder {
        world
            .assets
            .create_folder(CreateFolder {
                name: "Specs".to_owned(),
                owner_id: owner,
                team_id: world.team,
            })
            .await
            .unwrap()
    }

    async fn share(world: &World, resource: ResourceRef, user: UserId, permission: SharePermission) {
        world
            .assets
            .upsert_share(CreateShare {
                resource,
                user_id: user,
                permission,
            })
            .await
            .unwrap();
    }

    fn create_action(world: &World) -> CreateNoteAction<InMemoryAssetRepository, Directory> {
        CreateNoteAction::new(world.assets.clone(), world.directory.clone())
    }

    fn input(folder: &Folder, actor: UserId, title: &str) -> CreateNoteInput {
        CreateNoteInput {
            folder_id: folder.id,
            actor_id: actor,
            title: title.to_owned(),
            content: "draft".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_note_inherits_folder_team() {
        let world = World::new().await;
        let owner = world.member().await;
        let f = folder(&world, owner).await;

        let note = create_action(&world).execute(input(&f, owner, "Intro")).await.unwrap();

        assert_eq!(note.team_id, world.team);
        assert_eq!(note.folder_id, f.id);
        assert_eq!(note.owner_id, owner);
    }

    #[tokio::test]
    async fn test_write_share_holder_creates_notes_they_own() {
        let world = World::new().await;
        let owner = world.member().await;
        let writer = world.member().await;
        let f = folder(&world, owner).await;
        share(&world, ResourceRef::folder(f.id), writer, SharePermission::Write).await;

        let note = create_action(&world).execute(input(&f, writer, "Intro")).await.unwrap();
        assert_eq!(note.owner_id, writer);
    }

    #[tokio::test]
    async fn test_read_share_cannot_create_notes() {
        let world = World::new().await;
        let owner = world.member().await;
        let reader = world.member().await;
        let f = folder(&world, owner).await;
        share(&world, ResourceRef::folder(f.id), reader, SharePermission::Read).await;

        let err = create_action(&world)
            .execute(input(&f, reader, "Intro"))
            .await
            .unwrap_err();
        assert_eq!(err, FolioError::Forbidden(DenyReason::InsufficientPermission));
    }

    #[tokio::test]
    async fn test_note_in_deleted_folder_is_not_found() {
        let world = World::new().await;
        let owner = world.member().await;
        let f = folder(&world, owner).await;
        world.assets.delete_folder(f.id).await.unwrap();

        let err = create_action(&world)
            .execute(input(&f, owner, "Intro"))
            .await
            .unwrap_err();
        assert_eq!(err, FolioError::NotFound);
    }

    #[tokio::test]
    async fn test_get_and_update_through_inherited_share() {
        let world = World::new().await;
        let owner = world.member().await;
        let writer = world.member().await;
        let f = folder(&world, owner).await;
        let note = create_action(&world).execute(input(&f, owner, "Intro")).await.unwrap();
        share(&world, ResourceRef::folder(f.id), writer, SharePermission::Write).await;

        let fetched = GetNoteAction::new(world.assets.clone(), world.directory.clone())
            .execute(note.id, writer)
            .await
            .unwrap();
        assert_eq!(fetched, note);

        let updated = UpdateNoteAction::new(world.assets.clone(), world.directory.clone())
            .execute(
                note.id,
                writer,
                UpdateNote {
                    title: None,
                    content: Some("final".to_owned()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Intro");
        assert_eq!(updated.content, "final");
    }

    #[tokio::test]
    async fn test_delete_rules() {
        let world = World::new().await;
        let folder_owner = world.member().await;
        let author = world.member().await;
        let writer = world.member().await;
        let f = folder(&world, folder_owner).await;
        share(&world, ResourceRef::folder(f.id), author, SharePermission::Write).await;
        share(&world, ResourceRef::folder(f.id), writer, SharePermission::Write).await;
        let note = create_action(&world).execute(input(&f, author, "Intro")).await.unwrap();
        let action = DeleteNoteAction::new(world.assets.clone(), world.directory.clone());

        assert_eq!(
            action.execute(note.id, writer).await.unwrap_err(),
            FolioError::Forbidden(DenyReason::InsufficientPermission)
        );

        action.execute(note.id, folder_owner).await.unwrap();
        assert!(world.assets.find_note(note.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_deleted_note_shares_are_gone() {
        let world = World::new().await;
        let owner = world.member().await;
        let reader = world.member().await;
        let f = folder(&world, owner).await;
        let note = create_action(&world).execute(input(&f, owner, "Intro")).await.unwrap();
        share(&world, ResourceRef::note(note.id), reader, SharePermission::Read).await;

        DeleteNoteAction::new(world.assets.clone(), world.directory.clone())
            .execute(note.id, owner)
            .await
            .unwrap();

        assert!(
            world
                .assets
                .find_share(&ResourceRef::note(note.id), reader)
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(
            GetNoteAction::new(world.assets.clone(), world.directory.clone())
                .execute(note.id, owner)
                .await
                .unwrap_err(),
            FolioError::NotFound
        );
    }
}
