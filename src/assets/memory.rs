#![allow(clippy::significant_drop_tightening)]

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use super::repository::{
    AssetRepository, CreateFolder, CreateNote, CreateShare, UpdateFolder, UpdateNote,
};
use super::types::{Folder, Note, ResourceRef, Share};
use crate::{FolderId, FolioError, NoteId, ShareId, TeamId, UserId};

#[derive(Debug, Clone, Default)]
struct AssetState {
    folders: HashMap<FolderId, Folder>,
    notes: HashMap<NoteId, Note>,
    shares: HashMap<(ResourceRef, UserId), Share>,
}

impl AssetState {
    fn drop_shares_on(&mut self, resource: &ResourceRef) {
        self.shares.retain(|(r, _), _| r != resource);
    }
}

/// In-memory asset storage.
///
/// All rows live behind one lock, so a folder cascade is applied to a staged
/// copy and swapped in only when every step succeeded. Clones share the
/// same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAssetRepository {
    state: Arc<RwLock<AssetState>>,
    #[cfg(test)]
    cascade_fault: Arc<std::sync::Mutex<Option<usize>>>,
}

impl InMemoryAssetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next folder cascade fail after deleting `n` notes.
    #[cfg(test)]
    pub(crate) fn fail_cascade_after(&self, n: usize) {
        if let Ok(mut fault) = self.cascade_fault.lock() {
            *fault = Some(n);
        }
    }

    #[cfg(test)]
    fn check_cascade_fault(&self, deleted: usize) -> Result<(), FolioError> {
        let mut fault = self.cascade_fault.lock().map_err(|_| lock_err())?;
        if *fault == Some(deleted) {
            *fault = None;
            return Err(FolioError::DatabaseError("injected cascade failure".into()));
        }
        Ok(())
    }

    #[cfg(not(test))]
    #[allow(clippy::unused_self)]
    fn check_cascade_fault(&self, _deleted: usize) -> Result<(), FolioError> {
        Ok(())
    }
}

fn lock_err() -> FolioError {
    FolioError::Internal("lock poisoned".into())
}

fn sorted_folders(mut folders: Vec<Folder>) -> Vec<Folder> {
    folders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
    folders
}

#[async_trait]
impl AssetRepository for InMemoryAssetRepository {
    async fn create_folder(&self, data: CreateFolder) -> Result<Folder, FolioError> {
        let now = Utc::now();
        let folder = Folder {
            id: FolderId::new(),
            name: data.name,
            owner_id: data.owner_id,
            team_id: data.team_id,
            created_at: now,
            updated_at: now,
        };

        let mut state = self.state.write().map_err(|_| lock_err())?;
        state.folders.insert(folder.id, folder.clone());

        Ok(folder)
    }

    async fn find_folder(&self, id: FolderId) -> Result<Option<Folder>, FolioError> {
        let state = self.state.read().map_err(|_| lock_err())?;
        Ok(state.folders.get(&id).cloned())
    }

    async fn update_folder(&self, id: FolderId, data: UpdateFolder) -> Result<Folder, FolioError> {
        let mut state = self.state.write().map_err(|_| lock_err())?;
        let folder = state.folders.get_mut(&id).ok_or(FolioError::NotFound)?;

        if let Some(name) = data.name {
            folder.name = name;
        }
        folder.updated_at = Utc::now();

        Ok(folder.clone())
    }

    async fn delete_folder(&self, id: FolderId) -> Result<(), FolioError> {
        let mut state = self.state.write().map_err(|_| lock_err())?;
        if !state.folders.contains_key(&id) {
            return Err(FolioError::NotFound);
        }

        let mut staged = state.clone();
        let note_ids: Vec<NoteId> = staged
            .notes
            .values()
            .filter(|n| n.folder_id == id)
            .map(|n| n.id)
            .collect();

        for (deleted, note_id) in note_ids.iter().enumerate() {
            self.check_cascade_fault(deleted)?;
            staged.notes.remove(note_id);
            staged.drop_shares_on(&ResourceRef::note(*note_id));
        }
        staged.drop_shares_on(&ResourceRef::folder(id));
        staged.folders.remove(&id);

        *state = staged;
        Ok(())
    }

    async fn create_note(&self, data: CreateNote) -> Result<Note, FolioError> {
        let mut state = self.state.write().map_err(|_| lock_err())?;
        if !state.folders.contains_key(&data.folder_id) {
            return Err(FolioError::NotFound);
        }

        let now = Utc::now();
        let note = Note {
            id: NoteId::new(),
            title: data.title,
            content: data.content,
            owner_id: data.owner_id,
            folder_id: data.folder_id,
            team_id: data.team_id,
            created_at: now,
            updated_at: now,
        };
        state.notes.insert(note.id, note.clone());

        Ok(note)
    }

    async fn find_note(&self, id: NoteId) -> Result<Option<Note>, FolioError> {
        let state = self.state.read().map_err(|_| lock_err())?;
        Ok(state.notes.get(&id).cloned())
    }

    async fn update_note(&self, id: NoteId, data: UpdateNote) -> Result<Note, FolioError> {
        let mut state = self.state.write().map_err(|_| lock_err())?;
        let note = state.notes.get_mut(&id).ok_or(FolioError::NotFound)?;

        if let Some(title) = data.title {
            note.title = title;
        }
        if let Some(content) = data.content {
            note.content = content;
        }
        note.updated_at = Utc::now();

        Ok(note.clone())
    }

    async fn delete_note(&self, id: NoteId) -> Result<(), FolioError> {
        let mut state = self.state.write().map_err(|_| lock_err())?;
        state.notes.remove(&id).ok_or(FolioError::NotFound)?;
        state.drop_shares_on(&ResourceRef::note(id));
        Ok(())
    }

    async fn notes_in_folder(&self, folder_id: FolderId) -> Result<Vec<Note>, FolioError> {
        let state = self.state.read().map_err(|_| lock_err())?;
        let mut notes: Vec<Note> = state
            .notes
            .values()
            .filter(|n| n.folder_id == folder_id)
            .cloned()
            .collect();
        notes.sort_by_key(|n| n.created_at);
        Ok(notes)
    }

    async fn upsert_share(&self, data: CreateShare) -> Result<Share, FolioError> {
        let now = Utc::now();
        let mut state = self.state.write().map_err(|_| lock_err())?;

        let share = state
            .shares
            .entry((data.resource, data.user_id))
            .and_modify(|share| {
                share.permission = data.permission;
                share.updated_at = now;
            })
            .or_insert_with(|| Share {
                id: ShareId::new(),
                resource: data.resource,
                user_id: data.user_id,
                permission: data.permission,
                created_at: now,
                updated_at: now,
            });

        Ok(share.clone())
    }

    async fn find_share(
        &self,
        resource: &ResourceRef,
        user_id: UserId,
    ) -> Result<Option<Share>, FolioError> {
        let state = self.state.read().map_err(|_| lock_err())?;
        Ok(state.shares.get(&(*resource, user_id)).cloned())
    }

    async fn delete_share(
        &self,
        resource: &ResourceRef,
        user_id: UserId,
    ) -> Result<bool, FolioError> {
        let mut state = self.state.write().map_err(|_| lock_err())?;
        Ok(state.shares.remove(&(*resource, user_id)).is_some())
    }

    async fn folders_by_team(&self, team_id: TeamId) -> Result<Vec<Folder>, FolioError> {
        let state = self.state.read().map_err(|_| lock_err())?;
        Ok(sorted_folders(
            state
                .folders
                .values()
                .filter(|f| f.team_id == team_id)
                .cloned()
                .collect(),
        ))
    }

    async fn folders_by_owner(&self, owner_id: UserId) -> Result<Vec<Folder>, FolioError> {
        let state = self.state.read().map_err(|_| lock_err())?;
        Ok(sorted_folders(
            state
                .folders
                .values()
                .filter(|f| f.owner_id == owner_id)
                .cloned()
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::SharePermission;

    async fn folder(repo: &InMemoryAssetRepository, owner: UserId, team: TeamId) -> Folder {
        repo.create_folder(CreateFolder {
            name: "Specs".to_owned(),
            owner_id: owner,
            team_id: team,
        })
        .await
        .unwrap()
    }

    async fn note(repo: &InMemoryAssetRepository, folder: &Folder, title: &str) -> Note {
        repo.create_note(CreateNote {
            title: title.to_owned(),
            content: String::new(),
            owner_id: folder.owner_id,
            folder_id: folder.id,
            team_id: folder.team_id,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_update_folder_keeps_unset_fields() {
        let repo = InMemoryAssetRepository::new();
        let f = folder(&repo, UserId::new(), TeamId::new()).await;

        let unchanged = repo.update_folder(f.id, UpdateFolder::default()).await.unwrap();
        assert_eq!(unchanged.name, "Specs");

        let renamed = repo
            .update_folder(
                f.id,
                UpdateFolder {
                    name: Some("RFCs".to_owned()),
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "RFCs");
        assert!(renamed.updated_at >= f.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_rows_is_not_found() {
        let repo = InMemoryAssetRepository::new();

        assert_eq!(
            repo.update_folder(FolderId::new(), UpdateFolder::default())
                .await
                .unwrap_err(),
            FolioError::NotFound
        );
        assert_eq!(
            repo.update_note(NoteId::new(), UpdateNote::default())
                .await
                .unwrap_err(),
            FolioError::NotFound
        );
    }

    #[tokio::test]
    async fn test_create_note_in_missing_folder_is_not_found() {
        let repo = InMemoryAssetRepository::new();
        let err = repo
            .create_note(CreateNote {
                title: "orphan".to_owned(),
                content: String::new(),
                owner_id: UserId::new(),
                folder_id: FolderId::new(),
                team_id: TeamId::new(),
            })
            .await
            .unwrap_err();

        assert_eq!(err, FolioError::NotFound);
    }

    #[tokio::test]
    async fn test_upsert_share_replaces_permission() {
        let repo = InMemoryAssetRepository::new();
        let resource = ResourceRef::folder(FolderId::new());
        let user = UserId::new();

        let first = repo
            .upsert_share(CreateShare {
                resource,
                user_id: user,
                permission: SharePermission::Read,
            })
            .await
            .unwrap();
        let second = repo
            .upsert_share(CreateShare {
                resource,
                user_id: user,
                permission: SharePermission::Write,
            })
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(
            repo.find_share(&resource, user).await.unwrap().unwrap().permission,
            SharePermission::Write
        );
    }

    #[tokio::test]
    async fn test_delete_share_reports_removal() {
        let repo = InMemoryAssetRepository::new();
        let resource = ResourceRef::note(NoteId::new());
        let user = UserId::new();
        repo.upsert_share(CreateShare {
            resource,
            user_id: user,
            permission: SharePermission::Read,
        })
        .await
        .unwrap();

        assert!(repo.delete_share(&resource, user).await.unwrap());
        assert!(!repo.delete_share(&resource, user).await.unwrap());
        assert!(repo.find_share(&resource, user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_folder_cascades() {
        let repo = InMemoryAssetRepository::new();
        let f = folder(&repo, UserId::new(), TeamId::new()).await;
        let n1 = note(&repo, &f, "one").await;
        let n2 = note(&repo, &f, "two").await;
        let other = folder(&repo, f.owner_id, f.team_id).await;
        let kept = note(&repo, &other, "kept").await;
        let reader = UserId::new();
        for resource in [ResourceRef::folder(f.id), ResourceRef::note(n1.id)] {
            repo.upsert_share(CreateShare {
                resource,
                user_id: reader,
                permission: SharePermission::Read,
            })
            .await
            .unwrap();
        }

        repo.delete_folder(f.id).await.unwrap();

        assert!(repo.find_folder(f.id).await.unwrap().is_none());
        assert!(repo.find_note(n1.id).await.unwrap().is_none());
        assert!(repo.find_note(n2.id).await.unwrap().is_none());
        assert!(repo.find_note(kept.id).await.unwrap().is_some());
        assert!(
            repo.find_share(&ResourceRef::folder(f.id), reader)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            repo.find_share(&ResourceRef::note(n1.id), reader)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_failed_cascade_leaves_everything_in_place() {
        let repo = InMemoryAssetRepository::new();
        let f = folder(&repo, UserId::new(), TeamId::new()).await;
        let notes = [
            note(&repo, &f, "one").await,
            note(&repo, &f, "two").await,
            note(&repo, &f, "three").await,
        ];

        repo.fail_cascade_after(2);
        let err = repo.delete_folder(f.id).await.unwrap_err();

        assert!(matches!(err, FolioError::DatabaseError(_)));
        assert_eq!(repo.find_folder(f.id).await.unwrap(), Some(f.clone()));
        for n in &notes {
            assert_eq!(repo.find_note(n.id).await.unwrap().as_ref(), Some(n));
        }

        // the fault is one-shot
        repo.delete_folder(f.id).await.unwrap();
        assert!(repo.notes_in_folder(f.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_folder_is_not_found() {
        let repo = InMemoryAssetRepository::new();
        assert_eq!(
            repo.delete_folder(FolderId::new()).await.unwrap_err(),
            FolioError::NotFound
        );
    }

    #[tokio::test]
    async fn test_listing_by_team_and_owner() {
        let repo = InMemoryAssetRepository::new();
        let (alice, bob) = (UserId::new(), UserId::new());
        let (eng, ops) = (TeamId::new(), TeamId::new());
        folder(&repo, alice, eng).await;
        folder(&repo, bob, eng).await;
        folder(&repo, alice, ops).await;

        assert_eq!(repo.folders_by_team(eng).await.unwrap().len(), 2);
        assert_eq!(repo.folders_by_owner(alice).await.unwrap().len(), 2);
        assert!(repo.folders_by_team(TeamId::new()).await.unwrap().is_empty());
    }
}
