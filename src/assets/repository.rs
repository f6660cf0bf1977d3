use async_trait::async_trait;

use super::types::{Folder, Note, ResourceRef, Share, SharePermission};
use crate::{FolderId, FolioError, NoteId, TeamId, UserId};

#[derive(Debug, Clone)]
pub struct CreateFolder {
    pub name: String,
    pub owner_id: UserId,
    pub team_id: TeamId,
}

/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateFolder {
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateNote {
    pub title: String,
    pub content: String,
    pub owner_id: UserId,
    pub folder_id: FolderId,
    pub team_id: TeamId,
}

/// `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateNote {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateShare {
    pub resource: ResourceRef,
    pub user_id: UserId,
    pub permission: SharePermission,
}

/// Storage for folders, notes and shares.
///
/// Mutations on a missing row return `Err(FolioError::NotFound)`, including
/// rows deleted concurrently.
#[async_trait]
pub trait AssetRepository: Send + Sync {
    async fn create_folder(&self, data: CreateFolder) -> Result<Folder, FolioError>;
    async fn find_folder(&self, id: FolderId) -> Result<Option<Folder>, FolioError>;
    async fn update_folder(&self, id: FolderId, data: UpdateFolder) -> Result<Folder, FolioError>;

    /// Deletes the folder, all of its notes, and shares on any of them as a
    /// single all-or-nothing unit.
    async fn delete_folder(&self, id: FolderId) -> Result<(), FolioError>;

    /// `Err(FolioError::NotFound)` when the folder no longer exists.
    async fn create_note(&self, data: CreateNote) -> Result<Note, FolioError>;
    async fn find_note(&self, id: NoteId) -> Result<Option<Note>, FolioError>;
    async fn update_note(&self, id: NoteId, data: UpdateNote) -> Result<Note, FolioError>;
    /// Deletes the note and shares on it.
    async fn delete_note(&self, id: NoteId) -> Result<(), FolioError>;
    async fn notes_in_folder(&self, folder_id: FolderId) -> Result<Vec<Note>, FolioError>;

    /// Creates the share, or replaces the permission of the existing share
    /// for the same (resource, user).
    async fn upsert_share(&self, data: CreateShare) -> Result<Share, FolioError>;
    async fn find_share(
        &self,
        resource: &ResourceRef,
        user_id: UserId,
    ) -> Result<Option<Share>, FolioError>;
    /// Returns whether a share was removed.
    async fn delete_share(&self, resource: &ResourceRef, user_id: UserId)
    -> Result<bool, FolioError>;

    async fn folders_by_team(&self, team_id: TeamId) -> Result<Vec<Folder>, FolioError>;
    async fn folders_by_owner(&self, owner_id: UserId) -> Result<Vec<Folder>, FolioError>;
}
