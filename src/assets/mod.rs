//! Folders, notes and shares.
//!
//! Every action resolves the primary resource first (missing rows are
//! [`FolioError::NotFound`](crate::FolioError::NotFound)), asks the
//! [`AccessResolver`](crate::AccessResolver) for a decision, and only then
//! touches storage.

mod actions;
mod memory;
mod repository;
mod types;

pub use actions::{
    CreateFolderAction, CreateFolderInput, CreateNoteAction, CreateNoteInput, DeleteFolderAction,
    DeleteNoteAction, GetFolderAction, GetNoteAction, ListTeamAssetsAction, ListUserAssetsAction,
    ListUserAssetsInput, RevokeShareAction, RevokeShareInput, ShareResourceAction,
    ShareResourceInput, UpdateFolderAction, UpdateNoteAction,
};
pub use memory::InMemoryAssetRepository;
pub use repository::{
    AssetRepository, CreateFolder, CreateNote, CreateShare, UpdateFolder, UpdateNote,
};
pub use types::{Folder, FolderAssets, Note, ResourceKind, ResourceRef, Share, SharePermission};
