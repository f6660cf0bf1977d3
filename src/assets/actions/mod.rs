mod folder;
mod listing;
mod note;
mod share;

pub use folder::{
    CreateFolderAction, CreateFolderInput, DeleteFolderAction, GetFolderAction,
    UpdateFolderAction,
};
pub use listing::{ListTeamAssetsAction, ListUserAssetsAction, ListUserAssetsInput};
pub use note::{CreateNoteAction, CreateNoteInput, DeleteNoteAction, GetNoteAction, UpdateNoteAction};
pub use share::{RevokeShareAction, RevokeShareInput, ShareResourceAction, ShareResourceInput};

use super::repository::AssetRepository;
use super::types::{Folder, FolderAssets, Note, ResourceKind, ResourceRef};
use crate::access::{AccessResolver, Operation, Target};
use crate::teams::MembershipLookup;
use crate::{FolderId, FolioError, NoteId, UserId};

/// A resource fetched from storage together with what access checks need.
#[derive(Debug)]
enum Loaded {
    Folder(Folder),
    Note(Note, Folder),
}

impl Loaded {
    async fn fetch<A: AssetRepository>(assets: &A, resource: &ResourceRef) -> Result<Self, FolioError> {
        match resource.kind {
            ResourceKind::Folder => {
                Ok(Self::Folder(load_folder(assets, FolderId::from_uuid(resource.id)).await?))
            }
            ResourceKind::Note => {
                let (note, folder) = load_note(assets, NoteId::from_uuid(resource.id)).await?;
                Ok(Self::Note(note, folder))
            }
        }
    }

    fn target(&self) -> Target<'_> {
        match self {
            Self::Folder(folder) => Target::Folder(folder),
            Self::Note(note, folder) => Target::Note { note, folder },
        }
    }
}

async fn load_folder<A: AssetRepository>(assets: &A, id: FolderId) -> Result<Folder, FolioError> {
    assets.find_folder(id).await?.ok_or(FolioError::NotFound)
}

/// A note whose folder vanished concurrently is reported as missing too.
async fn load_note<A: AssetRepository>(assets: &A, id: NoteId) -> Result<(Note, Folder), FolioError> {
    let note = assets.find_note(id).await?.ok_or(FolioError::NotFound)?;
    let folder = load_folder(assets, note.folder_id).await?;
    Ok((note, folder))
}

/// Folder plus all of its notes. Read access to a folder covers every note
/// inside it, whoever wrote them.
async fn folder_assets<A, M>(
    resolver: &AccessResolver<A, M>,
    folder: Folder,
    actor: UserId,
) -> Result<FolderAssets, FolioError>
where
    A: AssetRepository,
    M: MembershipLookup,
{
    resolver
        .authorize(Target::Folder(&folder), actor, Operation::Read)
        .await?;

    let notes = resolver.assets().notes_in_folder(folder.id).await?;
    Ok(FolderAssets { folder, notes })
}

fn required(field: &str, value: &str) -> Result<String, FolioError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FolioError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(value.to_owned())
}
