use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use super::{column, db_err};
use crate::assets::{
    AssetRepository, CreateFolder, CreateNote, CreateShare, Folder, Note, ResourceRef, Share,
    UpdateFolder, UpdateNote,
};
use crate::{FolderId, FolioError, NoteId, ShareId, TeamId, UserId};

const FOLDER_COLUMNS: &str = "id, name, owner_id, team_id, created_at, updated_at";
const NOTE_COLUMNS: &str =
    "id, title, content, owner_id, folder_id, team_id, created_at, updated_at";
const SHARE_COLUMNS: &str =
    "id, resource_kind, resource_id, user_id, permission, created_at, updated_at";

/// `SQLite`-backed folders, notes and shares.
///
/// Folder and note deletes run in a transaction together with the shares
/// they take down.
#[derive(Debug, Clone)]
pub struct SqliteAssetRepository {
    pool: SqlitePool,
}

impl SqliteAssetRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct FolderRecord {
    id: String,
    name: String,
    owner_id: String,
    team_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<FolderRecord> for Folder {
    type Error = FolioError;

    fn try_from(row: FolderRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: column("folders.id", &row.id)?,
            name: row.name,
            owner_id: column("folders.owner_id", &row.owner_id)?,
            team_id: column("folders.team_id", &row.team_id)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct NoteRecord {
    id: String,
    title: String,
    content: String,
    owner_id: String,
    folder_id: String,
    team_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<NoteRecord> for Note {
    type Error = FolioError;

    fn try_from(row: NoteRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: column("notes.id", &row.id)?,
            title: row.title,
            content: row.content,
            owner_id: column("notes.owner_id", &row.owner_id)?,
            folder_id: column("notes.folder_id", &row.folder_id)?,
            team_id: column("notes.team_id", &row.team_id)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ShareRecord {
    id: String,
    resource_kind: String,
    resource_id: String,
    user_id: String,
    permission: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ShareRecord> for Share {
    type Error = FolioError;

    fn try_from(row: ShareRecord) -> Result<Self, Self::Error> {
        let resource = ResourceRef::parse(&row.resource_kind, &row.resource_id).map_err(|_| {
            FolioError::Internal(format!(
                "corrupt shares resource: {}:{}",
                row.resource_kind, row.resource_id
            ))
        })?;

        Ok(Self {
            id: column::<ShareId>("shares.id", &row.id)?,
            resource,
            user_id: column("shares.user_id", &row.user_id)?,
            permission: column("shares.permission", &row.permission)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn collect<R, T>(rows: Vec<R>) -> Result<Vec<T>, FolioError>
where
    T: TryFrom<R, Error = FolioError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[async_trait]
impl AssetRepository for SqliteAssetRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create_folder(&self, data: CreateFolder) -> Result<Folder, FolioError> {
        let now = Utc::now();
        let row: FolderRecord = sqlx::query_as(&format!(
            "INSERT INTO folders ({FOLDER_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?) RETURNING {FOLDER_COLUMNS}"
        ))
        .bind(FolderId::new().to_string())
        .bind(&data.name)
        .bind(data.owner_id.to_string())
        .bind(data.team_id.to_string())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("create_folder", &e))?;

        row.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_folder(&self, id: FolderId) -> Result<Option<Folder>, FolioError> {
        let row: Option<FolderRecord> =
            sqlx::query_as(&format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_err("find_folder", &e))?;

        row.map(TryInto::try_into).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn update_folder(&self, id: FolderId, data: UpdateFolder) -> Result<Folder, FolioError> {
        let row: Option<FolderRecord> = sqlx::query_as(&format!(
            "UPDATE folders SET name = COALESCE(?, name), updated_at = ? WHERE id = ? RETURNING {FOLDER_COLUMNS}"
        ))
        .bind(data.name)
        .bind(Utc::now())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("update_folder", &e))?;

        row.ok_or(FolioError::NotFound)?.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete_folder(&self, id: FolderId) -> Result<(), FolioError> {
        let id = id.to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("delete_folder", &e))?;

        sqlx::query(
            "DELETE FROM shares WHERE resource_kind = 'note' AND resource_id IN (SELECT id FROM notes WHERE folder_id = ?)",
        )
        .bind(&id)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_err("delete_folder_note_shares", &e))?;

        sqlx::query("DELETE FROM notes WHERE folder_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("delete_folder_notes", &e))?;

        sqlx::query("DELETE FROM shares WHERE resource_kind = 'folder' AND resource_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("delete_folder_shares", &e))?;

        let deleted = sqlx::query("DELETE FROM folders WHERE id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("delete_folder", &e))?;

        // dropping the transaction rolls it back
        if deleted.rows_affected() == 0 {
            return Err(FolioError::NotFound);
        }

        tx.commit().await.map_err(|e| db_err("delete_folder", &e))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn create_note(&self, data: CreateNote) -> Result<Note, FolioError> {
        let now = Utc::now();
        let row: Option<NoteRecord> = sqlx::query_as(&format!(
            r"
            INSERT INTO notes ({NOTE_COLUMNS})
            SELECT ?, ?, ?, ?, ?, ?, ?, ?
            WHERE EXISTS (SELECT 1 FROM folders WHERE id = ?)
            RETURNING {NOTE_COLUMNS}
            "
        ))
        .bind(NoteId::new().to_string())
        .bind(&data.title)
        .bind(&data.content)
        .bind(data.owner_id.to_string())
        .bind(data.folder_id.to_string())
        .bind(data.team_id.to_string())
        .bind(now)
        .bind(now)
        .bind(data.folder_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("create_note", &e))?;

        row.ok_or(FolioError::NotFound)?.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_note(&self, id: NoteId) -> Result<Option<Note>, FolioError> {
        let row: Option<NoteRecord> =
            sqlx::query_as(&format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_err("find_note", &e))?;

        row.map(TryInto::try_into).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn update_note(&self, id: NoteId, data: UpdateNote) -> Result<Note, FolioError> {
        let row: Option<NoteRecord> = sqlx::query_as(&format!(
            r"
            UPDATE notes
            SET title = COALESCE(?, title), content = COALESCE(?, content), updated_at = ?
            WHERE id = ?
            RETURNING {NOTE_COLUMNS}
            "
        ))
        .bind(data.title)
        .bind(data.content)
        .bind(Utc::now())
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("update_note", &e))?;

        row.ok_or(FolioError::NotFound)?.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete_note(&self, id: NoteId) -> Result<(), FolioError> {
        let id = id.to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_err("delete_note", &e))?;

        sqlx::query("DELETE FROM shares WHERE resource_kind = 'note' AND resource_id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("delete_note_shares", &e))?;

        let deleted = sqlx::query("DELETE FROM notes WHERE id = ?")
            .bind(&id)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_err("delete_note", &e))?;

        if deleted.rows_affected() == 0 {
            return Err(FolioError::NotFound);
        }

        tx.commit().await.map_err(|e| db_err("delete_note", &e))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn notes_in_folder(&self, folder_id: FolderId) -> Result<Vec<Note>, FolioError> {
        let rows: Vec<NoteRecord> = sqlx::query_as(&format!(
            "SELECT {NOTE_COLUMNS} FROM notes WHERE folder_id = ? ORDER BY created_at ASC"
        ))
        .bind(folder_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("notes_in_folder", &e))?;

        collect(rows)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn upsert_share(&self, data: CreateShare) -> Result<Share, FolioError> {
        let now = Utc::now();
        let row: ShareRecord = sqlx::query_as(&format!(
            r"
            INSERT INTO shares ({SHARE_COLUMNS})
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (resource_kind, resource_id, user_id)
            DO UPDATE SET permission = excluded.permission, updated_at = excluded.updated_at
            RETURNING {SHARE_COLUMNS}
            "
        ))
        .bind(ShareId::new().to_string())
        .bind(data.resource.kind.as_str())
        .bind(data.resource.id.to_string())
        .bind(data.user_id.to_string())
        .bind(data.permission.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("upsert_share", &e))?;

        row.try_into()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_share(
        &self,
        resource: &ResourceRef,
        user_id: UserId,
    ) -> Result<Option<Share>, FolioError> {
        let row: Option<ShareRecord> = sqlx::query_as(&format!(
            "SELECT {SHARE_COLUMNS} FROM shares WHERE resource_kind = ? AND resource_id = ? AND user_id = ?"
        ))
        .bind(resource.kind.as_str())
        .bind(resource.id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_err("find_share", &e))?;

        row.map(TryInto::try_into).transpose()
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn delete_share(
        &self,
        resource: &ResourceRef,
        user_id: UserId,
    ) -> Result<bool, FolioError> {
        let result = sqlx::query(
            "DELETE FROM shares WHERE resource_kind = ? AND resource_id = ? AND user_id = ?",
        )
        .bind(resource.kind.as_str())
        .bind(resource.id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("delete_share", &e))?;

        Ok(result.rows_affected() > 0)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn folders_by_team(&self, team_id: TeamId) -> Result<Vec<Folder>, FolioError> {
        let rows: Vec<FolderRecord> = sqlx::query_as(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE team_id = ? ORDER BY created_at ASC, name ASC"
        ))
        .bind(team_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("folders_by_team", &e))?;

        collect(rows)
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn folders_by_owner(&self, owner_id: UserId) -> Result<Vec<Folder>, FolioError> {
        let rows: Vec<FolderRecord> = sqlx::query_as(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE owner_id = ? ORDER BY created_at ASC, name ASC"
        ))
        .bind(owner_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("folders_by_owner", &e))?;

        collect(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ResourceKind;

    #[test]
    fn test_share_record_rejects_unknown_kind() {
        let row = ShareRecord {
            id: ShareId::new().to_string(),
            resource_kind: "page".to_owned(),
            resource_id: FolderId::new().to_string(),
            user_id: UserId::new().to_string(),
            permission: "read".to_owned(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(matches!(Share::try_from(row), Err(FolioError::Internal(_))));
    }

    #[test]
    fn test_folder_record_roundtrip() {
        let owner = UserId::new();
        let row = FolderRecord {
            id: FolderId::new().to_string(),
            name: "Specs".to_owned(),
            owner_id: owner.to_string(),
            team_id: TeamId::new().to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let folder = Folder::try_from(row).unwrap();
        assert_eq!(folder.owner_id, owner);
        assert_eq!(ResourceRef::folder(folder.id).kind, ResourceKind::Folder);
    }
}
