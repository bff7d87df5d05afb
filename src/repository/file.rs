//! File repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::file::StoredFile;

/// Data for creating a new file row.
#[derive(Debug, Clone)]
pub struct NewFile<'n> {
    pub name: &'n str,
    pub content_type: &'n str,
    pub size_bytes: i64,
    pub parent_folder_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Repository for file rows.
pub struct FileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, file: &NewFile<'_>) -> sqlx::Result<StoredFile> {
        sqlx::query_as::<_, StoredFile>(
            "INSERT INTO files (name, content_type, size_bytes, parent_folder_id, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id, name, content_type, size_bytes, parent_folder_id, created_at",
        )
        .bind(file.name)
        .bind(file.content_type)
        .bind(file.size_bytes)
        .bind(file.parent_folder_id)
        .bind(file.created_at)
        .fetch_one(self.pool)
        .await
    }

    /// Refresh an existing row after its blob was overwritten.
    pub async fn replace(&self, id: i64, file: &NewFile<'_>) -> sqlx::Result<Option<StoredFile>> {
        sqlx::query_as::<_, StoredFile>(
            "UPDATE files SET content_type = ?, size_bytes = ?, created_at = ?
             WHERE id = ?
             RETURNING id, name, content_type, size_bytes, parent_folder_id, created_at",
        )
        .bind(file.content_type)
        .bind(file.size_bytes)
        .bind(file.created_at)
        .bind(id)
        .fetch_optional(self.pool)
        .await
    }

    pub async fn find(&self, id: i64) -> sqlx::Result<Option<StoredFile>> {
        sqlx::query_as::<_, StoredFile>(
            "SELECT id, name, content_type, size_bytes, parent_folder_id, created_at
             FROM files WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
    }

    /// The file named `name` directly inside `parent_folder_id`, if any.
    pub async fn find_by_name(
        &self,
        parent_folder_id: Option<i64>,
        name: &str,
    ) -> sqlx::Result<Option<StoredFile>> {
        sqlx::query_as::<_, StoredFile>(
            "SELECT id, name, content_type, size_bytes, parent_folder_id, created_at
             FROM files WHERE parent_folder_id IS ? AND name = ?
             ORDER BY id LIMIT 1",
        )
        .bind(parent_folder_id)
        .bind(name)
        .fetch_optional(self.pool)
        .await
    }

    /// Files directly inside `parent_folder_id`, or root-level files when `None`.
    pub async fn list_children(
        &self,
        parent_folder_id: Option<i64>,
    ) -> sqlx::Result<Vec<StoredFile>> {
        sqlx::query_as::<_, StoredFile>(
            "SELECT id, name, content_type, size_bytes, parent_folder_id, created_at
             FROM files WHERE parent_folder_id IS ? ORDER BY id",
        )
        .bind(parent_folder_id)
        .fetch_all(self.pool)
        .await
    }

    pub async fn delete(&self, id: i64) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    fn new_file(name: &str, parent_folder_id: Option<i64>) -> NewFile<'_> {
        NewFile {
            name,
            content_type: "text/plain",
            size_bytes: 5,
            parent_folder_id,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_find_by_name_distinguishes_root_from_folder() {
        let pool = memory_pool().await;
        let folder_id: i64 = sqlx::query_scalar(
            "INSERT INTO folders (name, parent_id, created_at) VALUES ('Docs', NULL, ?) RETURNING id",
        )
        .bind(Utc::now())
        .fetch_one(&*pool)
        .await
        .unwrap();
        let repo = FileRepository::new(&pool);

        let root = repo.insert(&new_file("a.txt", None)).await.unwrap();
        let nested = repo
            .insert(&new_file("a.txt", Some(folder_id)))
            .await
            .unwrap();

        assert_eq!(repo.find_by_name(None, "a.txt").await.unwrap(), Some(root));
        assert_eq!(
            repo.find_by_name(Some(folder_id), "a.txt").await.unwrap(),
            Some(nested)
        );
        assert!(repo.find_by_name(None, "b.txt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_keeps_id_and_updates_size() {
        let pool = memory_pool().await;
        let repo = FileRepository::new(&pool);
        let original = repo.insert(&new_file("a.txt", None)).await.unwrap();

        let mut update = new_file("a.txt", None);
        update.size_bytes = 99;
        let replaced = repo.replace(original.id, &update).await.unwrap().unwrap();

        assert_eq!(replaced.id, original.id);
        assert_eq!(replaced.size_bytes, 99);
        assert!(repo.replace(1234, &update).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let pool = memory_pool().await;
        let repo = FileRepository::new(&pool);
        let a = repo.insert(&new_file("a.txt", None)).await.unwrap();
        let b = repo.insert(&new_file("b.txt", None)).await.unwrap();

        assert_eq!(repo.list_children(None).await.unwrap(), vec![a.clone(), b]);
        assert!(repo.delete(a.id).await.unwrap());
        assert!(repo.find(a.id).await.unwrap().is_none());
        assert_eq!(repo.list_children(None).await.unwrap().len(), 1);
    }
}
