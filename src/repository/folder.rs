//! Folder repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::folder::Folder;

/// Repository for folder rows.
pub struct FolderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FolderRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a folder and return the stored row.
    pub async fn insert(
        &self,
        name: &str,
        parent_id: Option<i64>,
        created_at: DateTime<Utc>,
    ) -> sqlx::Result<Folder> {
        sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (name, parent_id, created_at)
             VALUES (?, ?, ?)
             RETURNING id, name, parent_id, created_at",
        )
        .bind(name)
        .bind(parent_id)
        .bind(created_at)
        .fetch_one(self.pool)
        .await
    }

    pub async fn find(&self, id: i64) -> sqlx::Result<Option<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT id, name, parent_id, created_at FROM folders WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
    }

    /// Direct children of `parent_id`, or root-level folders when `None`.
    pub async fn list_children(&self, parent_id: Option<i64>) -> sqlx::Result<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT id, name, parent_id, created_at
             FROM folders WHERE parent_id IS ? ORDER BY id",
        )
        .bind(parent_id)
        .fetch_all(self.pool)
        .await
    }

    /// Number of files and subfolders directly inside a folder.
    pub async fn count_children(&self, id: i64) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT (SELECT COUNT(*) FROM folders WHERE parent_id = ?)
                  + (SELECT COUNT(*) FROM files WHERE parent_folder_id = ?)",
        )
        .bind(id)
        .bind(id)
        .fetch_one(self.pool)
        .await
    }

    /// Ids of folders named `name` directly under `parent_id`, ascending.
    pub async fn ids_by_name(&self, parent_id: Option<i64>, name: &str) -> sqlx::Result<Vec<i64>> {
        sqlx::query_scalar::<_, i64>(
            "SELECT id FROM folders WHERE parent_id IS ? AND name = ? ORDER BY id",
        )
        .bind(parent_id)
        .bind(name)
        .fetch_all(self.pool)
        .await
    }

    /// Delete a folder row. Returns false if no row matched.
    pub async fn delete(&self, id: i64) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM folders WHERE id = ?")
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

    #[tokio::test]
    async fn test_insert_and_find() {
        let pool = memory_pool().await;
        let repo = FolderRepository::new(&pool);

        let created = repo.insert("Math", None, Utc::now()).await.unwrap();
        assert_eq!(created.id, 1);

        let found = repo.find(created.id).await.unwrap().unwrap();
        assert_eq!(found, created);
        assert!(repo.find(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_children_separates_root_and_nested() {
        let pool = memory_pool().await;
        let repo = FolderRepository::new(&pool);

        let math = repo.insert("Math", None, Utc::now()).await.unwrap();
        repo.insert("Physics", None, Utc::now()).await.unwrap();
        let algebra = repo
            .insert("Algebra", Some(math.id), Utc::now())
            .await
            .unwrap();

        let roots = repo.list_children(None).await.unwrap();
        assert_eq!(
            roots.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
            vec!["Math", "Physics"]
        );

        let nested = repo.list_children(Some(math.id)).await.unwrap();
        assert_eq!(nested, vec![algebra]);
        assert!(repo.list_children(Some(42)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_count_children_includes_files() {
        let pool = memory_pool().await;
        let repo = FolderRepository::new(&pool);
        let math = repo.insert("Math", None, Utc::now()).await.unwrap();
        assert_eq!(repo.count_children(math.id).await.unwrap(), 0);

        repo.insert("Algebra", Some(math.id), Utc::now())
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO files (name, content_type, size_bytes, parent_folder_id, created_at)
             VALUES ('a.txt', 'text/plain', 1, ?, ?)",
        )
        .bind(math.id)
        .bind(Utc::now())
        .execute(&*pool)
        .await
        .unwrap();

        assert_eq!(repo.count_children(math.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_delete_reports_missing_rows() {
        let pool = memory_pool().await;
        let repo = FolderRepository::new(&pool);
        let folder = repo.insert("Tmp", None, Utc::now()).await.unwrap();

        assert!(repo.delete(folder.id).await.unwrap());
        assert!(!repo.delete(folder.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_ids_by_name_is_scoped_to_parent() {
        let pool = memory_pool().await;
        let repo = FolderRepository::new(&pool);
        let math = repo.insert("Math", None, Utc::now()).await.unwrap();
        let a = repo.insert("Shared", None, Utc::now()).await.unwrap();
        let b = repo.insert("Shared", None, Utc::now()).await.unwrap();
        let nested = repo
            .insert("Shared", Some(math.id), Utc::now())
            .await
            .unwrap();

        assert_eq!(repo.ids_by_name(None, "Shared").await.unwrap(), vec![a.id, b.id]);
        assert_eq!(
            repo.ids_by_name(Some(math.id), "Shared").await.unwrap(),
            vec![nested.id]
        );
        assert!(repo.ids_by_name(None, "shared").await.unwrap().is_empty());
    }
}
