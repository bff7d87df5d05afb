//! Share link repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::share_link::ShareLink;

#[derive(Debug, Clone)]
pub struct NewShareLink<'n> {
    pub file_id: &'n str,
    pub token: &'n str,
    pub link: &'n str,
    pub password_hash: &'n str,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Repository for share link rows. Links are insert-only.
pub struct ShareLinkRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ShareLinkRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, link: &NewShareLink<'_>) -> sqlx::Result<ShareLink> {
        sqlx::query_as::<_, ShareLink>(
            "INSERT INTO share_links (file_id, token, link, password_hash, expires_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id, file_id, token, link, password_hash, expires_at, created_at",
        )
        .bind(link.file_id)
        .bind(link.token)
        .bind(link.link)
        .bind(link.password_hash)
        .bind(link.expires_at)
        .bind(link.created_at)
        .fetch_one(self.pool)
        .await
    }

    /// Exact-match lookup on the token column.
    pub async fn find_by_token(&self, token: &str) -> sqlx::Result<Option<ShareLink>> {
        sqlx::query_as::<_, ShareLink>(
            "SELECT id, file_id, token, link, password_hash, expires_at, created_at
             FROM share_links WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    #[tokio::test]
    async fn test_token_lookup_is_exact() {
        let pool = memory_pool().await;
        let repo = ShareLinkRepository::new(&pool);
        let now = Utc::now();
        let stored = repo
            .insert(&NewShareLink {
                file_id: "1",
                token: "abcdef",
                link: "http://localhost:8080/api/files/share/abcdef",
                password_hash: "$argon2id$placeholder",
                expires_at: now,
                created_at: now,
            })
            .await
            .unwrap();

        let found = repo.find_by_token("abcdef").await.unwrap().unwrap();
        assert_eq!(found.id, stored.id);
        assert_eq!(found.file_id, "1");
        assert!(repo.find_by_token("abc").await.unwrap().is_none());
        assert!(repo.find_by_token("abcdefg").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_tokens_are_rejected() {
        let pool = memory_pool().await;
        let repo = ShareLinkRepository::new(&pool);
        let now = Utc::now();
        let link = NewShareLink {
            file_id: "1",
            token: "dup",
            link: "l",
            password_hash: "h",
            expires_at: now,
            created_at: now,
        };
        repo.insert(&link).await.unwrap();
        assert!(repo.insert(&link).await.is_err());
    }
}
