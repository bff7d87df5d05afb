//! src/services/share_service.rs
//!
//! ShareService issues and redeems password-protected, expiring links to
//! single files. Links are looked up by exact token and never updated.

use crate::{
    models::{file::StoredFile, share_link::ShareLink},
    repository::{NewShareLink, ShareLinkRepository},
    services::{
        error::{VaultError, VaultResult, WithContext},
        password,
        tree_service::TreeService,
    },
};
use chrono::{DateTime, Duration, Utc};
use tokio::fs::File;
use tracing::{debug, info};
use uuid::Uuid;

/// Path under the public base URL where links are redeemed.
pub const SHARE_PATH: &str = "/api/files/share";

#[derive(Clone)]
pub struct ShareService {
    tree: TreeService,

    /// Scheme and authority prepended to every issued link.
    public_base_url: String,
}

impl ShareService {
    pub fn new(tree: TreeService, public_base_url: impl Into<String>) -> Self {
        Self {
            tree,
            public_base_url: public_base_url.into(),
        }
    }

    fn links(&self) -> ShareLinkRepository<'_> {
        ShareLinkRepository::new(&self.tree.db)
    }

    /// Public link string for a token.
    pub fn link_for(&self, token: &str) -> String {
        format!(
            "{}{}/{}",
            self.public_base_url.trim_end_matches('/'),
            SHARE_PATH,
            token
        )
    }

    /// Issue a link to `file_id` that expires `expiry_days` from now.
    ///
    /// The file id is not checked here; a link to a missing file fails on
    /// redeem instead.
    pub async fn create_share_link(
        &self,
        file_id: &str,
        password: &str,
        expiry_days: i64,
    ) -> VaultResult<ShareLink> {
        self.create_share_link_at(file_id, password, expiry_days, Utc::now())
            .await
    }

    /// Same as [`create_share_link`](Self::create_share_link) with an explicit clock.
    pub async fn create_share_link_at(
        &self,
        file_id: &str,
        password: &str,
        expiry_days: i64,
        now: DateTime<Utc>,
    ) -> VaultResult<ShareLink> {
        if password.is_empty() {
            return Err(VaultError::validation("Share password is required"));
        }
        let expires_at = Duration::try_days(expiry_days)
            .filter(|_| expiry_days >= 0)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                VaultError::validation(format!("Invalid expiry of {} days", expiry_days))
            })?;

        let password_hash = password::hash_password(password)?;
        let token = Uuid::new_v4().simple().to_string();
        let link = self.link_for(&token);

        let stored = self
            .links()
            .insert(&NewShareLink {
                file_id,
                token: &token,
                link: &link,
                password_hash: &password_hash,
                expires_at,
                created_at: now,
            })
            .await
            .with_context(|| format!("saving share link for file {}", file_id))?;

        info!(share_id = stored.id, file_id, %expires_at, "share link created");
        Ok(stored)
    }

    /// Redeem a link at the current time.
    pub async fn redeem_share_link(
        &self,
        token: &str,
        password: &str,
    ) -> VaultResult<(StoredFile, File)> {
        self.redeem_share_link_at(token, password, Utc::now()).await
    }

    /// Redeem a link as of `now`.
    ///
    /// Checks run in order: token, password, expiry, then the file itself,
    /// so a wrong password on an expired link reports `InvalidPassword`.
    pub async fn redeem_share_link_at(
        &self,
        token: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> VaultResult<(StoredFile, File)> {
        let link = self
            .links()
            .find_by_token(token)
            .await
            .with_context(|| "looking up share link".to_string())?
            .ok_or(VaultError::ShareLinkNotFound)?;

        if !password::verify_password(password, &link.password_hash)? {
            debug!(share_id = link.id, "share link password mismatch");
            return Err(VaultError::InvalidPassword);
        }
        if link.is_expired_at(now) {
            return Err(VaultError::ShareLinkExpired(link.expires_at));
        }

        let file_id = link
            .file_id
            .trim()
            .parse::<i64>()
            .map_err(|_| VaultError::SharedFileMissing(link.file_id.clone()))?;
        let opened = self.tree.open_file(file_id).await.map_err(|err| match err {
            VaultError::FileNotFound(_) | VaultError::BlobMissing(_) => {
                VaultError::SharedFileMissing(link.file_id.clone())
            }
            other => other,
        })?;

        info!(share_id = link.id, file_id, "share link redeemed");
        Ok(opened)
    }
}
