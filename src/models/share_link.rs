//! Represents a password-protected, expiring link to a single file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A share link record.
///
/// Links are created on demand and never updated. The password is stored as
/// an Argon2 PHC string and is never serialized.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ShareLink {
    /// Auto-assigned identifier.
    pub id: i64,

    /// Referenced file id, kept opaque and checked only on redeem.
    pub file_id: String,

    /// Random token embedded in the link; unique across all links.
    pub token: String,

    /// Public link string handed to the recipient.
    pub link: String,

    /// Salted password hash.
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// The link stops working at this instant.
    pub expires_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
}

impl ShareLink {
    /// Whether the link has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
