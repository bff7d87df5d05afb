//! Represents a file stored in the vault.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Metadata for a single stored file.
///
/// The `StoredFile` struct holds metadata, not the content bytes. The blob
/// lives at `<parent folder directory>/<name>` on the physical store.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    /// Auto-assigned identifier.
    pub id: i64,

    /// Sanitized file name (last path segment of the uploaded name).
    pub name: String,

    /// Declared MIME type, one of the allowed upload types.
    pub content_type: String,

    /// Size in bytes.
    pub size_bytes: i64,

    /// Containing folder, or `None` for a root-level file.
    pub parent_folder_id: Option<i64>,

    /// When this file was created (or last replaced by an upload).
    pub created_at: DateTime<Utc>,
}
