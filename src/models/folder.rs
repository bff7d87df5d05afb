//! Represents a folder, a named node in the hierarchical tree.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A folder in the vault tree.
///
/// A folder maps 1:1 to a directory on the physical store. Only the folder's
/// own name is persisted; its directory is found by walking the parent chain.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    /// Auto-assigned identifier.
    pub id: i64,

    /// Single path segment naming this folder's directory.
    pub name: String,

    /// Parent folder, or `None` for a root-level folder.
    pub parent_id: Option<i64>,

    /// When this folder was created.
    pub created_at: DateTime<Utc>,
}

/// One step of a folder's ancestry, as returned by path lookups.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FolderPathEntry {
    pub id: i64,
    pub name: String,
}

impl From<&Folder> for FolderPathEntry {
    fn from(folder: &Folder) -> Self {
        Self {
            id: folder.id,
            name: folder.name.clone(),
        }
    }
}
