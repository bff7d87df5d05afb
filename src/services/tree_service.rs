//! src/services/tree_service.rs
//!
//! TreeService: folder and file operations backed by SQLite for metadata
//! and a local directory tree for payloads. Records hold only their own
//! name and parent id, and on-disk locations are rebuilt from the parent
//! chain whenever they are needed.

use crate::{
    models::{
        file::StoredFile,
        folder::{Folder, FolderPathEntry},
    },
    repository::{FileRepository, FolderRepository, NewFile},
    services::{
        error::{VaultError, VaultResult, WithContext},
        physical_store::PhysicalStore,
    },
};
use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use std::{
    collections::{HashMap, HashSet, VecDeque},
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::fs::File;
use tracing::{debug, info, warn};

/// Largest accepted upload, in bytes (10 MiB).
pub const MAX_FILE_SIZE: i64 = 10 * 1024 * 1024;

/// MIME types accepted for upload.
pub const ALLOWED_CONTENT_TYPES: [&str; 4] =
    ["application/pdf", "image/jpeg", "image/png", "text/plain"];

/// An upload as handed over by the transport layer.
#[derive(Clone, Debug)]
pub struct Upload {
    /// Client-supplied name, possibly carrying path components.
    pub file_name: String,
    pub content_type: String,
    /// Declared length; must match `content`.
    pub size_bytes: i64,
    pub parent_folder_id: Option<i64>,
    pub content: Bytes,
}

/// Direct children of one folder (or of the root).
#[derive(Debug, Serialize)]
pub struct Listing {
    pub files: Vec<StoredFile>,
    pub folders: Vec<Folder>,
}

/// Outcome of a recursive folder delete.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecursiveDeleteReport {
    pub folders_removed: usize,
    pub files_removed: usize,
    /// Blobs that could not be removed although their records were.
    pub blob_failures: usize,
}

/// TreeService provides the folder/file operations:
/// - Create folders (directory first, then metadata)
/// - Upload files (blob first, then metadata)
/// - List, resolve ancestry, download
/// - Delete files and folders, plus a best-effort recursive delete
#[derive(Clone)]
pub struct TreeService {
    /// Shared SQLite connection pool used for metadata operations.
    pub db: Arc<SqlitePool>,

    /// Directory tree holding folder directories and file blobs.
    pub store: PhysicalStore,
}

impl TreeService {
    pub fn new(db: Arc<SqlitePool>, store: PhysicalStore) -> Self {
        Self { db, store }
    }

    fn folders(&self) -> FolderRepository<'_> {
        FolderRepository::new(&self.db)
    }

    fn files(&self) -> FileRepository<'_> {
        FileRepository::new(&self.db)
    }

    /// Fetch a folder or fail with `FolderNotFound`.
    async fn fetch_folder(&self, id: i64) -> VaultResult<Folder> {
        self.folders()
            .find(id)
            .await
            .with_context(|| format!("loading folder {}", id))?
            .ok_or(VaultError::FolderNotFound(id))
    }

    /// The folder and all of its ancestors, root first.
    ///
    /// A parent reference that points at a missing row is a hard error.
    async fn ancestry(&self, id: i64) -> VaultResult<Vec<Folder>> {
        let folder = self.fetch_folder(id).await?;
        let mut seen = HashSet::from([folder.id]);
        let mut parent_id = folder.parent_id;
        let mut chain = vec![folder];

        while let Some(pid) = parent_id {
            let child_id = chain.last().map(|f| f.id).unwrap_or(id);
            let parent = self
                .folders()
                .find(pid)
                .await
                .with_context(|| format!("loading ancestor {} of folder {}", pid, id))?
                .ok_or(VaultError::BrokenAncestry {
                    folder_id: child_id,
                    parent_id: pid,
                })?;
            if !seen.insert(parent.id) {
                return Err(VaultError::CyclicAncestry(id));
            }
            parent_id = parent.parent_id;
            chain.push(parent);
        }

        chain.reverse();
        Ok(chain)
    }

    /// Store-relative directory of a folder.
    pub async fn folder_dir(&self, id: i64) -> VaultResult<PathBuf> {
        let chain = self.ancestry(id).await?;
        Ok(chain.iter().map(|f| f.name.as_str()).collect())
    }

    /// Store-relative directory for an optional parent (the root when `None`).
    async fn parent_dir(&self, parent_id: Option<i64>) -> VaultResult<PathBuf> {
        match parent_id {
            Some(id) => self.folder_dir(id).await,
            None => Ok(PathBuf::new()),
        }
    }

    /// Store-relative location of a file's blob.
    pub async fn file_location(&self, file: &StoredFile) -> VaultResult<PathBuf> {
        Ok(self.parent_dir(file.parent_folder_id).await?.join(&file.name))
    }

    /// Ids of folder records whose directory is `dir`.
    ///
    /// Sibling names may repeat, so several records can share a directory.
    async fn folders_at(&self, dir: &Path) -> VaultResult<Vec<i64>> {
        let mut ids = Vec::new();
        let mut parents = vec![None];
        for segment in dir.iter() {
            let name = segment.to_string_lossy();
            ids.clear();
            for parent in &parents {
                let found = self
                    .folders()
                    .ids_by_name(*parent, &name)
                    .await
                    .with_context(|| format!("looking up folders named `{}`", name))?;
                ids.extend(found);
            }
            if ids.is_empty() {
                break;
            }
            parents = ids.iter().copied().map(Some).collect();
        }
        Ok(ids)
    }

    /// Remove the directory of a deleted folder once no record maps to it.
    async fn release_dir(&self, folder_id: i64, dir: &Path) {
        match self.folders_at(dir).await {
            Ok(ids) if ids.is_empty() => {
                if let Err(err) = self.store.remove_dir_if_empty(dir).await {
                    warn!(folder_id, error = %err, "failed to remove folder directory");
                }
            }
            Ok(ids) => {
                debug!(folder_id, shared_with = ?ids, "directory still used by another folder");
            }
            Err(err) => {
                warn!(folder_id, error = %err, "cannot check directory users, keeping it");
            }
        }
    }

    /// Create a folder under `parent_id` (or at the root).
    ///
    /// The directory is created if missing; an existing directory is reused.
    pub async fn create_folder(&self, name: &str, parent_id: Option<i64>) -> VaultResult<Folder> {
        validate_folder_name(name)?;
        let rel = self.parent_dir(parent_id).await?.join(name);

        let clash = self
            .files()
            .find_by_name(parent_id, name)
            .await
            .with_context(|| format!("looking up file `{}`", name))?;
        if clash.is_some() {
            return Err(VaultError::NameTaken(name.to_string()));
        }

        self.store
            .ensure_dir(&rel)
            .await
            .with_context(|| format!("creating directory for folder `{}`", name))?;

        let folder = self
            .folders()
            .insert(name, parent_id, Utc::now())
            .await
            .with_context(|| format!("saving folder `{}`", name))?;

        info!(folder_id = folder.id, ?parent_id, name, "folder created");
        Ok(folder)
    }

    /// Ancestry of a folder as `{id, name}` pairs, root first, target last.
    pub async fn folder_path(&self, id: i64) -> VaultResult<Vec<FolderPathEntry>> {
        let chain = self.ancestry(id).await?;
        Ok(chain.iter().map(FolderPathEntry::from).collect())
    }

    /// Delete an empty folder.
    ///
    /// Fails with `FolderNotEmpty` while any file or subfolder references it.
    /// After the row is gone the directory is removed if it is empty on disk
    /// and no same-named sibling record still maps to it.
    pub async fn delete_folder(&self, id: i64) -> VaultResult<()> {
        self.fetch_folder(id).await?;

        let children = self
            .folders()
            .count_children(id)
            .await
            .with_context(|| format!("counting children of folder {}", id))?;
        if children > 0 {
            return Err(VaultError::FolderNotEmpty(id));
        }

        let dir = match self.folder_dir(id).await {
            Ok(dir) => Some(dir),
            Err(err) => {
                warn!(folder_id = id, error = %err, "cannot locate folder directory");
                None
            }
        };

        let removed = self
            .folders()
            .delete(id)
            .await
            .with_context(|| format!("deleting folder {}", id))?;
        if !removed {
            return Err(VaultError::FolderNotFound(id));
        }

        if let Some(dir) = dir {
            self.release_dir(id, &dir).await;
        }

        info!(folder_id = id, "folder deleted");
        Ok(())
    }

    /// Delete a folder with everything below it.
    ///
    /// Best effort, not atomic: a blob that cannot be removed is logged and
    /// counted, and its record is deleted anyway. Database errors abort the
    /// walk, leaving whatever was already removed removed.
    pub async fn delete_folder_recursive(&self, id: i64) -> VaultResult<RecursiveDeleteReport> {
        let root = self.fetch_folder(id).await?;
        let root_dir = match self.folder_dir(id).await {
            Ok(dir) => Some(dir),
            Err(err) => {
                warn!(folder_id = id, error = %err, "cannot locate folder directory");
                None
            }
        };

        // Breadth-first, so every folder appears after its parent.
        let mut dirs: HashMap<i64, Option<PathBuf>> = HashMap::from([(root.id, root_dir)]);
        let mut order = Vec::new();
        let mut queue = VecDeque::from([root]);
        while let Some(folder) = queue.pop_front() {
            let children = self
                .folders()
                .list_children(Some(folder.id))
                .await
                .with_context(|| format!("listing subfolders of folder {}", folder.id))?;
            let dir = dirs.get(&folder.id).cloned().flatten();
            for child in children {
                dirs.insert(child.id, dir.as_ref().map(|d| d.join(&child.name)));
                queue.push_back(child);
            }
            order.push(folder);
        }

        let mut report = RecursiveDeleteReport::default();
        for folder in order.iter().rev() {
            let dir = dirs.get(&folder.id).cloned().flatten();
            let files = self
                .files()
                .list_children(Some(folder.id))
                .await
                .with_context(|| format!("listing files of folder {}", folder.id))?;

            for file in files {
                match &dir {
                    Some(dir) => {
                        if let Err(err) = self.store.remove_blob(&dir.join(&file.name)).await {
                            warn!(file_id = file.id, error = %err, "failed to delete blob");
                            report.blob_failures += 1;
                        }
                    }
                    None => {
                        warn!(
                            file_id = file.id,
                            folder_id = folder.id,
                            "blob location unknown, skipping blob delete"
                        );
                        report.blob_failures += 1;
                    }
                }
                self.files()
                    .delete(file.id)
                    .await
                    .with_context(|| format!("deleting file {}", file.id))?;
                report.files_removed += 1;
            }

            self.folders()
                .delete(folder.id)
                .await
                .with_context(|| format!("deleting folder {}", folder.id))?;
            report.folders_removed += 1;

            if let Some(dir) = &dir {
                self.release_dir(folder.id, dir).await;
            }
        }

        info!(
            folder_id = id,
            folders = report.folders_removed,
            files = report.files_removed,
            blob_failures = report.blob_failures,
            "folder and its contents deleted"
        );
        Ok(report)
    }

    /// Direct children of `parent_id`, or root-level entries when `None`.
    ///
    /// An unknown parent id simply yields empty lists.
    pub async fn list_children(&self, parent_id: Option<i64>) -> VaultResult<Listing> {
        let files = self
            .files()
            .list_children(parent_id)
            .await
            .with_context(|| format!("listing files under {:?}", parent_id))?;
        let folders = self
            .folders()
            .list_children(parent_id)
            .await
            .with_context(|| format!("listing folders under {:?}", parent_id))?;
        Ok(Listing { files, folders })
    }

    /// Store an uploaded file.
    ///
    /// - Validates content, name, type and size before touching disk.
    /// - Writes the blob (last write wins) and then persists metadata.
    /// - Re-uploading a name into the same folder refreshes the existing
    ///   record instead of adding a second one.
    pub async fn save_file(&self, upload: Upload) -> VaultResult<StoredFile> {
        if upload.content.is_empty() {
            return Err(VaultError::validation("File is empty"));
        }
        let name = sanitize_file_name(&upload.file_name)?;
        if !ALLOWED_CONTENT_TYPES.contains(&upload.content_type.as_str()) {
            return Err(VaultError::validation(format!(
                "Unsupported file type: {}",
                upload.content_type
            )));
        }
        if upload.size_bytes > MAX_FILE_SIZE || upload.content.len() as i64 > MAX_FILE_SIZE {
            return Err(VaultError::validation("File size exceeds 10MB limit"));
        }
        if upload.size_bytes != upload.content.len() as i64 {
            return Err(VaultError::validation(format!(
                "Declared size {} does not match received {} bytes",
                upload.size_bytes,
                upload.content.len()
            )));
        }

        let rel = self.parent_dir(upload.parent_folder_id).await?.join(&name);
        let clash = self
            .folders()
            .ids_by_name(upload.parent_folder_id, &name)
            .await
            .with_context(|| format!("looking up folders named `{}`", name))?;
        if !clash.is_empty() {
            return Err(VaultError::NameTaken(name));
        }

        let existing = self
            .files()
            .find_by_name(upload.parent_folder_id, &name)
            .await
            .with_context(|| format!("looking up file `{}`", name))?;

        self.store
            .write_blob(&rel, &upload.content)
            .await
            .with_context(|| format!("writing blob for `{}`", name))?;

        let record = NewFile {
            name: &name,
            content_type: &upload.content_type,
            size_bytes: upload.size_bytes,
            parent_folder_id: upload.parent_folder_id,
            created_at: Utc::now(),
        };

        let saved = match existing {
            Some(existing) => self
                .files()
                .replace(existing.id, &record)
                .await
                .with_context(|| format!("updating file {}", existing.id))?
                .ok_or(VaultError::FileNotFound(existing.id))?,
            None => match self.files().insert(&record).await {
                Ok(file) => file,
                Err(err) => {
                    if let Err(cleanup) = self.store.remove_blob(&rel).await {
                        warn!(name = %name, error = %cleanup, "failed to remove orphan blob");
                    }
                    return Err(VaultError::Database {
                        context: format!("saving file `{}`", name),
                        source: err,
                    });
                }
            },
        };

        info!(
            file_id = saved.id,
            parent_folder_id = ?saved.parent_folder_id,
            name = %saved.name,
            size = saved.size_bytes,
            "file uploaded"
        );
        Ok(saved)
    }

    /// Fetch file metadata or fail with `FileNotFound`.
    pub async fn get_file(&self, id: i64) -> VaultResult<StoredFile> {
        self.files()
            .find(id)
            .await
            .with_context(|| format!("loading file {}", id))?
            .ok_or(VaultError::FileNotFound(id))
    }

    /// Metadata plus an open handle ready for streaming out.
    ///
    /// A record whose blob is missing on disk yields `BlobMissing`.
    pub async fn open_file(&self, id: i64) -> VaultResult<(StoredFile, File)> {
        let file = self.get_file(id).await?;
        let rel = self.file_location(&file).await?;
        let handle = self.store.open_blob(&rel).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                VaultError::BlobMissing(id)
            } else {
                VaultError::Io {
                    context: format!("opening blob for file {}", id),
                    source: err,
                }
            }
        })?;
        Ok((file, handle))
    }

    /// Delete a file's blob and then its record.
    ///
    /// A missing blob is fine. If the filesystem refuses the delete the
    /// record is kept and the error is returned.
    pub async fn delete_file(&self, id: i64) -> VaultResult<()> {
        let file = self.get_file(id).await?;
        let rel = self.file_location(&file).await?;

        self.store
            .remove_blob(&rel)
            .await
            .with_context(|| format!("deleting blob for file {}", id))?;

        self.files()
            .delete(id)
            .await
            .with_context(|| format!("deleting file {}", id))?;

        info!(file_id = id, name = %file.name, "file deleted");
        Ok(())
    }
}

/// A folder name must be a single, non-blank path segment.
fn validate_folder_name(name: &str) -> VaultResult<()> {
    if name.trim().is_empty() {
        return Err(VaultError::validation("Folder name is required"));
    }
    if name == "." || name == ".." {
        return Err(VaultError::validation("Folder name is invalid"));
    }
    if name
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control())
    {
        return Err(VaultError::validation(
            "Folder name must not contain path separators or control characters",
        ));
    }
    Ok(())
}

/// Reduce an uploaded name to its last path segment.
fn sanitize_file_name(raw: &str) -> VaultResult<String> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or("").trim();
    if name.is_empty() || name == "." || name == ".." || name.chars().any(char::is_control) {
        return Err(VaultError::validation("File name is invalid"));
    }
    Ok(name.to_string())
}
