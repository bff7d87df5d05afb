//! src/services/physical_store.rs
//!
//! PhysicalStore is the on-disk half of the vault. Every path it accepts is
//! relative to the configured upload root; callers build those relative
//! paths from folder names so the root can move without touching metadata.

use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct PhysicalStore {
    /// Absolute directory that holds root-level folders and files.
    root: PathBuf,
}

impl PhysicalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a store-relative path.
    pub fn resolve(&self, rel: &Path) -> PathBuf {
        self.root.join(rel)
    }

    /// Create the directory at `rel` and any missing ancestors.
    ///
    /// Idempotent: an existing directory is not an error.
    pub async fn ensure_dir(&self, rel: &Path) -> io::Result<PathBuf> {
        let path = self.resolve(rel);
        fs::create_dir_all(&path).await?;
        Ok(path)
    }

    /// Write `bytes` to `rel`, replacing any existing blob.
    ///
    /// - Writes to a temporary sibling first.
    /// - Flushes and fsyncs before renaming into place.
    ///
    /// The temporary file is removed on every error path.
    pub async fn write_blob(&self, rel: &Path, bytes: &[u8]) -> io::Result<PathBuf> {
        let file_path = self.resolve(rel);
        let parent = file_path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| io::Error::new(ErrorKind::Other, "blob path missing parent directory"))?;
        fs::create_dir_all(&parent).await?;
        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        if let Err(err) = file.write_all(bytes).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err);
        }
        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err);
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(err);
        }
        drop(file);

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&file_path).await?;
                fs::rename(&tmp_path, &file_path).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(err);
            }
        }

        Ok(file_path)
    }

    /// Open a blob for streaming out.
    pub async fn open_blob(&self, rel: &Path) -> io::Result<File> {
        File::open(self.resolve(rel)).await
    }

    /// Remove a blob. Returns `Ok(false)` when it was already gone.
    pub async fn remove_blob(&self, rel: &Path) -> io::Result<bool> {
        let file_path = self.resolve(rel);
        match fs::remove_file(&file_path).await {
            Ok(_) => {
                debug!("removed physical file {}", file_path.display());
                Ok(true)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("file {} already missing", file_path.display());
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Remove the directory at `rel` if it exists and is empty.
    ///
    /// The store root itself is never removed. A missing or non-empty
    /// directory yields `Ok(false)`.
    pub async fn remove_dir_if_empty(&self, rel: &Path) -> io::Result<bool> {
        if rel.as_os_str().is_empty() {
            return Ok(false);
        }
        let dir = self.resolve(rel);
        match fs::remove_dir(&dir).await {
            Ok(_) => {
                debug!("removed directory {}", dir.display());
                Ok(true)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) if err.kind() == ErrorKind::DirectoryNotEmpty => {
                debug!("directory {} not empty, leaving it", dir.display());
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Best-effort write/read/delete round trip under the root.
    ///
    /// Returns a description of the first failing step.
    pub async fn probe(&self) -> Result<(), String> {
        let tmp_path = self.root.join(format!(".readyz-{}", Uuid::new_v4()));
        fs::write(&tmp_path, b"readyz")
            .await
            .map_err(|e| format!("could not write tmp file: {}", e))?;
        let read = fs::read(&tmp_path).await;
        let _ = fs::remove_file(&tmp_path).await;
        match read {
            Ok(bytes) if bytes == b"readyz" => Ok(()),
            Ok(_) => Err("file content mismatch".to_string()),
            Err(e) => Err(format!("could not read tmp file: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn test_write_blob_overwrites_existing_content() {
        let tmp = TempDir::new().unwrap();
        let store = PhysicalStore::new(tmp.path());
        let rel = Path::new("notes").join("a.txt");

        store.write_blob(&rel, b"first").await.unwrap();
        store.write_blob(&rel, b"second").await.unwrap();

        let mut contents = String::new();
        store
            .open_blob(&rel)
            .await
            .unwrap()
            .read_to_string(&mut contents)
            .await
            .unwrap();
        assert_eq!(contents, "second");

        // no temp files left behind
        let mut entries = fs::read_dir(tmp.path().join("notes")).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        assert_eq!(names, vec!["a.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_remove_blob_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = PhysicalStore::new(tmp.path());
        let rel = Path::new("b.txt");

        store.write_blob(rel, b"x").await.unwrap();
        assert!(store.remove_blob(rel).await.unwrap());
        assert!(!store.remove_blob(rel).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_dir_if_empty_keeps_populated_dirs_and_root() {
        let tmp = TempDir::new().unwrap();
        let store = PhysicalStore::new(tmp.path());

        store.ensure_dir(Path::new("empty")).await.unwrap();
        store
            .write_blob(&Path::new("full").join("c.txt"), b"x")
            .await
            .unwrap();

        assert!(store.remove_dir_if_empty(Path::new("empty")).await.unwrap());
        assert!(!store.remove_dir_if_empty(Path::new("full")).await.unwrap());
        assert!(!store.remove_dir_if_empty(Path::new("missing")).await.unwrap());
        assert!(!store.remove_dir_if_empty(Path::new("")).await.unwrap());
        assert!(tmp.path().join("full").join("c.txt").exists());
        assert!(tmp.path().exists());
    }

    #[tokio::test]
    async fn test_probe_succeeds_on_writable_root() {
        let tmp = TempDir::new().unwrap();
        let store = PhysicalStore::new(tmp.path());
        assert!(store.probe().await.is_ok());
    }
}
