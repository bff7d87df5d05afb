//! Error taxonomy shared by the tree and share-link services.

use chrono::{DateTime, Utc};
use std::io;
use thiserror::Error;

/// Coarse classification used by the transport layer to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Auth,
    Expired,
    /// Filesystem, database or hashing failure.
    Io,
}

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("{0}")]
    Validation(String),
    #[error("folder `{0}` not found")]
    FolderNotFound(i64),
    #[error("parent folder `{parent_id}` of folder `{folder_id}` not found")]
    BrokenAncestry { folder_id: i64, parent_id: i64 },
    #[error("file `{0}` not found")]
    FileNotFound(i64),
    #[error("blob for file `{0}` is missing from the store")]
    BlobMissing(i64),
    #[error("share link not found")]
    ShareLinkNotFound,
    #[error("shared file `{0}` no longer exists")]
    SharedFileMissing(String),
    #[error("cannot delete non-empty folder `{0}`, delete all contents first")]
    FolderNotEmpty(i64),
    #[error("a file or folder named `{0}` already exists here")]
    NameTaken(String),
    #[error("invalid share link password")]
    InvalidPassword,
    #[error("share link expired at {0}")]
    ShareLinkExpired(DateTime<Utc>),
    #[error("folder `{0}` has a cyclic parent chain")]
    CyclicAncestry(i64),
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("{context}: {source}")]
    Database {
        context: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

pub type VaultResult<T> = Result<T, VaultError>;

impl VaultError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::FolderNotFound(_)
            | Self::BrokenAncestry { .. }
            | Self::FileNotFound(_)
            | Self::BlobMissing(_)
            | Self::ShareLinkNotFound
            | Self::SharedFileMissing(_) => ErrorKind::NotFound,
            Self::FolderNotEmpty(_) | Self::NameTaken(_) => ErrorKind::Conflict,
            Self::InvalidPassword => ErrorKind::Auth,
            Self::ShareLinkExpired(_) => ErrorKind::Expired,
            Self::CyclicAncestry(_)
            | Self::Io { .. }
            | Self::Database { .. }
            | Self::PasswordHash(_) => ErrorKind::Io,
        }
    }
}

/// Attaches an operation description to a raw storage error.
pub(crate) trait WithContext<T> {
    fn with_context<F>(self, context: F) -> VaultResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> WithContext<T> for Result<T, io::Error> {
    fn with_context<F>(self, context: F) -> VaultResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|source| VaultError::Io {
            context: context(),
            source,
        })
    }
}

impl<T> WithContext<T> for Result<T, sqlx::Error> {
    fn with_context<F>(self, context: F) -> VaultResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|source| VaultError::Database {
            context: context(),
            source,
        })
    }
}
