//! Metadata repositories.
//!
//! Thin wrappers over the SQLite pool, one per table. Each call is a single
//! statement, so every create/read/delete of one row is atomic. Errors are
//! returned raw; the services attach operation context.

mod file;
mod folder;
mod share_link;

pub use file::{FileRepository, NewFile};
pub use folder::FolderRepository;
pub use share_link::{NewShareLink, ShareLinkRepository};
