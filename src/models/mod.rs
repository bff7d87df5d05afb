//! Core data models for the file vault.
//!
//! These entities represent the folder tree, the files stored in it and the
//! share links handed out for individual files. They map cleanly to database
//! tables via `sqlx::FromRow` and serialize as camelCase JSON via `serde`.

pub mod file;
pub mod folder;
pub mod share_link;
