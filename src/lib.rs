//! File vault: a folder tree of uploaded files on local disk, with SQLite
//! metadata and password-protected share links.
//!
//! - [`services::tree_service`]: folder/file operations and their invariants
//! - [`services::share_service`]: expiring share links
//! - [`handlers`] and [`routes`]: the HTTP surface

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;
