//! Core services: the folder/file tree and the share-link manager, plus the
//! physical store and error taxonomy they share.

pub mod error;
pub mod password;
pub mod physical_store;
pub mod share_service;
pub mod tree_service;
