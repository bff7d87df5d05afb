//! Shared application state handed to every handler.

use crate::services::{share_service::ShareService, tree_service::TreeService};

#[derive(Clone)]
pub struct AppState {
    pub tree: TreeService,
    pub shares: ShareService,
}

impl AppState {
    pub fn new(tree: TreeService, public_base_url: impl Into<String>) -> Self {
        let shares = ShareService::new(tree.clone(), public_base_url);
        Self { tree, shares }
    }
}
