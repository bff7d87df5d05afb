//! HTTP handlers for folder operations and listings.

use crate::{
    errors::AppError,
    models::folder::{Folder, FolderPathEntry},
    services::tree_service::Listing,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};

/// Body for `POST /api/files/folder`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderReq {
    pub folder_name: String,
    pub parent_folder_id: Option<i64>,
}

/// Optional `?parentFolderId=` accepted by listing and upload.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentQuery {
    pub parent_folder_id: Option<i64>,
}

/// POST `/api/files/folder`: create a folder.
pub async fn create_folder(
    State(state): State<AppState>,
    Json(req): Json<CreateFolderReq>,
) -> Result<Json<Folder>, AppError> {
    let folder = state
        .tree
        .create_folder(&req.folder_name, req.parent_folder_id)
        .await?;
    Ok(Json(folder))
}

/// GET `/api/files/path/{folderId}`: ancestry, root first.
pub async fn folder_path(
    State(state): State<AppState>,
    Path(folder_id): Path<i64>,
) -> Result<Json<Vec<FolderPathEntry>>, AppError> {
    Ok(Json(state.tree.folder_path(folder_id).await?))
}

/// DELETE `/api/files/folders/{folderId}`: delete an empty folder.
pub async fn delete_folder(
    State(state): State<AppState>,
    Path(folder_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    state.tree.delete_folder(folder_id).await?;
    Ok(Json(json!({ "message": "Folder deleted successfully" })))
}

/// GET `/api/files/list`: files and folders directly under a parent.
pub async fn list_children(
    State(state): State<AppState>,
    Query(q): Query<ParentQuery>,
) -> Result<Json<Listing>, AppError> {
    Ok(Json(state.tree.list_children(q.parent_folder_id).await?))
}
