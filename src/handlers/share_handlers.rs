//! HTTP handlers for share links.

use crate::{
    errors::AppError, handlers::file_handlers::attachment_response,
    models::share_link::ShareLink, state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    response::Response,
};
use serde::Deserialize;

/// Body for `POST /api/files/share`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShareReq {
    pub file_id: String,
    pub password: String,
    pub expiry_days: i64,
}

#[derive(Debug, Deserialize)]
pub struct RedeemQuery {
    pub password: Option<String>,
}

/// POST `/api/files/share`: issue a share link.
pub async fn create_share_link(
    State(state): State<AppState>,
    Json(req): Json<CreateShareReq>,
) -> Result<Json<ShareLink>, AppError> {
    let link = state
        .shares
        .create_share_link(&req.file_id, &req.password, req.expiry_days)
        .await?;
    Ok(Json(link))
}

/// GET `/api/files/share/{token}?password=`: download through a link.
///
/// 401 on a wrong password, 410 once expired, 404 otherwise.
pub async fn redeem_share_link(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Query(q): Query<RedeemQuery>,
) -> Result<Response, AppError> {
    let password = q.password.unwrap_or_default();
    let (meta, file) = state.shares.redeem_share_link(&token, &password).await?;
    Ok(attachment_response(&meta, file))
}
