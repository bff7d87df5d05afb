//! Defines routes for the folder, file and share-link API.
//!
//! ## Structure
//! - **Folders**
//!   - `POST   /api/files/folder`             create folder
//!   - `GET    /api/files/path/{folderId}`    ancestry, root first
//!   - `DELETE /api/files/folders/{folderId}` delete empty folder
//!   - `GET    /api/files/list`               children of `?parentFolderId=`
//!
//! - **Files**
//!   - `POST   /api/files/upload`             multipart upload
//!   - `GET    /api/files/download/{id}`      stream file
//!   - `DELETE /api/files/delete/{id}`        delete file
//!
//! - **Share links**
//!   - `POST   /api/files/share`              issue link
//!   - `GET    /api/files/share/{token}`      redeem with `?password=`

use crate::{
    handlers::{
        file_handlers::{delete_file, download_file, upload_file},
        folder_handlers::{create_folder, delete_folder, folder_path, list_children},
        health_handlers::{healthz, readyz},
        share_handlers::{create_share_link, redeem_share_link},
    },
    services::tree_service::MAX_FILE_SIZE,
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;

/// Slack on top of the file limit for multipart boundaries and headers.
const MULTIPART_OVERHEAD: usize = 2 * 1024 * 1024;

/// Build the router for every API route.
///
/// The router carries `AppState` to all handlers. CORS and request tracing
/// are layered on by the caller.
pub fn routes() -> Router<AppState> {
    let upload_limit = MAX_FILE_SIZE as usize + MULTIPART_OVERHEAD;

    let api = Router::new()
        .route(
            "/upload",
            post(upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/folder", post(create_folder))
        .route("/path/{folder_id}", get(folder_path))
        .route("/folders/{folder_id}", delete(delete_folder))
        .route("/list", get(list_children))
        .route("/download/{id}", get(download_file))
        .route("/delete/{id}", delete(delete_file))
        .route("/share", post(create_share_link))
        .route("/share/{token}", get(redeem_share_link));

    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .nest("/api/files", api)
}

/// CORS policy allowing a single browser origin.
pub fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}
