//! HTTP handlers for file upload, download and delete.
//! Downloads stream from disk; uploads are buffered (bounded by the body
//! limit on the route) and handed to `TreeService`.

use crate::{
    errors::AppError,
    handlers::folder_handlers::ParentQuery,
    models::file::StoredFile,
    services::tree_service::Upload,
    state::AppState,
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::Response,
};
use bytes::Bytes;
use serde_json::{Value, json};
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// POST `/api/files/upload`: multipart upload.
///
/// Expects a `file` part and an optional `parentFolderId` part (also
/// accepted as a query parameter).
pub async fn upload_file(
    State(state): State<AppState>,
    Query(q): Query<ParentQuery>,
    mut multipart: Multipart,
) -> Result<Json<StoredFile>, AppError> {
    let mut parent_folder_id = q.parent_folder_id;
    let mut file_part: Option<(String, String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(format!("Malformed multipart body: {}", e)))?
    {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::bad_request(format!("Failed to read file: {}", e)))?;
                file_part = Some((file_name, content_type, data));
            }
            Some("parentFolderId") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::bad_request(format!("Failed to read field: {}", e)))?;
                let text = text.trim();
                if !text.is_empty() {
                    let id = text.parse::<i64>().map_err(|_| {
                        AppError::bad_request(format!("Invalid parentFolderId `{}`", text))
                    })?;
                    parent_folder_id = Some(id);
                }
            }
            _ => {}
        }
    }

    let (file_name, content_type, content) =
        file_part.ok_or_else(|| AppError::bad_request("Missing `file` part"))?;

    let saved = state
        .tree
        .save_file(Upload {
            file_name,
            content_type,
            size_bytes: content.len() as i64,
            parent_folder_id,
            content,
        })
        .await?;
    Ok(Json(saved))
}

/// GET `/api/files/download/{id}`: stream a file as an attachment.
pub async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let (meta, file) = state.tree.open_file(id).await?;
    Ok(attachment_response(&meta, file))
}

/// DELETE `/api/files/delete/{id}`: delete blob and record.
pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    state.tree.delete_file(id).await?;
    Ok(Json(json!({ "message": "File deleted successfully" })))
}

/// Build a streaming response carrying `file` as a download of `meta`.
pub(crate) fn attachment_response(meta: &StoredFile, file: File) -> Response {
    let body = Body::from_stream(ReaderStream::new(file));
    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::OK;
    set_file_headers(response.headers_mut(), meta);
    response
}

fn set_file_headers(headers: &mut HeaderMap, meta: &StoredFile) {
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&meta.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&meta.size_bytes.max(0).to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("0")),
    );

    let disposition = format!(
        "attachment; filename=\"{}\"",
        meta.name.replace('\\', "\\\\").replace('"', "\\\"")
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_bytes(disposition.as_bytes())
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn meta(name: &str) -> StoredFile {
        StoredFile {
            id: 1,
            name: name.to_string(),
            content_type: "application/pdf".into(),
            size_bytes: 42,
            parent_folder_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_file_headers() {
        let mut headers = HeaderMap::new();
        set_file_headers(&mut headers, &meta("report.pdf"));
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(headers[header::CONTENT_LENGTH], "42");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"report.pdf\""
        );
    }

    #[test]
    fn test_disposition_escapes_quotes() {
        let mut headers = HeaderMap::new();
        set_file_headers(&mut headers, &meta("say \"hi\".txt"));
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"say \\\"hi\\\".txt\""
        );
    }
}
