//! File handlers for the depot Web API.

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::web::dto::{ApiResponse, FileInfo, PaginationQuery};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// Generate a safe Content-Disposition header value for downloads.
///
/// Control characters are stripped (CR/LF would allow header injection),
/// quotes and backslashes are replaced, and non-ASCII names get an
/// RFC 5987 `filename*` parameter.
fn content_disposition_header(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' => '_',
            '\\' => '_',
            _ => c,
        })
        .collect();

    if filename.is_ascii() && !filename.chars().any(|c| c.is_control() || c == '"' || c == '\\') {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let encoded = urlencoding::encode(filename);

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    )
}

/// POST /api/files - Upload a file.
///
/// Expects multipart form data with a `file` field. The owner is the
/// authenticated user from the token, never client input.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<FileInfo>>), ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(|s| s.to_string());
        let content_type = field.content_type().map(|s| s.to_string());

        let content = field.bytes().await.map_err(|e| {
            tracing::error!("Failed to read upload body: {}", e);
            ApiError::bad_request("Failed to read upload body")
        })?;

        let file = state
            .files
            .upload_bytes(
                claims.sub,
                filename.as_deref(),
                content_type.as_deref(),
                &content,
            )
            .await?;

        return Ok((
            StatusCode::CREATED,
            Json(ApiResponse::new(FileInfo::from(&file))),
        ));
    }

    Err(ApiError::bad_request("No file field in request"))
}

/// GET /api/files - List the authenticated user's files.
pub async fn list(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<FileInfo>>>, ApiError> {
    let (offset, limit) = pagination.clamped();

    let files = state.files.list(claims.sub, offset, limit).await?;
    let infos = files.iter().map(FileInfo::from).collect();

    Ok(Json(ApiResponse::new(infos)))
}

/// GET /api/files/:id - Download a file.
pub async fn download(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(file_id): Path<i64>,
) -> Result<Response, ApiError> {
    let download = state.files.download(file_id, claims.sub).await?;

    // Stored content type, falling back to a guess from the display name
    let content_type = download.file.content_type.clone().unwrap_or_else(|| {
        mime_guess::from_path(&download.file.uploaded_name)
            .first_or_octet_stream()
            .to_string()
    });

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&download.file.uploaded_name),
        )
        .header(header::CONTENT_LENGTH, download.content.len())
        .body(Body::from(download.content))
        .map_err(|e| {
            tracing::error!("Failed to build download response: {}", e);
            ApiError::internal("Failed to build response")
        })?;

    Ok(response)
}

/// DELETE /api/files/:id - Delete a file.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(file_id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    state.files.delete(file_id, claims.sub).await?;

    Ok(Json(ApiResponse::new(serde_json::json!({
        "message": "File deleted successfully",
        "file_id": file_id,
    }))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_plain_ascii() {
        assert_eq!(
            content_disposition_header("report.pdf"),
            "attachment; filename=\"report.pdf\""
        );
    }

    #[test]
    fn test_content_disposition_strips_header_injection() {
        let value = content_disposition_header("evil\r\nSet-Cookie: x.pdf");
        assert!(!value.contains('\r'));
        assert!(!value.contains('\n'));
    }

    #[test]
    fn test_content_disposition_escapes_quotes() {
        let value = content_disposition_header("we\"ird.pdf");
        assert!(value.contains("we_ird.pdf"));
    }

    #[test]
    fn test_content_disposition_non_ascii_uses_rfc5987() {
        let value = content_disposition_header("résumé.pdf");
        assert!(value.contains("filename*=UTF-8''"));
    }
}
