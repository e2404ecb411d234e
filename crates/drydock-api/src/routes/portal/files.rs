//! Portal file routes

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    routing::{delete, get, post},
};
use drydock_db::{FileQuery, NewStoredFile};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::RequireAuth;
use super::types::{FileListQuery, FileListResponse, FileResponse, OkResponse, Pagination,
    UploadResponse};

/// POST /api/upload
async fn upload(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;
            upload = Some((file_name, content_type, data));
            break;
        }
    }

    let Some((file_name, content_type, data)) = upload else {
        return Err(ApiError::BadRequest("No file provided".to_string()));
    };

    let id = Uuid::new_v4().to_string();
    let extension = std::path::Path::new(&file_name)
        .extension()
        .and_then(|e| e.to_str());
    let file_key = match extension {
        Some(ext) => format!("uploads/{}/{}.{}", user.id, id, ext),
        None => format!("uploads/{}/{}", user.id, id),
    };

    debug!("Uploading {} ({} bytes) to {}", file_name, data.len(), file_key);

    let file_size = data.len() as i64;
    state.storage.put(&file_key, data, &content_type).await?;
    let file_url = state.storage.public_url(&file_key);

    let file = state
        .db
        .insert_file(NewStoredFile {
            id,
            user_id: user.id,
            file_name,
            file_key,
            file_url,
            file_type: content_type,
            file_size,
        })
        .await?;

    metrics::counter!("drydock_uploads_total").increment(1);
    info!("User {} uploaded {}", user.username, file.file_name);

    Ok(Json(UploadResponse {
        success: true,
        file: FileResponse::from(&file),
    }))
}

/// GET /api/files
async fn list_files(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<FileListQuery>,
) -> Result<Json<FileListResponse>, ApiError> {
    let page = query.page.max(1);
    let limit = query.limit;

    let (files, total) = state
        .db
        .list_files(FileQuery {
            user_id: Some(user.id),
            search: query.search,
            type_prefix: query.type_prefix,
            offset: (page - 1) * limit,
            limit,
        })
        .await?;

    Ok(Json(FileListResponse {
        files: files.iter().map(FileResponse::from).collect(),
        pagination: Pagination::new(page, limit, total),
    }))
}

/// DELETE /api/files/{id}
async fn delete_file(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    let file = state
        .db
        .get_file_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;

    if file.user_id != user.id {
        return Err(ApiError::Forbidden);
    }

    // A storage failure must not leave the record pointing at a dead key
    if let Err(e) = state.storage.delete(&file.file_key).await {
        warn!("Failed to delete object {}: {}", file.file_key, e);
    }

    state.db.delete_file(&id).await?;

    info!("User {} deleted {}", user.username, file.file_name);

    Ok(Json(OkResponse { success: true }))
}

/// Create file routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/upload", post(upload))
        .route("/api/files", get(list_files))
        .route("/api/files/{id}", delete(delete_file))
}
