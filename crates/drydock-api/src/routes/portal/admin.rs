//! Portal admin routes

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use drydock_db::FileQuery;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::RequireAdmin;
use super::types::{
    AdminDeleteFileRequest, AdminFileListQuery, AdminFileListResponse, AdminFileResponse,
    AdminStats, AdminUpdateUserRequest, AdminUserDetail, AdminUserResponse, AdminUsersResponse,
    OkResponse, Pagination,
};

/// GET /api/admin/users (Admin only)
async fn list_users(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<AdminUsersResponse>, ApiError> {
    let users = state.db.list_users().await?;

    let mut rows = Vec::with_capacity(users.len());
    for user in &users {
        let stats = state.db.file_stats_for_user(user.id).await?;
        rows.push(AdminUserResponse {
            id: user.id,
            name: user.name.clone(),
            username: user.username.clone(),
            role: user.role.as_str().to_string(),
            is_active: user.is_active,
            created_at: user.created_at.to_rfc3339(),
            file_count: stats.file_count,
            total_storage: stats.total_size,
        });
    }

    let overall = state.db.overall_file_stats().await?;

    Ok(Json(AdminUsersResponse {
        users: rows,
        stats: AdminStats {
            total_users: users.len() as i64,
            total_files: overall.file_count,
            total_storage: overall.total_size,
            total_storage_human: drydock_db::utils::format_bytes(overall.total_size),
        },
    }))
}

/// PUT /api/admin/users/{id} (Admin only)
async fn update_user(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<AdminUpdateUserRequest>,
) -> Result<Json<AdminUserDetail>, ApiError> {
    debug!("Updating user: {}", id);

    // Verify user exists
    state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", id)))?;

    if let Some(name) = &request.name {
        if name.trim().is_empty() {
            return Err(ApiError::BadRequest("Name cannot be empty".to_string()));
        }
        state.db.update_user_name(id, name).await?;
    }

    if let Some(is_active) = request.is_active {
        state.db.update_user_active(id, is_active).await?;
    }

    // Fetch updated user
    let user = state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", id)))?;

    info!("Updated user: {}", user.username);

    Ok(Json(AdminUserDetail::from(&user)))
}

/// GET /api/admin/files (Admin only)
async fn list_files(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<AdminFileListQuery>,
) -> Result<Json<AdminFileListResponse>, ApiError> {
    let page = query.page.max(1);
    let limit = query.limit;

    let (files, total) = state
        .db
        .list_files_with_owner(FileQuery {
            user_id: query.user_id,
            search: query.search,
            type_prefix: query.type_prefix,
            offset: (page - 1) * limit,
            limit,
        })
        .await?;

    Ok(Json(AdminFileListResponse {
        files: files.iter().map(AdminFileResponse::from).collect(),
        pagination: Pagination::new(page, limit, total),
    }))
}

/// DELETE /api/admin/files (Admin only)
async fn delete_file(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(request): Json<AdminDeleteFileRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    let file = state
        .db
        .get_file_by_id(&request.file_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("File not found".to_string()))?;

    if let Err(e) = state.storage.delete(&file.file_key).await {
        warn!("Failed to delete object {}: {}", file.file_key, e);
    }

    state.db.delete_file(&request.file_id).await?;

    info!("Admin {} deleted {}", admin.username, file.file_name);

    Ok(Json(OkResponse { success: true }))
}

/// Create admin routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{id}", put(update_user))
        .route(
            "/api/admin/files",
            get(list_files).delete(delete_file),
        )
}
