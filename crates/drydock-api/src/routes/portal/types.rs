//! Request/Response DTOs for the portal API

use drydock_auth::AuthUser;
use drydock_db::{FileWithOwner, StoredFile, User};
use serde::{Deserialize, Serialize};

// ==================== Auth Types ====================

/// Registration request
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub username: String,
    pub password: String,
}

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Identity summary (never includes the password hash)
#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: Option<String>,
    pub username: String,
    pub role: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: Some(user.name.clone()),
            username: user.username.clone(),
            role: user.role.as_str().to_string(),
        }
    }
}

impl From<&AuthUser> for UserResponse {
    fn from(user: &AuthUser) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            username: user.username.clone(),
            role: user.role.as_str().to_string(),
        }
    }
}

/// Login/registration response
#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: UserResponse,
}

/// Generic acknowledgement
#[derive(Serialize)]
pub struct OkResponse {
    pub success: bool,
}

// ==================== File Types ====================

/// File summary
#[derive(Serialize)]
pub struct FileResponse {
    pub id: String,
    pub file_name: String,
    pub file_url: String,
    pub file_type: String,
    pub file_size: i64,
    pub created_at: String,
}

impl From<&StoredFile> for FileResponse {
    fn from(file: &StoredFile) -> Self {
        Self {
            id: file.id.clone(),
            file_name: file.file_name.clone(),
            file_url: file.file_url.clone(),
            file_type: file.file_type.clone(),
            file_size: file.file_size,
            created_at: file.created_at.to_rfc3339(),
        }
    }
}

/// Upload response
#[derive(Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub file: FileResponse,
}

/// Pagination envelope
#[derive(Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: (total + limit - 1) / limit.max(1),
        }
    }
}

/// File listing query parameters
#[derive(Deserialize, Default)]
pub struct FileListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, rename = "type")]
    pub type_prefix: Option<String>,
}

pub fn default_page() -> i64 {
    1
}

pub fn default_limit() -> i64 {
    20
}

/// File listing response
#[derive(Serialize)]
pub struct FileListResponse {
    pub files: Vec<FileResponse>,
    pub pagination: Pagination,
}

// ==================== Admin Types ====================

/// User row in the admin overview
#[derive(Serialize)]
pub struct AdminUserResponse {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: String,
    pub file_count: i64,
    pub total_storage: i64,
}

/// Overall portal statistics
#[derive(Serialize)]
pub struct AdminStats {
    pub total_users: i64,
    pub total_files: i64,
    pub total_storage: i64,
    pub total_storage_human: String,
}

/// Admin user overview response
#[derive(Serialize)]
pub struct AdminUsersResponse {
    pub users: Vec<AdminUserResponse>,
    pub stats: AdminStats,
}

/// Admin user update request
#[derive(Deserialize)]
pub struct AdminUpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// User detail returned from admin updates
#[derive(Serialize)]
pub struct AdminUserDetail {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub role: String,
    pub is_active: bool,
}

impl From<&User> for AdminUserDetail {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            username: user.username.clone(),
            role: user.role.as_str().to_string(),
            is_active: user.is_active,
        }
    }
}

/// File row in the admin listing
#[derive(Serialize)]
pub struct AdminFileResponse {
    #[serde(flatten)]
    pub file: FileResponse,
    pub owner_name: String,
    pub owner_username: String,
}

impl From<&FileWithOwner> for AdminFileResponse {
    fn from(entry: &FileWithOwner) -> Self {
        Self {
            file: FileResponse::from(&entry.file),
            owner_name: entry.owner_name.clone(),
            owner_username: entry.owner_username.clone(),
        }
    }
}

/// Admin file listing query parameters
#[derive(Deserialize, Default)]
pub struct AdminFileListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, rename = "type")]
    pub type_prefix: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// Admin file listing response
#[derive(Serialize)]
pub struct AdminFileListResponse {
    pub files: Vec<AdminFileResponse>,
    pub pagination: Pagination,
}

/// Admin file delete request
#[derive(Deserialize)]
pub struct AdminDeleteFileRequest {
    pub file_id: String,
}
