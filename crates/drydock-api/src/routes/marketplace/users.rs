//! Marketplace user management routes

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use drydock_auth::hash_password;
use drydock_db::{NewUser, UserRole};
use tracing::info;

use crate::error::ApiError;
use crate::routes::portal::auth::{RequireAdmin, validate_password, validate_username};
use crate::state::AppState;

use super::types::{CreateUserRequest, UserResponse};

/// POST /api/v1/users (Admin only)
///
/// The only route that can mint further administrator accounts.
async fn create_user(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    validate_username(&request.username)?;
    validate_password(&request.password)?;
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name cannot be empty".to_string()));
    }
    if request.role != UserRole::Admin.as_str() {
        return Err(ApiError::BadRequest(
            "Only the ADMIN role can be assigned".to_string(),
        ));
    }

    if state
        .db
        .get_user_by_username(&request.username)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }

    let password_hash = hash_password(&request.password)?;

    let user = state
        .db
        .insert_user(NewUser {
            username: request.username,
            name: request.name,
            password_hash,
            role: UserRole::Admin,
        })
        .await?;

    info!("Created administrator: {}", user.username);

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// Create user routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/v1/users", post(create_user))
}
