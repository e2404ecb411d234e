//! Marketplace authentication routes

use axum::{Json, Router, extract::State, routing::post};
use chrono::Duration;
use drydock_auth::{AuthError, DUMMY_PASSWORD_HASH, verify_password};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{MarketplaceLoginRequest, MarketplaceLoginResponse, UserResponse};

/// Marketplace tokens are short-lived compared to portal sessions
const TOKEN_TTL_HOURS: i64 = 1;

/// POST /api/v1/validatelogin
async fn validate_login(
    State(state): State<AppState>,
    Json(request): Json<MarketplaceLoginRequest>,
) -> Result<Json<MarketplaceLoginResponse>, ApiError> {
    if request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    debug!("Marketplace login attempt for: {}", request.email);

    // Provider accounts use the email address as their username
    let user = state.db.get_user_by_username(&request.email).await?;

    // A deactivated account is rejected before the password is checked
    if let Some(user) = &user
        && !user.is_active
    {
        return Err(AuthError::AccountDisabled.into());
    }

    let (hash_to_verify, user) = match user {
        Some(u) => (u.password_hash.clone(), Some(u)),
        None => (DUMMY_PASSWORD_HASH.to_string(), None),
    };

    let password_valid = verify_password(&request.password, &hash_to_verify)?;

    let user = match (user, password_valid) {
        (Some(u), true) => u,
        _ => return Err(AuthError::InvalidCredentials.into()),
    };

    let token = state.tokens.issue_with_ttl(
        user.id,
        &user.username,
        Some(&user.name),
        user.role.as_str(),
        Duration::hours(TOKEN_TTL_HOURS),
    )?;

    metrics::counter!("drydock_logins_total").increment(1);
    info!("User {} logged in via marketplace", user.username);

    Ok(Json(MarketplaceLoginResponse {
        token,
        expires_in: TOKEN_TTL_HOURS * 3600,
        user: UserResponse::from(&user),
    }))
}

/// Create marketplace auth routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/v1/validatelogin", post(validate_login))
}
