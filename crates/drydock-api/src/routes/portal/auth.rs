//! Portal authentication extractors and routes

use axum::{
    Json, Router,
    extract::{FromRequestParts, State},
    http::request::Parts,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use drydock_auth::{
    AUTH_COOKIE, AuthError, AuthUser, DUMMY_PASSWORD_HASH, hash_password, require_role,
    verify_password,
};
use drydock_db::{NewUser, UserRole};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{AuthResponse, LoginRequest, OkResponse, RegisterRequest, UserResponse};

/// How long a session cookie lives
const SESSION_COOKIE_DAYS: i64 = 7;

// ==================== Auth Extractors ====================

/// Extractor for the authenticated user (required).
///
/// The access middleware verifies the token and inserts the identity into
/// request extensions; this extractor only reads it back out, so a handler
/// can never observe an unverified identity.
pub struct RequireAuth(pub AuthUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(RequireAuth)
            .ok_or(ApiError::Unauthorized)
    }
}

/// Extractor for an admin user (required)
pub struct RequireAdmin(pub AuthUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        require_role(&user, &[UserRole::Admin])?;
        Ok(RequireAdmin(user))
    }
}

// ==================== Input Validation ====================

/// Maximum allowed username length
const MAX_USERNAME_LENGTH: usize = 64;
/// Maximum allowed password length (prevent DoS with very large passwords)
const MAX_PASSWORD_LENGTH: usize = 256;
/// Minimum allowed password length
const MIN_PASSWORD_LENGTH: usize = 8;

/// Validate username format and length
pub(crate) fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.is_empty() {
        return Err(ApiError::BadRequest("Username cannot be empty".to_string()));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Username exceeds maximum length of {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    // Allow alphanumeric characters plus the separators found in email-style
    // usernames
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '@'))
    {
        return Err(ApiError::BadRequest(
            "Username can only contain alphanumeric characters, '_', '-', '.' and '@'".to_string(),
        ));
    }
    Ok(())
}

/// Validate password length
pub(crate) fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

// ==================== Session Cookie ====================

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::days(SESSION_COOKIE_DAYS))
        .build()
}

// ==================== Auth Routes ====================

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name cannot be empty".to_string()));
    }
    validate_username(&request.username)?;
    validate_password(&request.password)?;

    debug!("Registration attempt for user: {}", request.username);

    if state
        .db
        .get_user_by_username(&request.username)
        .await?
        .is_some()
    {
        return Err(AuthError::DuplicateUsername.into());
    }

    let password_hash = hash_password(&request.password)?;

    // Self-registration never assigns a privileged role
    let user = state
        .db
        .insert_user(NewUser {
            username: request.username,
            name: request.name,
            password_hash,
            role: UserRole::Customer,
        })
        .await?;

    let token = state
        .tokens
        .issue(user.id, &user.username, Some(&user.name), user.role.as_str())?;

    info!("Registered user: {}", user.username);

    let jar = jar.add(session_cookie(token, state.cookie_secure));
    Ok((
        jar,
        Json(AuthResponse {
            success: true,
            user: UserResponse::from(&user),
        }),
    ))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    if request.username.is_empty() || request.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username and password are required".to_string(),
        ));
    }
    if request.password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }

    debug!("Login attempt for user: {}", request.username);

    let user = state.db.get_user_by_username(&request.username).await?;

    // A deactivated account is rejected before the password is checked
    if let Some(user) = &user
        && !user.is_active
    {
        return Err(AuthError::AccountDisabled.into());
    }

    // Verify against a dummy digest when the user doesn't exist, so the
    // unknown-username and wrong-password paths cost the same
    let (hash_to_verify, user) = match user {
        Some(u) => (u.password_hash.clone(), Some(u)),
        None => (DUMMY_PASSWORD_HASH.to_string(), None),
    };

    let password_valid = verify_password(&request.password, &hash_to_verify)?;

    let user = match (user, password_valid) {
        (Some(u), true) => u,
        _ => return Err(AuthError::InvalidCredentials.into()),
    };

    let token = state
        .tokens
        .issue(user.id, &user.username, Some(&user.name), user.role.as_str())?;

    metrics::counter!("drydock_logins_total").increment(1);
    info!("User {} logged in successfully", user.username);

    let jar = jar.add(session_cookie(token, state.cookie_secure));
    Ok((
        jar,
        Json(AuthResponse {
            success: true,
            user: UserResponse::from(&user),
        }),
    ))
}

/// GET /api/auth/me
async fn me(RequireAuth(user): RequireAuth) -> Json<AuthResponse> {
    Json(AuthResponse {
        success: true,
        user: UserResponse::from(&user),
    })
}

/// POST /api/auth/logout
async fn logout(jar: CookieJar) -> (CookieJar, Json<OkResponse>) {
    let jar = jar.remove(Cookie::build((AUTH_COOKIE, "")).path("/"));
    (jar, Json(OkResponse { success: true }))
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/auth/logout", post(logout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("john.doe@example.com").is_ok());
        assert!(validate_username("user_name-1").is_ok());

        assert!(validate_username("").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("long enough").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"x".repeat(257)).is_err());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("token-value".to_string(), true);
        assert_eq!(cookie.name(), AUTH_COOKIE);
        assert_eq!(cookie.value(), "token-value");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(7)));
    }
}
