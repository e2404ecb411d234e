//! Access middleware for Axum
//!
//! Gates every inbound request except an explicit allow-list. The portal
//! router carries the session token in an HTTP-only cookie; the marketplace
//! router carries it in an `Authorization: Bearer` header. Both run the same
//! sequence: allow-list check, token extraction, verification, then identity
//! injection — no handler ever runs with an unverified identity.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use drydock_db::UserRole;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::AuthError;
use crate::jwt::{Claims, TokenService};

/// Name of the portal session cookie
pub const AUTH_COOKIE: &str = "auth-token";

/// Portal paths reachable without a session
const PORTAL_ALLOW_LIST: &[&str] = &[
    "/api/auth/login",
    "/api/auth/register",
    "/health",
    "/healthz",
    "/metrics",
];

/// Marketplace paths reachable without a bearer token
const MARKETPLACE_ALLOW_LIST: &[&str] = &[
    "/api/v1/validatelogin",
    "/api/v1/providers/sign-up",
    "/api/v1/providers/verify-otp",
    "/api/v1/providers/forgot-password",
    "/api/v1/providers/reset-password",
];

/// Authenticated user information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub name: Option<String>,
    pub role: UserRole,
}

impl AuthUser {
    /// Create from verified token claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            id: claims.sub.parse().unwrap_or(0),
            username: claims.username.clone(),
            name: claims.name.clone(),
            role: claims.role.parse().unwrap_or(UserRole::Customer),
        }
    }
}

/// Role guard: fail unless the authenticated role is in the allowed set
pub fn require_role(user: &AuthUser, allowed: &[UserRole]) -> Result<(), AuthError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(AuthError::InsufficientRole)
    }
}

/// Extract bearer token from an authorization header value
fn extract_bearer_token(header: &str) -> Result<&str, AuthError> {
    if !header.starts_with("Bearer ") {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(&header[7..])
}

/// Whether a portal request may pass without a session.
///
/// The marketplace prefix is public here because the bearer middleware owns
/// it; everything else outside the portal API and the dashboard pages is a
/// static asset or a public page.
fn portal_path_is_public(path: &str) -> bool {
    if PORTAL_ALLOW_LIST.contains(&path) {
        return true;
    }
    if path.starts_with("/api/v1/") {
        return true;
    }
    !(path.starts_with("/api/") || path.starts_with("/dashboard"))
}

/// Portal authentication middleware (cookie transport).
///
/// On success the resolved identity is added to request extensions. On
/// failure, API paths get a 401 JSON body and page paths are redirected to
/// the login page; a stale cookie is removed either way so the client does
/// not keep replaying a dead token.
pub async fn portal_auth_middleware(
    State(tokens): State<Arc<TokenService>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if portal_path_is_public(&path) {
        return next.run(request).await;
    }

    let Some(token) = jar.get(AUTH_COOKIE).map(|c| c.value().to_string()) else {
        return reject_portal(&path, jar, AuthError::MissingCredentials);
    };

    match tokens.verify(&token) {
        Ok(claims) => {
            let user = AuthUser::from_claims(&claims);
            debug!(
                "Authenticated user: {} ({})",
                user.username,
                user.role.as_str()
            );
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => reject_portal(&path, jar, err),
    }
}

fn reject_portal(path: &str, jar: CookieJar, err: AuthError) -> Response {
    let jar = match err {
        // Stale credential: delete it along with the rejection
        AuthError::InvalidToken => jar.remove(Cookie::build((AUTH_COOKIE, "")).path("/")),
        _ => jar,
    };

    if path.starts_with("/api/") {
        (jar, err).into_response()
    } else {
        (jar, Redirect::to("/login")).into_response()
    }
}

/// Marketplace authentication middleware (bearer transport)
pub async fn bearer_auth_middleware(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();

    if MARKETPLACE_ALLOW_LIST.contains(&path) {
        return next.run(request).await;
    }

    let Some(header) = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
    else {
        return AuthError::MissingCredentials.into_response();
    };

    match extract_bearer_token(&header).and_then(|token| tokens.verify(token)) {
        Ok(claims) => {
            let user = AuthUser::from_claims(&claims);
            debug!(
                "Authenticated user: {} ({})",
                user.username,
                user.role.as_str()
            );
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> AuthUser {
        AuthUser {
            id: 1,
            username: "alice".to_string(),
            name: None,
            role,
        }
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc").unwrap(), "abc");
        assert!(matches!(
            extract_bearer_token("Basic abc"),
            Err(AuthError::InvalidAuthHeader)
        ));
        assert!(matches!(
            extract_bearer_token("abc"),
            Err(AuthError::InvalidAuthHeader)
        ));
    }

    #[test]
    fn test_portal_allow_list() {
        assert!(portal_path_is_public("/api/auth/login"));
        assert!(portal_path_is_public("/api/auth/register"));
        assert!(portal_path_is_public("/health"));
        assert!(portal_path_is_public("/login"));
        assert!(portal_path_is_public("/assets/app.js"));
        // Marketplace paths belong to the bearer middleware
        assert!(portal_path_is_public("/api/v1/providers"));

        assert!(!portal_path_is_public("/api/files"));
        assert!(!portal_path_is_public("/api/auth/me"));
        assert!(!portal_path_is_public("/dashboard"));
        assert!(!portal_path_is_public("/dashboard/upload"));
    }

    #[test]
    fn test_require_role() {
        assert!(require_role(&user(UserRole::Admin), &[UserRole::Admin]).is_ok());
        assert!(
            require_role(
                &user(UserRole::Mechanic),
                &[UserRole::Admin, UserRole::Mechanic]
            )
            .is_ok()
        );
        assert!(matches!(
            require_role(&user(UserRole::Customer), &[UserRole::Admin]),
            Err(AuthError::InsufficientRole)
        ));
    }

    #[test]
    fn test_auth_user_from_claims() {
        let claims = Claims {
            sub: "42".to_string(),
            username: "bob".to_string(),
            name: Some("Bob".to_string()),
            role: "MECHANIC".to_string(),
            exp: 0,
            iat: 0,
        };
        let user = AuthUser::from_claims(&claims);
        assert_eq!(user.id, 42);
        assert_eq!(user.role, UserRole::Mechanic);

        // Unknown roles fall back to the least-privileged one
        let claims = Claims {
            role: "SUPERUSER".to_string(),
            ..claims
        };
        assert_eq!(AuthUser::from_claims(&claims).role, UserRole::Customer);
    }
}
