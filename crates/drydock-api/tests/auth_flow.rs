//! Router-level authentication and authorization tests
//!
//! Drives the full router over an in-memory database: the access
//! middleware, the role guard, and the login/registration flows.

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use drydock_api::routes::create_router;
use drydock_api::state::AppState;
use drydock_auth::{TokenService, hash_password};
use drydock_db::{Database, NewUser, UserRole};
use drydock_mail::{Mailer, MailerConfig};
use drydock_storage::LocalStorage;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::util::ServiceExt;

struct TestApp {
    router: Router,
    db: Database,
    _storage_dir: tempfile::TempDir,
}

async fn spawn_app() -> TestApp {
    let storage_dir = tempfile::tempdir().unwrap();
    let db_url = format!(
        "sqlite:{}?mode=rwc",
        storage_dir.path().join("test.db").display()
    );
    let db = Database::new(&db_url).await.unwrap();
    let storage = Arc::new(
        LocalStorage::new(storage_dir.path(), "http://localhost:8080/files")
            .await
            .unwrap(),
    );
    let tokens = Arc::new(TokenService::new("integration-test-secret", 24 * 7));
    let mailer = Arc::new(
        Mailer::new(MailerConfig {
            api_base: "http://localhost:9".to_string(),
            api_key: String::new(),
            from: "Drydock <no-reply@test>".to_string(),
            enabled: false,
        })
        .unwrap(),
    );

    let state = AppState::new(
        db.clone(),
        storage,
        tokens,
        mailer,
        false,
        "http://localhost:8080".to_string(),
    );

    TestApp {
        router: create_router(state, None),
        db,
        _storage_dir: storage_dir,
    }
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Pull the `auth-token=...` pair out of a Set-Cookie header
fn session_cookie(response: &axum::response::Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

async fn seed_user(db: &Database, username: &str, password: &str, role: UserRole) -> i64 {
    db.insert_user(NewUser {
        username: username.to_string(),
        name: format!("{} name", username),
        password_hash: hash_password(password).unwrap(),
        role,
    })
    .await
    .unwrap()
    .id
}

#[tokio::test]
async fn register_sets_session_and_rejects_duplicates() {
    let app = spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/auth/register",
            json!({"name": "Alice", "username": "alice", "password": "correcthorse"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response).expect("registration sets the session cookie");
    assert!(cookie.starts_with("auth-token="));

    let body = body_json(response).await;
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["role"], "CUSTOMER");
    assert!(body["user"]["password_hash"].is_null());

    // Same username again: rejected, no session issued
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/auth/register",
            json!({"name": "Mallory", "username": "alice", "password": "correcthorse"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(session_cookie(&response).is_none());
    assert_eq!(app.db.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn login_issues_token_for_valid_credentials() {
    let app = spawn_app().await;
    seed_user(&app.db, "alice", "correct", UserRole::Customer).await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/auth/login",
            json!({"username": "alice", "password": "correct"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response).unwrap();
    let body = body_json(response).await;
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["role"], "CUSTOMER");

    // The session works against a protected route
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["username"], "alice");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = spawn_app().await;
    seed_user(&app.db, "alice", "correct", UserRole::Customer).await;

    // Wrong password
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/auth/login",
            json!({"username": "alice", "password": "wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let wrong_password = body_json(response).await;

    // Unknown username: same status, same body
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/auth/login",
            json!({"username": "nobody", "password": "wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let unknown_user = body_json(response).await;

    assert_eq!(wrong_password, unknown_user);
}

#[tokio::test]
async fn disabled_account_is_rejected_before_password_check() {
    let app = spawn_app().await;
    let id = seed_user(&app.db, "bob", "correct", UserRole::Customer).await;
    app.db.update_user_active(id, false).await.unwrap();

    // Correct password, disabled account
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/auth/login",
            json!({"username": "bob", "password": "correct"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(session_cookie(&response).is_none());
    let body = body_json(response).await;
    assert_eq!(body["error"], "Account is deactivated");
}

#[tokio::test]
async fn protected_routes_reject_missing_and_stale_tokens() {
    let app = spawn_app().await;

    // No token: API path gets 401
    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/files"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // No token: page path redirects to the login page
    let response = app
        .router
        .clone()
        .oneshot(get_request("/dashboard"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/login"
    );

    // Garbage token: rejected, and the dead cookie is cleared
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/files")
                .header(header::COOKIE, "auth-token=not-a-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let cleared = session_cookie(&response).unwrap();
    assert_eq!(cleared, "auth-token=");
}

#[tokio::test]
async fn allow_listed_paths_require_no_token() {
    let app = spawn_app().await;

    // The login route answers without any session (bad credentials, not 401
    // from the middleware rejecting the request shape)
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/auth/login",
            json!({"username": "ghost", "password": "whatever"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid credentials");

    let response = app
        .router
        .clone()
        .oneshot(get_request("/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Public pages are served, not redirected
    let response = app
        .router
        .clone()
        .oneshot(get_request("/login"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn role_guard_blocks_non_admins() {
    let app = spawn_app().await;
    seed_user(&app.db, "alice", "correct", UserRole::Customer).await;
    seed_user(&app.db, "root", "rootpass", UserRole::Admin).await;

    let login = |username: &str, password: &str| {
        json_request(
            Method::POST,
            "/api/auth/login",
            json!({"username": username, "password": password}),
        )
    };

    let response = app
        .router
        .clone()
        .oneshot(login("alice", "correct"))
        .await
        .unwrap();
    let customer_cookie = session_cookie(&response).unwrap();

    let response = app
        .router
        .clone()
        .oneshot(login("root", "rootpass"))
        .await
        .unwrap();
    let admin_cookie = session_cookie(&response).unwrap();

    // Customer hits the role guard
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/admin/users")
                .header(header::COOKIE, customer_cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin passes it
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/admin/users")
                .header(header::COOKIE, admin_cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["stats"]["total_users"], 2);
}

#[tokio::test]
async fn logout_clears_the_session_cookie() {
    let app = spawn_app().await;
    seed_user(&app.db, "alice", "correct", UserRole::Customer).await;

    let response = app
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/auth/login",
            json!({"username": "alice", "password": "correct"}),
        ))
        .await
        .unwrap();
    let cookie = session_cookie(&response).unwrap();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/auth/logout")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    // Removal cookie: empty value
    assert_eq!(session_cookie(&response).unwrap(), "auth-token=");

    // A request without the cookie is back to unauthenticated
    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/auth/me"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn marketplace_bearer_transport() {
    let app = spawn_app().await;
    seed_user(&app.db, "mech@example.com", "secret66", UserRole::Mechanic).await;

    // Bearer-gated route without a token
    let response = app
        .router
        .clone()
        .oneshot(get_request("/api/v1/states"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // validatelogin is allow-listed and returns a short-lived token
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/validatelogin",
            json!({"email": "mech@example.com", "password": "secret66"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["expires_in"], 3600);
    assert_eq!(body["user"]["role"], "MECHANIC");
    let token = body["token"].as_str().unwrap().to_string();

    // The token opens the gated routes
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/states")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A non-bearer scheme is rejected
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/states")
                .header(header::AUTHORIZATION, format!("Token {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn provider_sign_up_flow() {
    let app = spawn_app().await;

    let sign_up_body = json!({
        "name": "John Doe",
        "email": "john@example.com",
        "password": "secret66",
        "phone": "+1 555 0100",
        "address": "1 Pier Rd",
        "state_id": 1,
        "city_id": 1,
        "service_distance": 25.0,
        "latitude": 37.5,
        "longitude": -122.3
    });

    // Sign-up is allow-listed
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/providers/sign-up",
            sign_up_body.clone(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], "john@example.com");

    // The provider can immediately log in with the email as username
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/validatelogin",
            json!({"email": "john@example.com", "password": "secret66"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Duplicate sign-up is rejected
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/providers/sign-up",
            sign_up_body,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // A wrong verification code is rejected
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/providers/verify-otp",
            json!({"email": "john@example.com", "otp": "000000"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid OTP");

    // Bad coordinates are rejected up front
    let response = app
        .router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/providers/sign-up",
            json!({
                "name": "Jane", "email": "jane@example.com", "password": "secret66",
                "phone": "+1 555 0101", "address": "2 Pier Rd", "state_id": 1,
                "city_id": 1, "service_distance": 10.0, "latitude": 95.0,
                "longitude": 0.0
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
