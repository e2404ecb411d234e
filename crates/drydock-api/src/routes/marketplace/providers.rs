//! Provider onboarding and management routes

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use drydock_auth::{hash_password, otp};
use drydock_db::{NewProvider, NewUser, Provider, UserRole};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::portal::auth::RequireAuth;
use crate::state::AppState;

use super::types::{
    DocumentsResponse, ForgotPasswordRequest, MessageResponse, ProviderMeQuery,
    ProviderSignUpData, ProviderSignUpRequest, ProviderSignUpResponse, ProvidersResponse,
    ResetPasswordRequest, VerifyOtpRequest,
};

/// Minimum provider password length
const MIN_PASSWORD_LENGTH: usize = 6;

// ==================== Input Validation ====================

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !email.chars().any(char::is_whitespace)
}

fn is_valid_phone(phone: &str) -> bool {
    !phone.is_empty()
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-' | '(' | ')'))
}

fn validate_sign_up(request: &ProviderSignUpRequest) -> Result<(), ApiError> {
    let missing: Vec<&str> = [
        ("name", request.name.is_empty()),
        ("email", request.email.is_empty()),
        ("password", request.password.is_empty()),
        ("phone", request.phone.is_empty()),
        ("address", request.address.is_empty()),
    ]
    .iter()
    .filter(|(_, empty)| *empty)
    .map(|(field, _)| *field)
    .collect();

    if !missing.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }
    if !is_valid_email(&request.email) {
        return Err(ApiError::BadRequest("Invalid email format".to_string()));
    }
    if !is_valid_phone(&request.phone) {
        return Err(ApiError::BadRequest("Invalid phone format".to_string()));
    }
    if request.password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    if !(-90.0..=90.0).contains(&request.latitude) {
        return Err(ApiError::BadRequest("Invalid latitude value".to_string()));
    }
    if !(-180.0..=180.0).contains(&request.longitude) {
        return Err(ApiError::BadRequest("Invalid longitude value".to_string()));
    }
    if request.service_distance <= 0.0 {
        return Err(ApiError::BadRequest(
            "Service distance must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

/// Check a submitted code against the provider's pending digest
fn check_pending_code(provider: &Provider, code: &str) -> Result<(), ApiError> {
    let (Some(digest), Some(sent_at)) = (&provider.otp_hash, provider.otp_sent_at) else {
        return Err(ApiError::BadRequest(
            "No pending verification code".to_string(),
        ));
    };
    if otp::is_expired(sent_at, Utc::now()) {
        return Err(ApiError::BadRequest("OTP has expired".to_string()));
    }
    if !otp::code_matches(code, digest) {
        return Err(ApiError::BadRequest("Invalid OTP".to_string()));
    }
    Ok(())
}

// ==================== Provider Routes ====================

/// POST /api/v1/providers/sign-up
async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<ProviderSignUpRequest>,
) -> Result<(StatusCode, Json<ProviderSignUpResponse>), ApiError> {
    validate_sign_up(&request)?;

    debug!("Provider sign-up attempt: {}", request.email);

    if state
        .db
        .get_provider_by_email(&request.email)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(
            "Provider with this email already exists".to_string(),
        ));
    }

    let code = otp::generate_code();
    let password_hash = hash_password(&request.password)?;

    let (user, provider) = state
        .db
        .insert_provider_with_user(
            NewUser {
                username: request.email.clone(),
                name: request.name.clone(),
                password_hash,
                role: UserRole::Mechanic,
            },
            NewProvider {
                name: request.name,
                email: request.email,
                phone: request.phone,
                address: request.address,
                state_id: request.state_id,
                city_id: request.city_id,
                service_distance: request.service_distance,
                latitude: request.latitude,
                longitude: request.longitude,
                otp_hash: otp::code_digest(&code),
                otp_sent_at: Utc::now(),
            },
        )
        .await?;

    state
        .mailer
        .send_otp_email(&provider.email, &provider.name, &code)
        .await?;

    info!("Registered provider {} (user {})", provider.email, user.id);

    Ok((
        StatusCode::CREATED,
        Json(ProviderSignUpResponse {
            success: true,
            message: "Registration successful! Please check your email for OTP verification."
                .to_string(),
            data: ProviderSignUpData {
                id: provider.id,
                email: provider.email,
                name: provider.name,
            },
        }),
    ))
}

/// POST /api/v1/providers/verify-otp
async fn verify_otp(
    State(state): State<AppState>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if request.email.is_empty() || request.otp.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and OTP are required".to_string(),
        ));
    }

    let provider = state
        .db
        .get_provider_by_email(&request.email)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Provider not found".to_string()))?;

    check_pending_code(&provider, &request.otp)?;

    state.db.mark_provider_verified(provider.id).await?;

    info!("Provider {} verified their email", provider.email);

    Ok(Json(MessageResponse {
        success: true,
        message: "Email verified successfully".to_string(),
    }))
}

/// POST /api/v1/providers/forgot-password
async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if request.email.is_empty() {
        return Err(ApiError::BadRequest("Email is required".to_string()));
    }

    let provider = state
        .db
        .get_provider_by_email(&request.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let code = otp::generate_code();
    state
        .db
        .set_provider_otp(&provider.email, &otp::code_digest(&code), Utc::now())
        .await?;

    let reset_link = format!(
        "{}/mechanic/reset-password?email={}&otp={}",
        state.app_base_url, provider.email, code
    );
    state
        .mailer
        .send_password_reset_email(&provider.email, &provider.name, &reset_link)
        .await?;

    info!("Password reset requested for {}", provider.email);

    Ok(Json(MessageResponse {
        success: true,
        message: "Password reset email sent successfully".to_string(),
    }))
}

/// POST /api/v1/providers/reset-password
async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if request.email.is_empty() || request.otp.is_empty() || request.new_password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email, OTP, and new password are required".to_string(),
        ));
    }
    if request.new_password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }

    let provider = state
        .db
        .get_provider_by_email(&request.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    check_pending_code(&provider, &request.otp)?;

    let password_hash = hash_password(&request.new_password)?;
    state
        .db
        .update_user_password(provider.user_id, &password_hash)
        .await?;
    state.db.clear_provider_otp(provider.id).await?;

    info!("Provider {} reset their password", provider.email);

    Ok(Json(MessageResponse {
        success: true,
        message: "Password reset successfully".to_string(),
    }))
}

/// GET /api/v1/providers
async fn list_providers(
    _auth: RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<ProvidersResponse>, ApiError> {
    let providers = state.db.list_providers().await?;
    Ok(Json(ProvidersResponse { providers }))
}

/// GET /api/v1/providers/me?email=
async fn provider_me(
    _auth: RequireAuth,
    State(state): State<AppState>,
    Query(query): Query<ProviderMeQuery>,
) -> Result<Json<drydock_db::ProviderSummary>, ApiError> {
    let email = query
        .email
        .ok_or_else(|| ApiError::BadRequest("Provider email is required".to_string()))?;

    let provider = state
        .db
        .get_provider_summary_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::NotFound("Provider not found".to_string()))?;

    Ok(Json(provider))
}

/// POST /api/v1/providers/{id}/documents
async fn upload_documents(
    RequireAuth(user): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<DocumentsResponse>, ApiError> {
    let provider = state
        .db
        .get_provider_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Provider not found".to_string()))?;

    // Only the provider's own account or an admin may attach documents
    if provider.user_id != user.id && !user.role.is_admin() {
        return Err(ApiError::Forbidden);
    }

    let mut keys = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("documents") {
            continue;
        }

        let file_name = field
            .file_name()
            .map(|n| {
                std::path::Path::new(n)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("document")
                    .to_string()
            })
            .unwrap_or_else(|| "document".to_string());
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;

        let key = format!("documents/{}/{}-{}", provider.id, Uuid::new_v4(), file_name);
        if let Err(e) = state.storage.put(&key, data, &content_type).await {
            warn!("Failed to store document {}: {}", key, e);
            return Err(e.into());
        }
        keys.push(key);
    }

    if keys.is_empty() {
        return Err(ApiError::BadRequest("No files uploaded".to_string()));
    }

    let mut documents = provider.documents.clone();
    documents.extend(keys.clone());
    state
        .db
        .update_provider_documents(provider.id, &documents)
        .await?;

    info!(
        "Stored {} document(s) for provider {}",
        keys.len(),
        provider.email
    );

    Ok(Json(DocumentsResponse {
        success: true,
        files: keys,
    }))
}

/// Create provider routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/providers", get(list_providers))
        .route("/api/v1/providers/sign-up", post(sign_up))
        .route("/api/v1/providers/verify-otp", post(verify_otp))
        .route("/api/v1/providers/forgot-password", post(forgot_password))
        .route("/api/v1/providers/reset-password", post(reset_password))
        .route("/api/v1/providers/me", get(provider_me))
        .route("/api/v1/providers/{id}/documents", post(upload_documents))
}
