//! Request/Response DTOs for the marketplace API

use drydock_db::ProviderSummary;
use serde::{Deserialize, Serialize};

pub use crate::routes::portal::types::UserResponse;

// ==================== Auth Types ====================

/// Marketplace login request
#[derive(Deserialize)]
pub struct MarketplaceLoginRequest {
    pub email: String,
    pub password: String,
}

/// Marketplace login response
#[derive(Serialize)]
pub struct MarketplaceLoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: UserResponse,
}

// ==================== Provider Types ====================

/// Provider sign-up request
#[derive(Deserialize)]
pub struct ProviderSignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub address: String,
    pub state_id: i64,
    pub city_id: i64,
    pub service_distance: f64,
    pub latitude: f64,
    pub longitude: f64,
}

/// Identity echoed back after sign-up
#[derive(Serialize)]
pub struct ProviderSignUpData {
    pub id: i64,
    pub email: String,
    pub name: String,
}

/// Provider sign-up response
#[derive(Serialize)]
pub struct ProviderSignUpResponse {
    pub success: bool,
    pub message: String,
    pub data: ProviderSignUpData,
}

/// OTP verification request
#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

/// Forgot password request
#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Password reset request
#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub new_password: String,
}

/// Generic acknowledgement with message
#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// Provider listing response
#[derive(Serialize)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderSummary>,
}

/// Provider detail query parameters
#[derive(Deserialize, Default)]
pub struct ProviderMeQuery {
    #[serde(default)]
    pub email: Option<String>,
}

/// Document upload response
#[derive(Serialize)]
pub struct DocumentsResponse {
    pub success: bool,
    pub files: Vec<String>,
}

// ==================== User Types ====================

/// Administrator creation request
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub name: String,
    pub password: String,
    pub role: String,
}

// ==================== Geography Types ====================

/// City listing query parameters
#[derive(Deserialize, Default)]
pub struct CitiesQuery {
    #[serde(default)]
    pub state_id: Option<i64>,
}
