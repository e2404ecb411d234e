//! Mechanic marketplace API routes
//!
//! Bearer-token authenticated: provider onboarding with email
//! verification, password reset, geography lookups and admin user
//! creation.

pub mod auth;
pub mod geo;
pub mod providers;
pub mod types;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Create marketplace API routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::routes())
        .merge(providers::routes())
        .merge(geo::routes())
        .merge(users::routes())
}
