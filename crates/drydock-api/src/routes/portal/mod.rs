//! File-storage portal API routes
//!
//! Session-cookie authenticated: registration, login, file upload and
//! listing, and the admin overview.

pub mod admin;
pub mod auth;
pub mod files;
pub mod types;

use axum::Router;

use crate::state::AppState;

// Re-export commonly used types for external use
#[allow(unused_imports)]
pub use auth::{RequireAdmin, RequireAuth};

/// Create portal API routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::routes())
        .merge(files::routes())
        .merge(admin::routes())
}
