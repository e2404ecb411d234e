//! Drydock REST API
//!
//! This crate provides the Axum-based HTTP API for Drydock,
//! implementing the file-storage portal API and the mechanic
//! marketplace API.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, MetricsHandle};
