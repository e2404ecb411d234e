//! Drydock Database Layer
//!
//! This crate provides the database abstraction layer for Drydock,
//! using SQLite via sqlx for persistence.

pub mod error;
pub mod models;
pub mod repository;
pub mod utils;

pub use error::DbError;
pub use models::*;
pub use repository::{Database, FileQuery, FileStats};

/// Re-export sqlx types for convenience
pub use sqlx::SqlitePool;
