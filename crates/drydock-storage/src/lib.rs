//! Drydock Storage Layer
//!
//! This crate provides object storage abstraction for Drydock,
//! supporting local disk and S3-compatible backends.

pub mod backend;
pub mod error;
pub mod local;
pub mod s3;

pub use backend::StorageBackend;
pub use error::StorageError;
pub use local::LocalStorage;
pub use s3::{S3Config, S3Storage};
