//! Drydock Authentication and Authorization
//!
//! This crate provides JWT session tokens, password hashing, one-time
//! codes and the request-gating middleware shared by the portal and
//! marketplace routers.

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod otp;
pub mod password;

pub use error::AuthError;
pub use jwt::{Claims, TokenService};
pub use middleware::{
    AUTH_COOKIE, AuthUser, bearer_auth_middleware, portal_auth_middleware, require_role,
};
pub use password::{DUMMY_PASSWORD_HASH, hash_password, verify_password};
