//! Drydock Transactional Email
//!
//! This crate provides the client for the outbound email HTTP API,
//! used for provider verification codes and password reset links.

pub mod client;
pub mod error;

pub use client::{Mailer, MailerConfig};
pub use error::MailError;
