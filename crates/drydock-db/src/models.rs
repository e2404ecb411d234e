//! Database models

use crate::utils::parse_datetime_or_now;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::fmt;
use std::str::FromStr;

/// Error type for parsing models from strings
#[derive(Debug, Clone)]
pub enum ParseError {
    InvalidUserRole(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidUserRole(s) => write!(f, "Invalid user role: {}", s),
        }
    }
}

impl std::error::Error for ParseError {}

/// User role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Customer,
    Mechanic,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Customer => "CUSTOMER",
            UserRole::Mechanic => "MECHANIC",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl FromStr for UserRole {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(UserRole::Admin),
            "CUSTOMER" => Ok(UserRole::Customer),
            "MECHANIC" => Ok(UserRole::Mechanic),
            _ => Err(ParseError::InvalidUserRole(s.to_string())),
        }
    }
}

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user (for insertion)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub name: String,
    pub password_hash: String,
    pub role: UserRole,
}

/// Stored file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: String,
    pub user_id: i64,
    pub file_name: String,
    pub file_key: String,
    pub file_url: String,
    pub file_type: String,
    pub file_size: i64,
    pub created_at: DateTime<Utc>,
}

/// New stored file (for insertion)
#[derive(Debug, Clone)]
pub struct NewStoredFile {
    pub id: String,
    pub user_id: i64,
    pub file_name: String,
    pub file_key: String,
    pub file_url: String,
    pub file_type: String,
    pub file_size: i64,
}

/// Stored file joined with its owner's identity (admin listings)
#[derive(Debug, Clone, Serialize)]
pub struct FileWithOwner {
    #[serde(flatten)]
    pub file: StoredFile,
    pub owner_name: String,
    pub owner_username: String,
}

/// Service provider model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub state_id: i64,
    pub city_id: i64,
    pub service_distance: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Storage keys of uploaded verification documents
    pub documents: Vec<String>,
    pub verified: bool,
    /// Digest of the pending one-time code, never the code itself
    #[serde(skip_serializing)]
    pub otp_hash: Option<String>,
    #[serde(skip_serializing)]
    pub otp_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New provider (for insertion alongside its user account)
#[derive(Debug, Clone)]
pub struct NewProvider {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub state_id: i64,
    pub city_id: i64,
    pub service_distance: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub otp_hash: String,
    pub otp_sent_at: DateTime<Utc>,
}

/// Provider joined with its geography names (listings and detail views)
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSummary {
    #[serde(flatten)]
    pub provider: Provider,
    pub state_name: Option<String>,
    pub city_name: Option<String>,
}

/// Geographic state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct State {
    pub id: i64,
    pub name: String,
    pub code: String,
}

/// New state (for insertion)
#[derive(Debug, Clone, Deserialize)]
pub struct NewState {
    pub name: String,
    pub code: String,
}

/// City within a state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    pub id: i64,
    pub state_id: i64,
    pub name: String,
}

/// New city (for insertion)
#[derive(Debug, Clone, Deserialize)]
pub struct NewCity {
    pub state_id: i64,
    pub name: String,
}

// ==================== TryFrom Implementations ====================

impl TryFrom<&sqlx::sqlite::SqliteRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let role_str: String = row.try_get("role")?;
        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            name: row.try_get("name")?,
            password_hash: row.try_get("password_hash")?,
            role: UserRole::from_str(&role_str).unwrap_or(UserRole::Customer),
            is_active: row.try_get("is_active")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for StoredFile {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(StoredFile {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            file_name: row.try_get("file_name")?,
            file_key: row.try_get("file_key")?,
            file_url: row.try_get("file_url")?,
            file_type: row.try_get("file_type")?,
            file_size: row.try_get("file_size")?,
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for FileWithOwner {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(FileWithOwner {
            file: StoredFile::try_from(row)?,
            owner_name: row.try_get("owner_name")?,
            owner_username: row.try_get("owner_username")?,
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for Provider {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        let documents: String = row.try_get("documents")?;
        Ok(Provider {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
            state_id: row.try_get("state_id")?,
            city_id: row.try_get("city_id")?,
            service_distance: row.try_get("service_distance")?,
            latitude: row.try_get("latitude")?,
            longitude: row.try_get("longitude")?,
            documents: serde_json::from_str(&documents).unwrap_or_default(),
            verified: row.try_get("verified")?,
            otp_hash: row.try_get("otp_hash")?,
            otp_sent_at: row
                .try_get::<Option<String>, _>("otp_sent_at")?
                .map(|s| parse_datetime_or_now(&s)),
            created_at: parse_datetime_or_now(&row.try_get::<String, _>("created_at")?),
            updated_at: parse_datetime_or_now(&row.try_get::<String, _>("updated_at")?),
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for ProviderSummary {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(ProviderSummary {
            provider: Provider::try_from(row)?,
            state_name: row.try_get("state_name")?,
            city_name: row.try_get("city_name")?,
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for State {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(State {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            code: row.try_get("code")?,
        })
    }
}

impl TryFrom<&sqlx::sqlite::SqliteRow> for City {
    type Error = sqlx::Error;

    fn try_from(row: &sqlx::sqlite::SqliteRow) -> Result<Self, Self::Error> {
        Ok(City {
            id: row.try_get("id")?,
            state_id: row.try_get("state_id")?,
            name: row.try_get("name")?,
        })
    }
}
