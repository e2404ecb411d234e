//! Provider operations

use chrono::{DateTime, Utc};
use sqlx::Row;

use crate::error::DbError;
use crate::models::{NewProvider, NewUser, Provider, ProviderSummary, User};
use crate::repository::Database;

const PROVIDER_COLUMNS: &str = r#"
    providers.id, providers.user_id, providers.name, providers.email, providers.phone,
    providers.address, providers.state_id, providers.city_id, providers.service_distance,
    providers.latitude, providers.longitude, providers.documents, providers.verified,
    providers.otp_hash, providers.otp_sent_at, providers.created_at, providers.updated_at
"#;

impl Database {
    /// Create a provider together with its user account in one transaction
    pub async fn insert_provider_with_user(
        &self,
        user: NewUser,
        provider: NewProvider,
    ) -> Result<(User, Provider), DbError> {
        let now = Utc::now();

        let existing = self.get_provider_by_email(&provider.email).await?;
        if existing.is_some() {
            return Err(DbError::Duplicate(format!(
                "Provider '{}' already exists",
                provider.email
            )));
        }
        if self.get_user_by_username(&user.username).await?.is_some() {
            return Err(DbError::Duplicate(format!(
                "User '{}' already exists",
                user.username
            )));
        }

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO users (username, name, password_hash, role, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, 1, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&mut *tx)
        .await?;
        let user_id: i64 = row.get("id");

        let row = sqlx::query(
            r#"
            INSERT INTO providers (
                user_id, name, email, phone, address, state_id, city_id,
                service_distance, latitude, longitude, documents, verified,
                otp_hash, otp_sent_at, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, '[]', 0, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(&provider.name)
        .bind(&provider.email)
        .bind(&provider.phone)
        .bind(&provider.address)
        .bind(provider.state_id)
        .bind(provider.city_id)
        .bind(provider.service_distance)
        .bind(provider.latitude)
        .bind(provider.longitude)
        .bind(&provider.otp_hash)
        .bind(provider.otp_sent_at.to_rfc3339())
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .fetch_one(&mut *tx)
        .await?;
        let provider_id: i64 = row.get("id");

        tx.commit().await?;

        let created_user = User {
            id: user_id,
            username: user.username,
            name: user.name,
            password_hash: user.password_hash,
            role: user.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let created_provider = Provider {
            id: provider_id,
            user_id,
            name: provider.name,
            email: provider.email,
            phone: provider.phone,
            address: provider.address,
            state_id: provider.state_id,
            city_id: provider.city_id,
            service_distance: provider.service_distance,
            latitude: provider.latitude,
            longitude: provider.longitude,
            documents: Vec::new(),
            verified: false,
            otp_hash: Some(provider.otp_hash),
            otp_sent_at: Some(provider.otp_sent_at),
            created_at: now,
            updated_at: now,
        };

        Ok((created_user, created_provider))
    }

    /// Get a provider by email
    pub async fn get_provider_by_email(&self, email: &str) -> Result<Option<Provider>, DbError> {
        let sql = format!(
            "SELECT {} FROM providers WHERE email = ?",
            PROVIDER_COLUMNS
        );
        let result = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        result
            .map(|row| Provider::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// Get a provider by ID
    pub async fn get_provider_by_id(&self, id: i64) -> Result<Option<Provider>, DbError> {
        let sql = format!("SELECT {} FROM providers WHERE id = ?", PROVIDER_COLUMNS);
        let result = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;

        result
            .map(|row| Provider::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// Get a provider by email with joined geography names
    pub async fn get_provider_summary_by_email(
        &self,
        email: &str,
    ) -> Result<Option<ProviderSummary>, DbError> {
        let sql = format!(
            r#"
            SELECT {}, states.name as state_name, cities.name as city_name
            FROM providers
            LEFT JOIN states ON states.id = providers.state_id
            LEFT JOIN cities ON cities.id = providers.city_id
            WHERE providers.email = ?
            "#,
            PROVIDER_COLUMNS
        );
        let result = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        result
            .map(|row| ProviderSummary::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// List all providers with joined geography names
    pub async fn list_providers(&self) -> Result<Vec<ProviderSummary>, DbError> {
        let sql = format!(
            r#"
            SELECT {}, states.name as state_name, cities.name as city_name
            FROM providers
            LEFT JOIN states ON states.id = providers.state_id
            LEFT JOIN cities ON cities.id = providers.city_id
            ORDER BY providers.created_at DESC
            "#,
            PROVIDER_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        rows.iter()
            .map(|row| ProviderSummary::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Store a fresh one-time code digest for a provider
    pub async fn set_provider_otp(
        &self,
        email: &str,
        otp_hash: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE providers
            SET otp_hash = ?, otp_sent_at = ?, updated_at = ?
            WHERE email = ?
            "#,
        )
        .bind(otp_hash)
        .bind(sent_at.to_rfc3339())
        .bind(now.to_rfc3339())
        .bind(email)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a provider verified and drop the pending code
    pub async fn mark_provider_verified(&self, id: i64) -> Result<bool, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE providers
            SET verified = 1, otp_hash = NULL, otp_sent_at = NULL, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Drop a provider's pending code without changing the verified flag
    pub async fn clear_provider_otp(&self, id: i64) -> Result<bool, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE providers
            SET otp_hash = NULL, otp_sent_at = NULL, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace a provider's document key list
    pub async fn update_provider_documents(
        &self,
        id: i64,
        documents: &[String],
    ) -> Result<bool, DbError> {
        let now = Utc::now();
        let serialized = serde_json::to_string(documents)
            .map_err(|e| DbError::Migration(format!("Document list encoding failed: {}", e)))?;
        let result = sqlx::query(
            r#"
            UPDATE providers
            SET documents = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(serialized)
        .bind(now.to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
