//! State and city operations

use sqlx::Row;

use crate::error::DbError;
use crate::models::{City, NewCity, NewState, State};
use crate::repository::Database;

impl Database {
    /// List all states
    pub async fn list_states(&self) -> Result<Vec<State>, DbError> {
        let rows = sqlx::query("SELECT id, name, code FROM states ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| State::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Get a state by ID
    pub async fn get_state_by_id(&self, id: i64) -> Result<Option<State>, DbError> {
        let result = sqlx::query("SELECT id, name, code FROM states WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        result
            .map(|row| State::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// Insert a new state
    pub async fn insert_state(&self, state: NewState) -> Result<State, DbError> {
        let existing = sqlx::query("SELECT id FROM states WHERE code = ?")
            .bind(&state.code)
            .fetch_optional(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(DbError::Duplicate(format!(
                "State '{}' already exists",
                state.code
            )));
        }

        let row = sqlx::query(
            r#"
            INSERT INTO states (name, code)
            VALUES (?, ?)
            RETURNING id
            "#,
        )
        .bind(&state.name)
        .bind(&state.code)
        .fetch_one(&self.pool)
        .await?;

        Ok(State {
            id: row.get("id"),
            name: state.name,
            code: state.code,
        })
    }

    /// List all cities
    pub async fn list_cities(&self) -> Result<Vec<City>, DbError> {
        let rows = sqlx::query("SELECT id, state_id, name FROM cities ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| City::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// List the cities of one state
    pub async fn list_cities_by_state(&self, state_id: i64) -> Result<Vec<City>, DbError> {
        let rows =
            sqlx::query("SELECT id, state_id, name FROM cities WHERE state_id = ? ORDER BY name")
                .bind(state_id)
                .fetch_all(&self.pool)
                .await?;

        rows.iter()
            .map(|row| City::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Insert a new city
    pub async fn insert_city(&self, city: NewCity) -> Result<City, DbError> {
        let row = sqlx::query(
            r#"
            INSERT INTO cities (state_id, name)
            VALUES (?, ?)
            RETURNING id
            "#,
        )
        .bind(city.state_id)
        .bind(&city.name)
        .fetch_one(&self.pool)
        .await?;

        Ok(City {
            id: row.get("id"),
            state_id: city.state_id,
            name: city.name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("test.db").display());
        let db = Database::new(&url).await.unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn test_states_and_cities() {
        let (_dir, db) = test_db().await;

        let ca = db
            .insert_state(NewState {
                name: "California".to_string(),
                code: "CA".to_string(),
            })
            .await
            .unwrap();
        db.insert_state(NewState {
            name: "Nevada".to_string(),
            code: "NV".to_string(),
        })
        .await
        .unwrap();

        let result = db
            .insert_state(NewState {
                name: "California again".to_string(),
                code: "CA".to_string(),
            })
            .await;
        assert!(matches!(result, Err(DbError::Duplicate(_))));

        db.insert_city(NewCity {
            state_id: ca.id,
            name: "Oakland".to_string(),
        })
        .await
        .unwrap();
        db.insert_city(NewCity {
            state_id: ca.id,
            name: "Fresno".to_string(),
        })
        .await
        .unwrap();

        assert_eq!(db.list_states().await.unwrap().len(), 2);
        assert_eq!(db.list_cities().await.unwrap().len(), 2);

        let cities = db.list_cities_by_state(ca.id).await.unwrap();
        assert_eq!(cities.len(), 2);
        assert_eq!(cities[0].name, "Fresno");

        assert!(db.get_state_by_id(ca.id).await.unwrap().is_some());
        assert!(db.get_state_by_id(999).await.unwrap().is_none());
    }
}
