//! Stored file operations

use chrono::Utc;
use sqlx::Row;

use crate::error::DbError;
use crate::models::{FileWithOwner, NewStoredFile, StoredFile};
use crate::repository::Database;

/// Maximum page size accepted from clients
const MAX_LIMIT: i64 = 100;

/// Filters and pagination for file listings
#[derive(Debug, Clone, Default)]
pub struct FileQuery {
    /// Restrict to one owner (always set for non-admin listings)
    pub user_id: Option<i64>,
    /// Substring match on the file name
    pub search: Option<String>,
    /// Prefix match on the MIME type (e.g. "image")
    pub type_prefix: Option<String>,
    pub offset: i64,
    pub limit: i64,
}

impl FileQuery {
    fn validated(mut self) -> Self {
        if self.limit <= 0 || self.limit > MAX_LIMIT {
            self.limit = 20;
        }
        if self.offset < 0 {
            self.offset = 0;
        }
        self
    }

    fn where_clause(&self) -> (String, Vec<String>) {
        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(user_id) = self.user_id {
            conditions.push("files.user_id = ?");
            params.push(user_id.to_string());
        }
        if let Some(search) = &self.search {
            conditions.push("files.file_name LIKE ?");
            params.push(format!("%{}%", search));
        }
        if let Some(prefix) = &self.type_prefix {
            conditions.push("files.file_type LIKE ?");
            params.push(format!("{}%", prefix));
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        (clause, params)
    }
}

/// Aggregate file statistics
#[derive(Debug, Clone, Default)]
pub struct FileStats {
    pub file_count: i64,
    pub total_size: i64,
}

impl Database {
    /// Insert file metadata
    pub async fn insert_file(&self, file: NewStoredFile) -> Result<StoredFile, DbError> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO files (id, user_id, file_name, file_key, file_url, file_type, file_size, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&file.id)
        .bind(file.user_id)
        .bind(&file.file_name)
        .bind(&file.file_key)
        .bind(&file.file_url)
        .bind(&file.file_type)
        .bind(file.file_size)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(StoredFile {
            id: file.id,
            user_id: file.user_id,
            file_name: file.file_name,
            file_key: file.file_key,
            file_url: file.file_url,
            file_type: file.file_type,
            file_size: file.file_size,
            created_at: now,
        })
    }

    /// Get a file by ID
    pub async fn get_file_by_id(&self, id: &str) -> Result<Option<StoredFile>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, user_id, file_name, file_key, file_url, file_type, file_size, created_at
            FROM files
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| StoredFile::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// List files matching the query, newest first, with the total match count
    pub async fn list_files(&self, query: FileQuery) -> Result<(Vec<StoredFile>, i64), DbError> {
        let query = query.validated();
        let (where_clause, params) = query.where_clause();

        let count_sql = format!("SELECT COUNT(*) as count FROM files {}", where_clause);
        let mut count_query = sqlx::query(&count_sql);
        for param in &params {
            count_query = count_query.bind(param);
        }
        let count_row = count_query.fetch_one(&self.pool).await?;
        let total: i64 = count_row.get("count");

        let sql = format!(
            r#"
            SELECT id, user_id, file_name, file_key, file_url, file_type, file_size, created_at
            FROM files
            {}
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#,
            where_clause
        );

        let mut files_query = sqlx::query(&sql);
        for param in &params {
            files_query = files_query.bind(param);
        }
        files_query = files_query.bind(query.limit).bind(query.offset);

        let rows = files_query.fetch_all(&self.pool).await?;
        let files: Result<Vec<StoredFile>, _> = rows
            .iter()
            .map(|row| StoredFile::try_from(row).map_err(DbError::from))
            .collect();

        Ok((files?, total))
    }

    /// List files joined with owner identity (admin view), with total count
    pub async fn list_files_with_owner(
        &self,
        query: FileQuery,
    ) -> Result<(Vec<FileWithOwner>, i64), DbError> {
        let query = query.validated();
        let (where_clause, params) = query.where_clause();

        let count_sql = format!("SELECT COUNT(*) as count FROM files {}", where_clause);
        let mut count_query = sqlx::query(&count_sql);
        for param in &params {
            count_query = count_query.bind(param);
        }
        let count_row = count_query.fetch_one(&self.pool).await?;
        let total: i64 = count_row.get("count");

        let sql = format!(
            r#"
            SELECT files.id, files.user_id, files.file_name, files.file_key, files.file_url,
                   files.file_type, files.file_size, files.created_at,
                   users.name as owner_name, users.username as owner_username
            FROM files
            JOIN users ON users.id = files.user_id
            {}
            ORDER BY files.created_at DESC
            LIMIT ? OFFSET ?
            "#,
            where_clause
        );

        let mut files_query = sqlx::query(&sql);
        for param in &params {
            files_query = files_query.bind(param);
        }
        files_query = files_query.bind(query.limit).bind(query.offset);

        let rows = files_query.fetch_all(&self.pool).await?;
        let files: Result<Vec<FileWithOwner>, _> = rows
            .iter()
            .map(|row| FileWithOwner::try_from(row).map_err(DbError::from))
            .collect();

        Ok((files?, total))
    }

    /// Count and total size of one user's files
    pub async fn file_stats_for_user(&self, user_id: i64) -> Result<FileStats, DbError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as count, COALESCE(SUM(file_size), 0) as total
            FROM files
            WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(FileStats {
            file_count: row.get("count"),
            total_size: row.get("total"),
        })
    }

    /// Count and total size across all files
    pub async fn overall_file_stats(&self) -> Result<FileStats, DbError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as count, COALESCE(SUM(file_size), 0) as total
            FROM files
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(FileStats {
            file_count: row.get("count"),
            total_size: row.get("total"),
        })
    }

    /// Delete a file record
    pub async fn delete_file(&self, id: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM files WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUser, UserRole};

    async fn test_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("test.db").display());
        let db = Database::new(&url).await.unwrap();
        (dir, db)
    }

    async fn seed_user(db: &Database, username: &str) -> i64 {
        db.insert_user(NewUser {
            username: username.to_string(),
            name: username.to_string(),
            password_hash: "hash".to_string(),
            role: UserRole::Customer,
        })
        .await
        .unwrap()
        .id
    }

    fn new_file(id: &str, user_id: i64, name: &str, mime: &str, size: i64) -> NewStoredFile {
        NewStoredFile {
            id: id.to_string(),
            user_id,
            file_name: name.to_string(),
            file_key: format!("uploads/{}/{}", user_id, id),
            file_url: format!("http://files.test/uploads/{}/{}", user_id, id),
            file_type: mime.to_string(),
            file_size: size,
        }
    }

    #[tokio::test]
    async fn test_list_filters_by_owner_and_type() {
        let (_dir, db) = test_db().await;
        let alice = seed_user(&db, "alice").await;
        let bob = seed_user(&db, "bob").await;

        db.insert_file(new_file("f1", alice, "photo.png", "image/png", 100))
            .await
            .unwrap();
        db.insert_file(new_file("f2", alice, "notes.txt", "text/plain", 50))
            .await
            .unwrap();
        db.insert_file(new_file("f3", bob, "cat.jpg", "image/jpeg", 200))
            .await
            .unwrap();

        let (files, total) = db
            .list_files(FileQuery {
                user_id: Some(alice),
                limit: 20,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(files.len(), 2);

        let (files, total) = db
            .list_files(FileQuery {
                user_id: Some(alice),
                type_prefix: Some("image".to_string()),
                limit: 20,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(files[0].file_name, "photo.png");

        let (files, total) = db
            .list_files(FileQuery {
                search: Some("cat".to_string()),
                limit: 20,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(files[0].user_id, bob);
        assert_eq!(files.len(), 1);
    }

    #[tokio::test]
    async fn test_stats_and_delete() {
        let (_dir, db) = test_db().await;
        let alice = seed_user(&db, "alice").await;

        db.insert_file(new_file("f1", alice, "a.bin", "application/octet-stream", 100))
            .await
            .unwrap();
        db.insert_file(new_file("f2", alice, "b.bin", "application/octet-stream", 250))
            .await
            .unwrap();

        let stats = db.file_stats_for_user(alice).await.unwrap();
        assert_eq!(stats.file_count, 2);
        assert_eq!(stats.total_size, 350);

        assert!(db.delete_file("f1").await.unwrap());
        assert!(!db.delete_file("f1").await.unwrap());

        let stats = db.overall_file_stats().await.unwrap();
        assert_eq!(stats.file_count, 1);
        assert_eq!(stats.total_size, 250);
    }

    #[tokio::test]
    async fn test_owner_join() {
        let (_dir, db) = test_db().await;
        let alice = seed_user(&db, "alice").await;
        db.insert_file(new_file("f1", alice, "a.bin", "application/octet-stream", 1))
            .await
            .unwrap();

        let (files, total) = db
            .list_files_with_owner(FileQuery {
                limit: 20,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(files[0].owner_username, "alice");
    }
}
