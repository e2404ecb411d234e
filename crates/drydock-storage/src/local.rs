//! Local disk storage backend

use async_trait::async_trait;
use bytes::Bytes;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::backend::{StorageBackend, validate_key};
use crate::error::StorageError;

/// Local disk storage backend
///
/// Stores objects as plain files under the base path, mirroring the object
/// key as a relative path. The public URL is built from a configured base,
/// typically a static-file route or reverse-proxy mount of the same
/// directory.
pub struct LocalStorage {
    base_path: PathBuf,
    public_base: String,
}

impl LocalStorage {
    /// Create a new local storage backend
    pub async fn new(
        base_path: impl AsRef<Path>,
        public_base: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).await?;

        info!("Initialized local storage at {:?}", base_path);

        Ok(Self {
            base_path,
            public_base: public_base.into().trim_end_matches('/').to_string(),
        })
    }

    /// Get the file path for an object key
    fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn put(&self, key: &str, data: Bytes, _content_type: &str) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        debug!("Writing object to {:?}", path);

        let parent = path
            .parent()
            .ok_or_else(|| StorageError::InvalidKey(key.to_string()))?
            .to_path_buf();
        fs::create_dir_all(&parent).await?;

        // Write to a temp file in the same directory, then rename into place
        // so readers never observe a partial object
        tokio::task::spawn_blocking(move || -> Result<(), StorageError> {
            let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
            tmp.write_all(&data)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|e| StorageError::Io(e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| StorageError::Backend(format!("Task join error: {}", e)))??;

        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Bytes, StorageError> {
        let path = self.object_path(key)?;
        debug!("Reading object from {:?}", path);

        let data = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(key.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;

        Ok(Bytes::from(data))
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.object_path(key)?;
        Ok(path.exists())
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.object_path(key)?;
        debug!("Deleting object at {:?}", path);

        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn storage() -> (tempfile::TempDir, LocalStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path(), "http://localhost:8080/files")
            .await
            .unwrap();
        (dir, storage)
    }

    #[tokio::test]
    async fn test_put_read_delete() {
        let (_dir, storage) = storage().await;
        let key = "uploads/1/abc.txt";

        assert!(!storage.exists(key).await.unwrap());

        storage
            .put(key, Bytes::from_static(b"hello"), "text/plain")
            .await
            .unwrap();
        assert!(storage.exists(key).await.unwrap());
        assert_eq!(storage.read(key).await.unwrap(), Bytes::from_static(b"hello"));

        assert!(storage.delete(key).await.unwrap());
        assert!(!storage.delete(key).await.unwrap());
        assert!(matches!(
            storage.read(key).await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_overwrite_replaces_content() {
        let (_dir, storage) = storage().await;
        let key = "uploads/1/abc.txt";

        storage
            .put(key, Bytes::from_static(b"first"), "text/plain")
            .await
            .unwrap();
        storage
            .put(key, Bytes::from_static(b"second"), "text/plain")
            .await
            .unwrap();
        assert_eq!(
            storage.read(key).await.unwrap(),
            Bytes::from_static(b"second")
        );
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let (_dir, storage) = storage().await;

        let result = storage
            .put("../escape.txt", Bytes::from_static(b"x"), "text/plain")
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn test_public_url() {
        let (_dir, storage) = storage().await;
        assert_eq!(
            storage.public_url("uploads/1/abc.txt"),
            "http://localhost:8080/files/uploads/1/abc.txt"
        );
    }
}
