//! Storage backend trait

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StorageError;

/// Storage backend trait
///
/// Implementations of this trait store uploaded objects under
/// caller-chosen keys such as `uploads/<user_id>/<uuid>.<ext>`.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write an object, replacing any existing object under the key
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), StorageError>;

    /// Read an object fully into memory
    async fn read(&self, key: &str) -> Result<Bytes, StorageError>;

    /// Check if an object exists
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Delete an object
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;

    /// Public URL clients can fetch the object from
    fn public_url(&self, key: &str) -> String;
}

/// Validate an object key
///
/// Keys are relative slash-separated paths; empty segments and parent
/// references are rejected before they can escape the storage root.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() || key.starts_with('/') || key.ends_with('/') {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    if key.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..") {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("uploads/1/abc.png").is_ok());
        assert!(validate_key("documents/2/licence.pdf").is_ok());

        assert!(validate_key("").is_err());
        assert!(validate_key("/absolute").is_err());
        assert!(validate_key("trailing/").is_err());
        assert!(validate_key("a//b").is_err());
        assert!(validate_key("a/../b").is_err());
        assert!(validate_key("./a").is_err());
    }
}
