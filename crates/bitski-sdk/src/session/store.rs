/*
[INPUT]:  Storage directory or in-memory map, string keys and values
[OUTPUT]: TokenStore implementations for the persisted refresh token
[POS]:    Session layer - refresh-token persistence
[UPDATE]: When storage format or key naming conventions change
*/

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{Result, SdkError};

/// Namespace prefix of persisted keys
pub const DEFAULT_STORAGE_NAMESPACE: &str = "bitski";

const STORE_FILE_NAME: &str = "storage.json";

/// Key under which the refresh token for `client_id` is persisted
pub fn refresh_token_key(namespace: &str, client_id: &str) -> String {
    format!("{namespace}.refresh_token.{client_id}")
}

/// String key-value storage backend
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Store backed by one JSON object file in a directory
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Create a store rooted at `dir`; the directory is created on first write
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn file_path(&self) -> PathBuf {
        self.dir.join(STORE_FILE_NAME)
    }

    async fn load(&self) -> Result<HashMap<String, String>> {
        match tokio::fs::read(self.file_path()).await {
            Ok(bytes) if bytes.is_empty() => Ok(HashMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                SdkError::Storage(format!("corrupt store {}: {e}", self.file_path().display()))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, entries: &HashMap<String, String>) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let tmp = self.dir.join(format!(".{STORE_FILE_NAME}.{}.tmp", Uuid::new_v4()));
        let bytes = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(&tmp, bytes).await?;
        restrict_permissions(&tmp).await?;
        tokio::fs::rename(&tmp, self.file_path()).await?;
        Ok(())
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[async_trait]
impl TokenStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.save(&entries).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_dir() -> PathBuf {
        let mut path = env::temp_dir();
        path.push(format!("bitski-test-{}", Uuid::new_v4()));
        path
    }

    #[test]
    fn test_refresh_token_key() {
        assert_eq!(
            refresh_token_key(DEFAULT_STORAGE_NAMESPACE, "test-client-id"),
            "bitski.refresh_token.test-client-id"
        );
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a").await.unwrap(), None);
        store.set("a", "1").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
        store.remove("a").await.unwrap();
        store.remove("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_lifecycle() {
        let dir = temp_dir();
        let store = FileStore::new(&dir);
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", "refresh").await.unwrap();
        store.set("other", "x").await.unwrap();

        let reopened = FileStore::new(&dir);
        assert_eq!(reopened.get("k").await.unwrap().as_deref(), Some("refresh"));

        reopened.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        assert_eq!(store.get("other").await.unwrap().as_deref(), Some("x"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let metadata = std::fs::metadata(store.file_path()).unwrap();
            assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
        }

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file() {
        let dir = temp_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let store = FileStore::new(&dir);
        std::fs::write(store.file_path(), "not json").unwrap();

        let err = store.get("k").await.unwrap_err();
        assert!(matches!(err, SdkError::Storage(_)));

        std::fs::remove_dir_all(dir).unwrap();
    }
}
