use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::Result;
use crate::cache::CacheStore;
use crate::error::FilesError;
use crate::types::{BackendFileIds, FileObject};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagedFilesConfig {
    /// Namespace prefixed to file-object cache keys.
    pub namespace: String,
}

impl Default for ManagedFilesConfig {
    fn default() -> Self {
        Self {
            namespace: "ditto_files".to_string(),
        }
    }
}

/// Two namespaces over one [`CacheStore`]: the client-facing [`FileObject`]
/// under `{namespace}/{encoded_id}`, the backend id mapping under the bare
/// token. Never locks or retries; per-key atomicity is the cache's problem.
#[derive(Clone)]
pub struct ManagedFileStore {
    cache: Arc<dyn CacheStore>,
    namespace: String,
}

impl ManagedFileStore {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self::with_config(cache, &ManagedFilesConfig::default())
    }

    pub fn with_config(cache: Arc<dyn CacheStore>, config: &ManagedFilesConfig) -> Self {
        Self {
            cache,
            namespace: config.namespace.clone(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn object_key(&self, encoded_id: &str) -> String {
        format!("{}/{encoded_id}", self.namespace)
    }

    pub async fn put_file_object(&self, encoded_id: &str, object: &FileObject) -> Result<()> {
        info!(file_id = %encoded_id, "storing managed file object");
        self.cache
            .set(&self.object_key(encoded_id), Some(serde_json::to_value(object)?))
            .await
    }

    pub async fn file_object(&self, encoded_id: &str) -> Result<Option<FileObject>> {
        match self.cache.get(&self.object_key(encoded_id)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn delete_file_object(&self, encoded_id: &str) -> Result<FileObject> {
        let key = self.object_key(encoded_id);
        let Some(value) = self.cache.get(&key).await? else {
            return Err(FilesError::NotFound {
                file_id: encoded_id.to_string(),
            });
        };
        let previous = serde_json::from_value(value)?;
        self.cache.set(&key, None).await?;
        Ok(previous)
    }

    /// Unconditional overwrite; a re-upload replaces the previous mapping.
    pub async fn put_mapping(&self, token: &str, backend_ids: &BackendFileIds) -> Result<()> {
        self.cache
            .set(token, Some(serde_json::to_value(backend_ids)?))
            .await
    }

    /// A miss and a stored empty map both read as "no backend has this file".
    pub async fn mapping(&self, token: &str) -> Result<BackendFileIds> {
        match self.cache.get(token).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(BackendFileIds::new()),
        }
    }

    pub async fn delete_mapping(&self, token: &str) -> Result<BackendFileIds> {
        let Some(value) = self.cache.get(token).await? else {
            return Err(FilesError::NotFound {
                file_id: token.to_string(),
            });
        };
        let previous = serde_json::from_value(value)?;
        self.cache.set(token, None).await?;
        Ok(previous)
    }
}
