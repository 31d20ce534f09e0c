use async_trait::async_trait;
use redis::AsyncCommands;
use serde_json::Value;

use crate::Result;
use crate::cache::CacheStore;
use crate::error::FilesError;

/// [`CacheStore`] backed by redis; entries are JSON strings under
/// `{prefix}:{key}`.
#[derive(Clone, Debug)]
pub struct RedisCache {
    client: redis::Client,
    prefix: String,
}

impl From<redis::RedisError> for FilesError {
    fn from(err: redis::RedisError) -> Self {
        FilesError::Cache {
            message: err.to_string(),
        }
    }
}

impl RedisCache {
    pub fn new(url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            client: redis::Client::open(url.as_ref())?,
            prefix: "ditto_files".to_string(),
        })
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        let _: Option<String> = conn.get(self.entry_key("__ping__")).await?;
        Ok(())
    }

    fn entry_key(&self, key: &str) -> String {
        format!("{}:{key}", self.prefix)
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(self.entry_key(key)).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Option<Value>) -> Result<()> {
        let mut conn = self.connection().await?;
        let entry_key = self.entry_key(key);
        match value {
            Some(value) => {
                let _: () = conn.set(entry_key, serde_json::to_string(&value)?).await?;
            }
            None => {
                let _: () = conn.del(entry_key).await?;
            }
        }
        Ok(())
    }
}
