use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::Result;

/// The gateway's shared key-value cache. Eviction, TTL and durability are
/// whatever the backing store provides. `set(key, None)` clears the entry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn set(&self, key: &str, value: Option<Value>) -> Result<()>;
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryCache {
    entries: Arc<Mutex<HashMap<String, Value>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Option<Value>) -> Result<()> {
        let mut entries = self.entries.lock().await;
        match value {
            Some(value) => {
                entries.insert(key.to_string(), value);
            }
            None => {
                entries.remove(key);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn get_returns_what_was_set() -> Result<()> {
        let cache = InMemoryCache::new();
        assert_eq!(cache.get("k").await?, None);

        cache.set("k", Some(json!({"a": 1}))).await?;
        assert_eq!(cache.get("k").await?, Some(json!({"a": 1})));

        cache.set("k", Some(json!({"a": 2}))).await?;
        assert_eq!(cache.get("k").await?, Some(json!({"a": 2})));
        Ok(())
    }

    #[tokio::test]
    async fn set_none_clears_the_entry() -> Result<()> {
        let cache = InMemoryCache::new();
        cache.set("k", Some(json!("v"))).await?;
        cache.set("k", None).await?;
        assert_eq!(cache.get("k").await?, None);
        Ok(())
    }
}
