use async_trait::async_trait;

use crate::Result;
use crate::types::FileContent;

/// Hands file operations to a named backend. Implementations own routing,
/// credentials and transport.
#[async_trait]
pub trait FileDispatcher: Send + Sync {
    async fn delete_file(&self, backend: &str, file_id: &str) -> Result<()>;

    async fn file_content(&self, backend: &str, file_id: &str) -> Result<FileContent>;
}
