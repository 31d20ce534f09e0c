use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::Result;
use crate::cache::CacheStore;
use crate::dispatch::FileDispatcher;
use crate::error::FilesError;
use crate::hooks::{CallHook, CallResponse, CallType};
use crate::id::{UnifiedFileId, encode_token, is_unified_token, normalize_file_id};
use crate::rewrite::{file_ids_from_messages, resolve_backend_mappings};
use crate::store::{ManagedFileStore, ManagedFilesConfig};
use crate::types::{
    BackendFileIds, ChatCompletionRequest, FileContent, FileObject, FileUploadRequest,
};

/// One stable id per file over an external cache and a multi-backend
/// dispatcher.
#[derive(Clone)]
pub struct ManagedFiles {
    store: ManagedFileStore,
    dispatcher: Arc<dyn FileDispatcher>,
}

impl ManagedFiles {
    pub fn new(cache: Arc<dyn CacheStore>, dispatcher: Arc<dyn FileDispatcher>) -> Self {
        Self::with_config(cache, dispatcher, &ManagedFilesConfig::default())
    }

    pub fn with_config(
        cache: Arc<dyn CacheStore>,
        dispatcher: Arc<dyn FileDispatcher>,
        config: &ManagedFilesConfig,
    ) -> Self {
        Self {
            store: ManagedFileStore::with_config(cache, config),
            dispatcher,
        }
    }

    pub fn store(&self) -> &ManagedFileStore {
        &self.store
    }

    /// Mints the unified id for a finished multi-backend upload. The object
    /// entry itself lands later, through the post hook.
    pub async fn register_uploads(
        &self,
        request: &FileUploadRequest,
        uploads: &[FileObject],
    ) -> Result<FileObject> {
        let Some(first) = uploads.first() else {
            return Err(FilesError::InvalidRequest {
                reason: "no backend uploads to register".to_string(),
            });
        };

        let unified = UnifiedFileId::new(request.content_type());

        let mut backend_ids = BackendFileIds::new();
        for upload in uploads {
            let Some(backend) = upload.backend.as_deref() else {
                warn!(file_id = %upload.id, "skipping upload with no backend id");
                continue;
            };
            backend_ids.insert(backend.to_string(), upload.id.clone());
        }
        self.store
            .put_mapping(&unified.token(), &backend_ids)
            .await?;

        Ok(FileObject {
            id: unified.encode(),
            bytes: first.bytes,
            created_at: first.created_at,
            filename: first.filename.clone(),
            purpose: request.purpose.clone(),
            status: Some("uploaded".to_string()),
            ..FileObject::default()
        })
    }

    pub async fn retrieve_file(&self, file_id: &str) -> Result<FileObject> {
        self.store
            .file_object(&object_entry_id(file_id))
            .await?
            .ok_or_else(|| FilesError::NotFound {
                file_id: file_id.to_string(),
            })
    }

    /// Unified cross-backend listing is out of scope; always empty.
    pub async fn list_files(&self, _purpose: Option<&str>) -> Result<Vec<FileObject>> {
        Ok(Vec::new())
    }

    /// Best-effort delete on every mapped backend, then drops the mapping
    /// and the object entry.
    pub async fn delete_file(&self, file_id: &str) -> Result<FileObject> {
        let normalized = normalize_file_id(file_id);

        let backend_ids = if is_unified_token(&normalized) {
            self.store.mapping(&normalized).await?
        } else {
            BackendFileIds::new()
        };

        for (backend, backend_file_id) in &backend_ids {
            if let Err(err) = self.dispatcher.delete_file(backend, backend_file_id).await {
                warn!(
                    backend = %backend,
                    backend_file_id = %backend_file_id,
                    error = %err,
                    "backend delete failed, continuing fan-out"
                );
            }
        }
        if !backend_ids.is_empty() {
            self.store.delete_mapping(&normalized).await?;
        }

        match self.store.delete_file_object(&object_entry_id(file_id)).await {
            Err(FilesError::NotFound { .. }) => Err(FilesError::NotFound {
                file_id: file_id.to_string(),
            }),
            other => other,
        }
    }

    /// Content from the first mapped backend that can produce it.
    pub async fn file_content(&self, file_id: &str) -> Result<FileContent> {
        let normalized = normalize_file_id(file_id);

        let backend_ids = if is_unified_token(&normalized) {
            self.store.mapping(&normalized).await?
        } else {
            BackendFileIds::new()
        };
        if backend_ids.is_empty() {
            return Err(FilesError::NotFound {
                file_id: file_id.to_string(),
            });
        }

        let mut errors = BTreeMap::new();
        for (backend, backend_file_id) in &backend_ids {
            match self.dispatcher.file_content(backend, backend_file_id).await {
                Ok(content) => return Ok(content),
                Err(err) => {
                    warn!(
                        backend = %backend,
                        backend_file_id = %backend_file_id,
                        error = %err,
                        "backend content fetch failed, trying next"
                    );
                    errors.insert(backend.clone(), err.to_string());
                }
            }
        }
        Err(FilesError::AllBackendsFailed {
            file_id: file_id.to_string(),
            errors,
        })
    }
}

/// Object entries are keyed by the transport form; collapse whatever the
/// caller supplied to that form. Foreign ids pass through.
fn object_entry_id(file_id: &str) -> String {
    let normalized = normalize_file_id(file_id);
    if is_unified_token(&normalized) {
        encode_token(&normalized)
    } else {
        normalized
    }
}

#[async_trait]
impl CallHook for ManagedFiles {
    async fn before_dispatch(&self, call_type: CallType, body: &mut Value) -> Result<()> {
        if call_type != CallType::Completion {
            return Ok(());
        }
        let mut request: ChatCompletionRequest = serde_json::from_value(body.clone())?;
        let file_ids = file_ids_from_messages(&mut request.messages);
        if file_ids.is_empty() {
            return Ok(());
        }
        let mapping = resolve_backend_mappings(&self.store, &file_ids).await?;
        request.file_id_mapping = Some(mapping);
        *body = serde_json::to_value(request)?;
        Ok(())
    }

    async fn after_success(&self, response: &CallResponse) -> Result<()> {
        let CallResponse::File(object) = response else {
            return Ok(());
        };
        let store = self.store.clone();
        let encoded = object_entry_id(&object.id);
        let object = object.clone();
        // Detached on purpose: the response must not wait on the cache, and
        // a write failure only costs a later retrieve.
        tokio::spawn(async move {
            if let Err(err) = store.put_file_object(&encoded, &object).await {
                warn!(file_id = %encoded, error = %err, "failed to persist managed file object");
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;

    struct UnusedDispatcher;

    #[async_trait]
    impl FileDispatcher for UnusedDispatcher {
        async fn delete_file(&self, backend: &str, _file_id: &str) -> Result<()> {
            Err(FilesError::Backend {
                backend: backend.to_string(),
                message: "unexpected dispatch".to_string(),
            })
        }

        async fn file_content(&self, backend: &str, _file_id: &str) -> Result<FileContent> {
            Err(FilesError::Backend {
                backend: backend.to_string(),
                message: "unexpected dispatch".to_string(),
            })
        }
    }

    fn managed() -> ManagedFiles {
        ManagedFiles::new(Arc::new(InMemoryCache::new()), Arc::new(UnusedDispatcher))
    }

    fn upload_request() -> FileUploadRequest {
        FileUploadRequest {
            filename: "report.pdf".to_string(),
            bytes: bytes::Bytes::from_static(b"%PDF-1.7"),
            purpose: "user_data".to_string(),
            media_type: Some("application/pdf".to_string()),
        }
    }

    #[tokio::test]
    async fn registering_no_uploads_is_an_invalid_request() {
        let err = managed()
            .register_uploads(&upload_request(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, FilesError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn register_skips_uploads_without_a_backend_id() -> Result<()> {
        let managed = managed();
        let uploads = vec![
            FileObject {
                id: "prov-123".to_string(),
                bytes: 8,
                created_at: 1_736_500_000,
                filename: "report.pdf".to_string(),
                purpose: "user_data".to_string(),
                ..FileObject::default()
            }
            .with_backend("gpt-a"),
            FileObject {
                id: "prov-456".to_string(),
                bytes: 8,
                created_at: 1_736_500_001,
                filename: "report.pdf".to_string(),
                purpose: "user_data".to_string(),
                ..FileObject::default()
            },
        ];

        let response = managed.register_uploads(&upload_request(), &uploads).await?;
        assert_eq!(response.status.as_deref(), Some("uploaded"));
        assert_eq!(response.bytes, 8);
        assert_eq!(response.created_at, 1_736_500_000);

        let token = normalize_file_id(&response.id);
        let mapping = managed.store().mapping(&token).await?;
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.get("gpt-a").map(String::as_str), Some("prov-123"));
        Ok(())
    }

    #[tokio::test]
    async fn listing_is_always_empty() -> Result<()> {
        assert!(managed().list_files(None).await?.is_empty());
        assert!(managed().list_files(Some("user_data")).await?.is_empty());
        Ok(())
    }
}
