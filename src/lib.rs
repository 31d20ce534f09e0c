mod cache;
mod dispatch;
mod error;
mod hooks;
mod managed;
mod rewrite;
mod store;

pub mod id;
pub mod types;

#[cfg(feature = "store-redis")]
mod redis_cache;

pub use cache::{CacheStore, InMemoryCache};
pub use dispatch::FileDispatcher;
pub use error::{FilesError, Result};
pub use hooks::{CallHook, CallResponse, CallType};
pub use managed::ManagedFiles;
pub use rewrite::{file_ids_from_messages, resolve_backend_mappings};
pub use store::{ManagedFileStore, ManagedFilesConfig};

#[cfg(feature = "store-redis")]
pub use redis_cache::RedisCache;

pub use id::{
    MANAGED_FILE_PREFIX, UnifiedFileId, decode_unified_token, encode_token, is_unified_token,
    normalize_file_id,
};
pub use types::{
    BackendFileIds, ChatCompletionRequest, ChatMessage, ContentPart, FileContent, FileIdMapping,
    FileObject, FilePart, FilePartKind, FileReference, FileUploadRequest, MessageContent,
};
