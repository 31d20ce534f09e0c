use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Result;
use crate::types::FileObject;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    Completion,
    TextCompletion,
    Embedding,
    ImageGeneration,
    Moderation,
    AudioTranscription,
    Rerank,
    CreateFile,
    PassThrough,
}

#[derive(Debug, Clone)]
pub enum CallResponse {
    File(FileObject),
    Json(Value),
}

/// `before_dispatch` may mutate the body in place; `after_success` must not
/// block the caller on persistence.
#[async_trait]
pub trait CallHook: Send + Sync {
    async fn before_dispatch(&self, call_type: CallType, body: &mut Value) -> Result<()>;

    async fn after_success(&self, response: &CallResponse) -> Result<()>;
}
