use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Backend id -> backend-local file id, for one unified file.
pub type BackendFileIds = BTreeMap<String, String>;

/// Unified token -> per-backend ids, attached to a request for dispatch.
pub type FileIdMapping = BTreeMap<String, BackendFileIds>;

/// Only the pieces this layer inspects are typed; everything else rides
/// along in `extra` untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id_mapping: Option<FileIdMapping>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentPart {
    File(FilePart),
    Other(Value),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilePart {
    #[serde(rename = "type")]
    pub kind: FilePartKind,
    pub file: FileReference,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilePartKind {
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_data: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileObject {
    pub id: String,
    #[serde(default = "default_object_kind")]
    pub object: String,
    pub bytes: u64,
    pub created_at: u64,
    pub filename: String,
    pub purpose: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_details: Option<Value>,
    /// Which backend produced this object during the upload fan-out.
    #[serde(skip)]
    pub backend: Option<String>,
}

fn default_object_kind() -> String {
    "file".to_string()
}

impl Default for FileObject {
    fn default() -> Self {
        Self {
            id: String::new(),
            object: default_object_kind(),
            bytes: 0,
            created_at: 0,
            filename: String::new(),
            purpose: String::new(),
            status: None,
            status_details: None,
            backend: None,
        }
    }
}

impl FileObject {
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = Some(backend.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct FileUploadRequest {
    pub filename: String,
    pub bytes: Bytes,
    pub purpose: String,
    pub media_type: Option<String>,
}

impl FileUploadRequest {
    pub fn content_type(&self) -> &str {
        self.media_type
            .as_deref()
            .unwrap_or("application/octet-stream")
    }
}

#[derive(Debug, Clone)]
pub struct FileContent {
    pub bytes: Bytes,
    pub media_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_message_and_part_fields_round_trip() {
        let raw = json!({
            "model": "gpt-4o-mini",
            "messages": [
                {
                    "role": "user",
                    "name": "alice",
                    "content": [
                        { "type": "text", "text": "describe this" },
                        {
                            "type": "file",
                            "file": { "file_id": "file-abc", "page": 3 },
                            "cache_control": { "type": "ephemeral" }
                        }
                    ]
                },
                { "role": "assistant", "content": "done" }
            ],
            "temperature": 0.2
        });

        let parsed: ChatCompletionRequest =
            serde_json::from_value(raw.clone()).expect("parse request");
        assert_eq!(parsed.messages.len(), 2);
        assert!(parsed.file_id_mapping.is_none());

        let back = serde_json::to_value(&parsed).expect("serialize request");
        assert_eq!(back, raw);
    }

    #[test]
    fn non_file_parts_fall_through_to_other() {
        let part: ContentPart =
            serde_json::from_value(json!({ "type": "text", "text": "hi" })).expect("parse part");
        assert!(matches!(part, ContentPart::Other(_)));

        let part: ContentPart = serde_json::from_value(json!({
            "type": "file",
            "file": { "file_id": "file-abc" }
        }))
        .expect("parse part");
        match part {
            ContentPart::File(file) => {
                assert_eq!(file.file.file_id.as_deref(), Some("file-abc"));
            }
            ContentPart::Other(other) => panic!("expected file part, got {other}"),
        }
    }

    #[test]
    fn string_content_parses_as_text() {
        let message: ChatMessage = serde_json::from_value(json!({
            "role": "user",
            "content": "plain text"
        }))
        .expect("parse message");
        assert!(matches!(message.content, Some(MessageContent::Text(_))));
    }

    #[test]
    fn file_object_backend_never_serializes() {
        let object = FileObject {
            id: "id".to_string(),
            object: "file".to_string(),
            bytes: 11,
            created_at: 123,
            filename: "hello.txt".to_string(),
            purpose: "assistants".to_string(),
            status: Some("uploaded".to_string()),
            status_details: None,
            backend: None,
        }
        .with_backend("gpt-a");

        let raw = serde_json::to_value(&object).expect("serialize");
        assert!(raw.get("backend").is_none());

        let parsed: FileObject = serde_json::from_value(raw).expect("parse");
        assert_eq!(parsed.backend, None);
    }
}
