use crate::Result;
use crate::id::{is_unified_token, normalize_file_id};
use crate::store::ManagedFileStore;
use crate::types::{ChatMessage, ContentPart, FileIdMapping, MessageContent};

/// Rewrites each user-message `file_id` to its raw token form in place and
/// returns the ids in first-appearance order. Foreign ids pass through
/// unchanged but are still collected; empty ids are skipped.
pub fn file_ids_from_messages(messages: &mut [ChatMessage]) -> Vec<String> {
    let mut file_ids: Vec<String> = Vec::new();
    for message in messages {
        if message.role != "user" {
            continue;
        }
        let Some(MessageContent::Parts(parts)) = message.content.as_mut() else {
            continue;
        };
        for part in parts {
            let ContentPart::File(file_part) = part else {
                continue;
            };
            let file_id = file_part.file.file_id.as_deref();
            let Some(file_id) = file_id.filter(|id| !id.is_empty()) else {
                continue;
            };
            let normalized = normalize_file_id(file_id);
            if !file_ids.contains(&normalized) {
                file_ids.push(normalized.clone());
            }
            file_part.file.file_id = Some(normalized);
        }
    }
    file_ids
}

/// Foreign ids and ids with no stored mapping are left out of the result.
pub async fn resolve_backend_mappings(
    store: &ManagedFileStore,
    file_ids: &[String],
) -> Result<FileIdMapping> {
    let mut mapping = FileIdMapping::new();
    for file_id in file_ids {
        if !is_unified_token(file_id) {
            continue;
        }
        let backend_ids = store.mapping(file_id).await?;
        if !backend_ids.is_empty() {
            mapping.insert(file_id.clone(), backend_ids);
        }
    }
    Ok(mapping)
}
