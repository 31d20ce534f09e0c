use base64::Engine;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use uuid::Uuid;

/// Reserved sentinel: no provider mints ids starting with this.
pub const MANAGED_FILE_PREFIX: &str = "ditto_managed_file";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnifiedFileId {
    pub content_type: String,
    pub id: Uuid,
}

impl UnifiedFileId {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self::from_parts(content_type, Uuid::new_v4())
    }

    pub fn from_parts(content_type: impl Into<String>, id: Uuid) -> Self {
        Self {
            content_type: content_type.into(),
            id,
        }
    }

    pub fn token(&self) -> String {
        format!("{MANAGED_FILE_PREFIX},{},{}", self.content_type, self.id)
    }

    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.token())
    }

    pub fn parse_token(token: &str) -> Option<Self> {
        let rest = token
            .strip_prefix(MANAGED_FILE_PREFIX)?
            .strip_prefix(',')?;
        let (content_type, id) = rest.rsplit_once(',')?;
        let id = Uuid::parse_str(id).ok()?;
        Some(Self {
            content_type: content_type.to_string(),
            id,
        })
    }
}

/// `None` means the candidate is not one of ours; for provider-native ids
/// that is the normal outcome, never an error.
pub fn decode_unified_token(candidate: &str) -> Option<String> {
    if candidate.is_empty() {
        return None;
    }
    let mut padded = candidate.to_string();
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    let decoded = URL_SAFE.decode(padded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    if decoded.starts_with(MANAGED_FILE_PREFIX) {
        Some(decoded)
    } else {
        None
    }
}

pub fn is_unified_token(candidate: &str) -> bool {
    candidate.starts_with(MANAGED_FILE_PREFIX)
}

/// Deterministic, so the result always matches what [`UnifiedFileId::encode`]
/// minted at upload time for the same token.
pub fn encode_token(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(token)
}

/// Collapses either accepted form to the raw token; anything else passes
/// through unchanged. Idempotent: raw tokens contain `,`, which no base64
/// alphabet accepts, so a second pass never re-decodes.
pub fn normalize_file_id(candidate: &str) -> String {
    match decode_unified_token(candidate) {
        Some(token) => token,
        None => candidate.to_string(),
    }
}
