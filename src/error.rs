use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilesError {
    #[error("managed file not found: {file_id}")]
    NotFound { file_id: String },
    #[error("managed file not found: {file_id}; backend errors: {errors:?}")]
    AllBackendsFailed {
        file_id: String,
        errors: BTreeMap<String, String>,
    },
    #[error("backend {backend} failed: {message}")]
    Backend { backend: String, message: String },
    #[error("cache error: {message}")]
    Cache { message: String },
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },
    #[error("failed to parse json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FilesError>;
