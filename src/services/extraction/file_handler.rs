/*
 * Responsibility
 * - Validate one upload against the allow-list and size ceiling
 * - Convert image uploads into base64 payloads for the model (other types are skipped)
 *
 * Notes
 * - The upload body is held in memory; every stage reads it from the start,
 *   so validation and conversion never depend on a single-pass read.
 */
use async_trait::async_trait;
use axum::body::Bytes;
use base64::{Engine, engine::general_purpose::STANDARD};
use thiserror::Error;

use crate::config::UploadPolicy;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FileError {
    #[error("File type {0} not allowed")]
    UnsupportedType(String),
    #[error("File size too large: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: usize, limit: usize },
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    data: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: Option<String>, content_type: Option<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name,
            content_type,
            data: data.into(),
        }
    }

    /// Full body, from the first byte. Cheap to call repeatedly.
    pub fn contents(&self) -> &[u8] {
        &self.data
    }

    /// Media type without parameters, lowercased (`Image/PNG; q=1` → `image/png`).
    pub fn media_type(&self) -> Option<String> {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|essence| essence.trim().to_ascii_lowercase())
            .filter(|essence| !essence.is_empty())
    }

    pub fn display_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or("")
    }
}

/// An image ready to be referenced in a model request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub media_type: String,
    pub base64_data: String,
    pub source_file: String,
}

impl ImagePayload {
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.base64_data)
    }
}

#[async_trait]
pub trait FileHandler: Send + Sync {
    async fn validate_file(&self, file: &UploadedFile) -> Result<(), FileError>;

    /// `Ok(None)` means the file is valid but not something the model can take.
    async fn process_file(&self, file: &UploadedFile) -> Result<Option<ImagePayload>, FileError>;
}

#[derive(Debug, Clone)]
pub struct ImageFileHandler {
    policy: UploadPolicy,
}

impl ImageFileHandler {
    pub fn new(policy: UploadPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl FileHandler for ImageFileHandler {
    async fn validate_file(&self, file: &UploadedFile) -> Result<(), FileError> {
        let media_type = file.media_type();
        let allowed = media_type
            .as_deref()
            .is_some_and(|mt| self.policy.allowed_file_types.iter().any(|a| a.eq_ignore_ascii_case(mt)));

        if !allowed {
            let declared = file.content_type.clone().unwrap_or_else(|| "<none>".to_string());
            tracing::info!(file = file.display_name(), content_type = %declared, "upload rejected: type");
            return Err(FileError::UnsupportedType(declared));
        }

        let size = file.contents().len();
        if size > self.policy.max_file_size {
            tracing::info!(file = file.display_name(), size, "upload rejected: size");
            return Err(FileError::FileTooLarge {
                size,
                limit: self.policy.max_file_size,
            });
        }

        Ok(())
    }

    async fn process_file(&self, file: &UploadedFile) -> Result<Option<ImagePayload>, FileError> {
        let Some(media_type) = file.media_type().filter(|mt| mt.starts_with("image/")) else {
            tracing::debug!(file = file.display_name(), "skipping non-image upload");
            return Ok(None);
        };

        Ok(Some(ImagePayload {
            media_type,
            base64_data: STANDARD.encode(file.contents()),
            source_file: file.display_name().to_string(),
        }))
    }
}
