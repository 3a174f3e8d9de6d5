/*
 * Responsibility
 * - Run the upload → payload → model → mapper stages in order
 * - Files are handled sequentially; the model is called at most once
 */
use std::sync::Arc;

use super::{
    AiModelProcessor, ExtractionError, FileHandler, FormExtractionResult, ResponseMapper,
    UploadedFile,
};

#[derive(Clone)]
pub struct ExtractionService {
    file_handler: Arc<dyn FileHandler>,
    processor: Arc<dyn AiModelProcessor>,
    mapper: Arc<dyn ResponseMapper>,
}

impl std::fmt::Debug for ExtractionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionService").finish_non_exhaustive()
    }
}

impl ExtractionService {
    pub fn new(
        file_handler: Arc<dyn FileHandler>,
        processor: Arc<dyn AiModelProcessor>,
        mapper: Arc<dyn ResponseMapper>,
    ) -> Self {
        Self {
            file_handler,
            processor,
            mapper,
        }
    }

    pub async fn extract(
        &self,
        files: &[UploadedFile],
        additional_notes: Option<&str>,
    ) -> Result<FormExtractionResult, ExtractionError> {
        let mut payloads = Vec::with_capacity(files.len());
        for file in files {
            self.file_handler.validate_file(file).await?;
            if let Some(payload) = self.file_handler.process_file(file).await? {
                payloads.push(payload);
            }
        }

        if payloads.is_empty() {
            tracing::info!(files = files.len(), "no usable files in upload");
            return Err(ExtractionError::EmptyInput);
        }

        let notes = additional_notes.filter(|n| !n.trim().is_empty());
        let result = self.processor.process_content(&payloads, notes).await?;
        Ok(self.mapper.map_to_response(result))
    }
}
