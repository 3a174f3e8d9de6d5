use thiserror::Error;

use super::FileError;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error(transparent)]
    InvalidFile(#[from] FileError),
    #[error("No valid files to process")]
    EmptyInput,
    #[error("AI provider call failed: {0}")]
    UpstreamUnavailable(String),
    #[error("Failed to parse model response as JSON: {error}")]
    MalformedModelOutput { raw: String, error: String },
}
