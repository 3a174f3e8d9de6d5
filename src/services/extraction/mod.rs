/*!
 * Form extraction pipeline
 *
 * upload → FileHandler (validate, convert) → AiModelProcessor → ResponseMapper
 *
 * Each stage sits behind a trait so a different model backend can be plugged in
 * without touching the HTTP endpoint.
 */
mod error;
pub mod file_handler;
pub mod mapper;
pub mod pipeline;
pub mod processor;
mod prompt;
pub mod types;

pub use error::ExtractionError;
pub use file_handler::{FileError, FileHandler, ImageFileHandler, ImagePayload, UploadedFile};
pub use mapper::{PassthroughMapper, ResponseMapper};
pub use pipeline::ExtractionService;
pub use processor::{AiModelProcessor, VisionProcessor};
pub use types::{FieldExtraction, FormExtractionResult, ProcessingMetadata};
