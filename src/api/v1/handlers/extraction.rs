/*
 * Responsibility
 * - POST /api/v1/extract-form-data/ (multipart)
 * - multipart を UploadedFile の列に変換し、ExtractionService に渡すだけ
 * - `files` が複数回出現してよい。`additional_notes` は form field でも query でも受ける
 */
use axum::{
    Json,
    extract::{
        Multipart, Query, State,
        multipart::MultipartRejection,
        rejection::QueryRejection,
    },
};
use serde::Deserialize;

use crate::{
    error::AppError,
    services::extraction::{FormExtractionResult, UploadedFile},
    state::AppState,
};

const FILES_FIELD: &str = "files";
const NOTES_FIELD: &str = "additional_notes";

#[derive(Debug, Default, Deserialize)]
pub struct ExtractFormQuery {
    pub additional_notes: Option<String>,
}

pub async fn extract_form_data(
    State(state): State<AppState>,
    query: Result<Query<ExtractFormQuery>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<FormExtractionResult>, AppError> {
    let Query(query) = query?;
    let mut multipart = multipart?;

    let mut files = Vec::new();
    let mut notes = query.additional_notes;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(FILES_FIELD) => {
                let file_name = field.file_name().map(str::to_owned);
                let content_type = field.content_type().map(str::to_owned);
                let data = field.bytes().await?;
                files.push(UploadedFile::new(file_name, content_type, data));
            }
            Some(NOTES_FIELD) => {
                // the form field wins over the query parameter
                notes = Some(field.text().await?);
            }
            other => tracing::debug!(field = ?other, "ignoring unexpected multipart field"),
        }
    }

    tracing::info!(files = files.len(), has_notes = notes.is_some(), "form extraction requested");

    let result = state.extraction.extract(&files, notes.as_deref()).await?;
    Ok(Json(result))
}
