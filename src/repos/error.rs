/**
 * Responsibility
 * - What the repo layer tells its callers went wrong
 */
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("database returned {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("unexpected database payload: {0}")]
    Decode(#[from] serde_json::Error),
}
