/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - auth: credential check, auth_requests: CRUD service, extraction: form pipeline
 * - Clone 前提で持つ (内部は Arc なので Clone cheap)
 */
use std::sync::Arc;

use crate::services::{
    auth::AuthService, auth_requests::AuthRequestService, extraction::ExtractionService,
};

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub auth_requests: Arc<AuthRequestService>,
    pub extraction: Arc<ExtractionService>,
}

impl AppState {
    pub fn new(
        auth: Arc<AuthService>,
        auth_requests: Arc<AuthRequestService>,
        extraction: Arc<ExtractionService>,
    ) -> Self {
        Self {
            auth,
            auth_requests,
            extraction,
        }
    }
}
