/*
 * Responsibility
 * - create / list / get / update-status for authorization requests
 * - owning-provider resolution from the caller identity
 * - exactly one repo call per operation; failures are wrapped, never retried
 */
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::repos::auth_request_repo::{AuthRequestRepo, AuthRequestRow, NewAuthRequestRow, Priority};
use crate::repos::error::RepoError;
use crate::services::auth::Identity;

pub const STATUS_PENDING: &str = "Pending";

#[derive(Debug, Error)]
pub enum AuthRequestError {
    #[error("Failed to create auth request: no row returned by the database")]
    CreationFailed,
    #[error("Failed to {operation} auth request: {source}")]
    Upstream {
        operation: &'static str,
        source: RepoError,
    },
}

impl AuthRequestError {
    fn upstream(operation: &'static str) -> impl FnOnce(RepoError) -> Self {
        move |source| {
            tracing::error!(operation, error = %source, "auth request repo call failed");
            Self::Upstream { operation, source }
        }
    }
}

/// Submission fields after HTTP-level validation.
#[derive(Debug, Clone)]
pub struct AuthRequestDraft {
    pub patient_name: String,
    pub patient_id: String,
    pub procedure_code: String,
    pub procedure_description: String,
    pub diagnosis_code: String,
    pub diagnosis_description: String,
    pub medical_justification: String,
    pub priority: Priority,
    pub payer_name: Option<String>,
    pub payer_id: Option<String>,
}

pub struct AuthRequestService {
    repo: Arc<dyn AuthRequestRepo>,
    service_user_id: Uuid,
}

impl std::fmt::Debug for AuthRequestService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthRequestService")
            .field("service_user_id", &self.service_user_id)
            .finish_non_exhaustive()
    }
}

impl AuthRequestService {
    pub fn new(repo: Arc<dyn AuthRequestRepo>, service_user_id: Uuid) -> Self {
        Self {
            repo,
            service_user_id,
        }
    }

    fn resolve_provider_id(&self, caller: &Identity) -> Uuid {
        if caller.is_service() {
            self.service_user_id
        } else {
            caller.id
        }
    }

    pub async fn create(
        &self,
        draft: AuthRequestDraft,
        caller: &Identity,
    ) -> Result<AuthRequestRow, AuthRequestError> {
        let provider_id = self.resolve_provider_id(caller);
        let now = Utc::now();

        let row = NewAuthRequestRow {
            patient_name: draft.patient_name,
            patient_id: draft.patient_id,
            procedure_code: draft.procedure_code,
            procedure_description: draft.procedure_description,
            diagnosis_code: draft.diagnosis_code,
            diagnosis_description: draft.diagnosis_description,
            medical_justification: draft.medical_justification,
            priority: draft.priority,
            payer_name: draft.payer_name,
            payer_id: draft.payer_id,
            status: STATUS_PENDING.to_string(),
            provider_id,
            submitted_at: now,
            updated_at: now,
        };

        tracing::debug!(%provider_id, service = caller.is_service(), "creating auth request");

        let created = self
            .repo
            .insert(&row)
            .await
            .map_err(AuthRequestError::upstream("create"))?
            .ok_or(AuthRequestError::CreationFailed)?;

        tracing::info!(id = %created.id, %provider_id, "auth request created");
        Ok(created)
    }

    pub async fn list_by_provider(
        &self,
        provider_id: Uuid,
    ) -> Result<Vec<AuthRequestRow>, AuthRequestError> {
        self.repo
            .list_by_provider(provider_id)
            .await
            .map_err(AuthRequestError::upstream("list"))
    }

    /// `Ok(None)` when no row has this id.
    pub async fn get(&self, id: Uuid) -> Result<Option<AuthRequestRow>, AuthRequestError> {
        self.repo
            .get(id)
            .await
            .map_err(AuthRequestError::upstream("get"))
    }

    /// Overwrites `status` verbatim; there is no transition graph.
    pub async fn update_status(
        &self,
        id: Uuid,
        status: &str,
    ) -> Result<Option<AuthRequestRow>, AuthRequestError> {
        let updated = self
            .repo
            .update_status(id, status, Utc::now())
            .await
            .map_err(AuthRequestError::upstream("update"))?;

        if let Some(row) = &updated {
            tracing::info!(%id, status = %row.status, "auth request status updated");
        }
        Ok(updated)
    }
}
