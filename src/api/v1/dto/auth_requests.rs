/*
 * Responsibility
 * - AuthRequest の request/response DTO
 * - validate() は形式チェックのみ (必須文字列が空白でないこと)
 * - body に provider_id があっても無視する: 所有者は常に認証済み identity から決まる
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repos::auth_request_repo::{AuthRequestRow, Priority};
use crate::services::auth_requests::AuthRequestDraft;

#[derive(Debug, Deserialize)]
pub struct CreateAuthRequestRequest {
    pub patient_name: String,
    pub patient_id: String,
    pub procedure_code: String,
    pub procedure_description: String,
    pub diagnosis_code: String,
    pub diagnosis_description: String,
    pub medical_justification: String,
    #[serde(default)]
    pub priority: Priority,
    pub payer_name: Option<String>,
    pub payer_id: Option<String>,
}

impl CreateAuthRequestRequest {
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("patient_name", &self.patient_name),
            ("patient_id", &self.patient_id),
            ("procedure_code", &self.procedure_code),
            ("procedure_description", &self.procedure_description),
            ("diagnosis_code", &self.diagnosis_code),
            ("diagnosis_description", &self.diagnosis_description),
            ("medical_justification", &self.medical_justification),
        ];

        match required.iter().find(|(_, v)| v.trim().is_empty()) {
            Some((name, _)) => Err(format!("{name} is required")),
            None => Ok(()),
        }
    }

    pub fn into_draft(self) -> AuthRequestDraft {
        AuthRequestDraft {
            patient_name: self.patient_name,
            patient_id: self.patient_id,
            procedure_code: self.procedure_code,
            procedure_description: self.procedure_description,
            diagnosis_code: self.diagnosis_code,
            diagnosis_description: self.diagnosis_description,
            medical_justification: self.medical_justification,
            priority: self.priority,
            payer_name: self.payer_name,
            payer_id: self.payer_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListAuthRequestsQuery {
    pub provider_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusQuery {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct AuthRequestResponse {
    pub id: Uuid,
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
    pub status: String,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub provider_id: Uuid,
}

impl From<AuthRequestRow> for AuthRequestResponse {
    fn from(row: AuthRequestRow) -> Self {
        Self {
            id: row.id,
            patient_name: row.patient_name,
            patient_id: row.patient_id,
            procedure_code: row.procedure_code,
            procedure_description: row.procedure_description,
            diagnosis_code: row.diagnosis_code,
            diagnosis_description: row.diagnosis_description,
            medical_justification: row.medical_justification,
            priority: row.priority,
            payer_name: row.payer_name,
            payer_id: row.payer_id,
            status: row.status,
            submitted_at: row.submitted_at,
            updated_at: row.updated_at,
            provider_id: row.provider_id,
        }
    }
}
