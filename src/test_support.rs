//! In-process fakes for the external systems (database, auth provider, model).
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde_json::{Value, json};
use url::Url;
use uuid::Uuid;

use crate::repos::auth_request_repo::{AuthRequestRepo, AuthRequestRow, NewAuthRequestRow, Priority};
use crate::repos::error::RepoError;
use crate::services::auth::{Identity, SessionError, SessionVerifier};
use crate::services::auth_requests::AuthRequestDraft;
use crate::services::extraction::mapper::result_from_json;
use crate::services::extraction::{
    AiModelProcessor, ExtractionError, FormExtractionResult, ImagePayload, ProcessingMetadata,
};

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn_server(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{addr}")).unwrap()
}

pub fn sample_row_json(id: Uuid, provider_id: Uuid, status: &str) -> Value {
    json!({
        "id": id,
        "patient_name": "Jane Roe",
        "patient_id": "P-1001",
        "procedure_code": "72148",
        "procedure_description": "MRI lumbar spine without contrast",
        "diagnosis_code": "M54.5",
        "diagnosis_description": "Low back pain",
        "medical_justification": "Six weeks of failed conservative therapy",
        "priority": "Standard",
        "payer_name": "Acme Health",
        "payer_id": null,
        "status": status,
        "submitted_at": "2025-03-01T10:15:30.123456+00:00",
        "updated_at": "2025-03-01T10:15:30.123456",
        "provider_id": provider_id
    })
}

pub fn sample_draft() -> AuthRequestDraft {
    AuthRequestDraft {
        patient_name: "Jane Roe".into(),
        patient_id: "P-1001".into(),
        procedure_code: "72148".into(),
        procedure_description: "MRI lumbar spine without contrast".into(),
        diagnosis_code: "M54.5".into(),
        diagnosis_description: "Low back pain".into(),
        medical_justification: "Six weeks of failed conservative therapy".into(),
        priority: Priority::Standard,
        payer_name: Some("Acme Health".into()),
        payer_id: None,
    }
}

pub fn sample_model_reply() -> Value {
    json!({
        "patient_info": {
            "name": {"value": "Jane Roe", "confidence": 0.97, "is_missing": false, "source_file": "a.png"},
            "id": {"value": null, "confidence": 0.0, "is_missing": true, "source_file": ""}
        },
        "procedure_info": {
            "code": {"value": "72148", "confidence": 0.9, "is_missing": false, "source_file": "a.png"},
            "description": {"value": "MRI lumbar spine", "confidence": 0.85, "is_missing": false, "source_file": "b.png"}
        },
        "diagnosis_info": {
            "primary_diagnosis": {"value": "M54.5", "confidence": 0.8, "is_missing": false, "source_file": "b.png"},
            "symptoms": {"value": "radiating pain", "is_missing": false}
        },
        "treatment_info": {
            "prescribed_treatment": {"value": "physical therapy", "confidence": 0.7, "is_missing": false, "source_file": "b.png"}
        },
        "insurance_info": {
            "provider": {"value": "Acme Health", "confidence": 0.92, "is_missing": false, "source_file": "a.png"},
            "policy_number": {"value": null}
        },
        "medical_justification": {"value": "Failed conservative therapy", "confidence": 0.75, "is_missing": false, "source_file": "b.png"}
    })
}

#[derive(Default)]
pub struct InMemoryAuthRequestRepo {
    rows: Mutex<Vec<AuthRequestRow>>,
    swallow_inserts: AtomicBool,
    failure: Mutex<Option<String>>,
}

impl InMemoryAuthRequestRepo {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    /// Inserts succeed but echo nothing back.
    pub fn swallow_inserts(&self) {
        self.swallow_inserts.store(true, Ordering::SeqCst);
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    fn check(&self) -> Result<(), RepoError> {
        match self.failure.lock().unwrap().clone() {
            Some(message) => Err(RepoError::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
                message,
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AuthRequestRepo for InMemoryAuthRequestRepo {
    async fn insert(&self, row: &NewAuthRequestRow) -> Result<Option<AuthRequestRow>, RepoError> {
        self.check()?;
        if self.swallow_inserts.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let stored = AuthRequestRow {
            id: Uuid::new_v4(),
            patient_name: row.patient_name.clone(),
            patient_id: row.patient_id.clone(),
            procedure_code: row.procedure_code.clone(),
            procedure_description: row.procedure_description.clone(),
            diagnosis_code: row.diagnosis_code.clone(),
            diagnosis_description: row.diagnosis_description.clone(),
            medical_justification: row.medical_justification.clone(),
            priority: row.priority,
            payer_name: row.payer_name.clone(),
            payer_id: row.payer_id.clone(),
            status: row.status.clone(),
            submitted_at: row.submitted_at,
            updated_at: row.updated_at,
            provider_id: row.provider_id,
        };
        self.rows.lock().unwrap().push(stored.clone());
        Ok(Some(stored))
    }

    async fn list_by_provider(&self, provider_id: Uuid) -> Result<Vec<AuthRequestRow>, RepoError> {
        self.check()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.provider_id == provider_id)
            .cloned()
            .collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<AuthRequestRow>, RepoError> {
        self.check()?;
        Ok(self.rows.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<AuthRequestRow>, RepoError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        Ok(rows.iter_mut().find(|r| r.id == id).map(|row| {
            row.status = status.to_string();
            row.updated_at = updated_at;
            row.clone()
        }))
    }
}

/// Session verifier that accepts exactly one token.
pub struct StaticVerifier {
    accepted: Option<(String, Identity)>,
    rejection: String,
    calls: Arc<AtomicUsize>,
}

impl StaticVerifier {
    pub fn accepting(token: &str, identity: Identity) -> Self {
        Self {
            accepted: Some((token.to_string(), identity)),
            rejection: "invalid JWT".into(),
            calls: Arc::default(),
        }
    }

    pub fn rejecting(message: &str) -> Self {
        Self {
            accepted: None,
            rejection: message.to_string(),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl SessionVerifier for StaticVerifier {
    async fn verify(&self, access_token: &str) -> Result<Identity, SessionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.accepted {
            Some((token, identity)) if token == access_token => Ok(identity.clone()),
            _ => Err(SessionError::Rejected {
                status: StatusCode::UNAUTHORIZED,
                message: self.rejection.clone(),
            }),
        }
    }
}

enum Outcome {
    Reply(Value),
    Malformed(&'static str),
}

/// Model stand-in that records what it was sent.
pub struct RecordingProcessor {
    pub calls: AtomicUsize,
    last: Mutex<Option<(Vec<String>, Option<String>)>>,
    outcome: Outcome,
}

impl RecordingProcessor {
    pub fn succeeding() -> Self {
        Self::with(Outcome::Reply(sample_model_reply()))
    }

    pub fn malformed(raw: &'static str) -> Self {
        Self::with(Outcome::Malformed(raw))
    }

    fn with(outcome: Outcome) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
            outcome,
        }
    }

    pub fn last_sources(&self) -> Vec<String> {
        self.last
            .lock()
            .unwrap()
            .as_ref()
            .map(|(sources, _)| sources.clone())
            .unwrap_or_default()
    }

    pub fn last_context(&self) -> Option<String> {
        self.last.lock().unwrap().as_ref().and_then(|(_, ctx)| ctx.clone())
    }
}

#[async_trait]
impl AiModelProcessor for RecordingProcessor {
    async fn process_content(
        &self,
        content: &[ImagePayload],
        additional_context: Option<&str>,
    ) -> Result<FormExtractionResult, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some((
            content.iter().map(|p| p.source_file.clone()).collect(),
            additional_context.map(str::to_owned),
        ));

        match &self.outcome {
            Outcome::Reply(reply) => {
                let metadata = ProcessingMetadata {
                    model: "test-model".into(),
                    total_files_processed: content.len(),
                    ..ProcessingMetadata::default()
                };
                result_from_json(reply, metadata).map_err(|error| {
                    ExtractionError::MalformedModelOutput {
                        raw: reply.to_string(),
                        error,
                    }
                })
            }
            Outcome::Malformed(raw) => Err(ExtractionError::MalformedModelOutput {
                raw: raw.to_string(),
                error: "expected value at line 1 column 1".into(),
            }),
        }
    }
}
