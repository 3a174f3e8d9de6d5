/*
 * Responsibility
 * - auth_requests table access over the hosted database's REST API
 * - one HTTP round trip per operation, no retries
 * - provider errors come back as RepoError so services can wrap them
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repos::error::RepoError;
use crate::services::supabase::{self, SupabaseClient};

const TABLE: &str = "auth_requests";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    #[default]
    Standard,
    Urgent,
    Emergency,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthRequestRow {
    pub id: Uuid,
    pub patient_name: String,
    pub patient_id: String,
    pub procedure_code: String,
    pub procedure_description: String,
    pub diagnosis_code: String,
    pub diagnosis_description: String,
    pub medical_justification: String,
    pub priority: Priority,
    #[serde(default)]
    pub payer_name: Option<String>,
    #[serde(default)]
    pub payer_id: Option<String>,
    pub status: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub submitted_at: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
    pub provider_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAuthRequestRow {
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
    pub provider_id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct StatusPatch<'a> {
    status: &'a str,
    updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait AuthRequestRepo: Send + Sync {
    /// Returns the stored row, or `None` when the database echoes nothing back.
    async fn insert(&self, row: &NewAuthRequestRow) -> Result<Option<AuthRequestRow>, RepoError>;

    async fn list_by_provider(&self, provider_id: Uuid) -> Result<Vec<AuthRequestRow>, RepoError>;

    async fn get(&self, id: Uuid) -> Result<Option<AuthRequestRow>, RepoError>;

    async fn update_status(
        &self,
        id: Uuid,
        status: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<AuthRequestRow>, RepoError>;
}

#[derive(Clone, Debug)]
pub struct SupabaseAuthRequestRepo {
    client: SupabaseClient,
}

impl SupabaseAuthRequestRepo {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    fn filtered_url(&self, column: &str, value: Uuid) -> url::Url {
        let mut url = self.client.table_url(TABLE);
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair(column, &format!("eq.{value}"));
        url
    }
}

#[async_trait]
impl AuthRequestRepo for SupabaseAuthRequestRepo {
    async fn insert(&self, row: &NewAuthRequestRow) -> Result<Option<AuthRequestRow>, RepoError> {
        let resp = self
            .client
            .table_request(Method::POST, self.client.table_url(TABLE))
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;

        let rows = read_rows(resp).await?;
        tracing::debug!(table = TABLE, returned = rows.len(), "insert");
        Ok(rows.into_iter().next())
    }

    async fn list_by_provider(&self, provider_id: Uuid) -> Result<Vec<AuthRequestRow>, RepoError> {
        let resp = self
            .client
            .table_request(Method::GET, self.filtered_url("provider_id", provider_id))
            .send()
            .await?;

        let rows = read_rows(resp).await?;
        tracing::debug!(table = TABLE, %provider_id, returned = rows.len(), "select by provider");
        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Option<AuthRequestRow>, RepoError> {
        let resp = self
            .client
            .table_request(Method::GET, self.filtered_url("id", id))
            .send()
            .await?;

        Ok(read_rows(resp).await?.into_iter().next())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<AuthRequestRow>, RepoError> {
        let resp = self
            .client
            .table_request(Method::PATCH, self.filtered_url("id", id))
            .header("Prefer", "return=representation")
            .json(&StatusPatch { status, updated_at })
            .send()
            .await?;

        let rows = read_rows(resp).await?;
        tracing::debug!(table = TABLE, %id, returned = rows.len(), "update status");
        Ok(rows.into_iter().next())
    }
}

async fn read_rows(resp: Response) -> Result<Vec<AuthRequestRow>, RepoError> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(RepoError::Status {
            status,
            message: supabase::error_message(&body),
        });
    }
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&body)?)
}

/// `timestamptz` columns come back with an offset, plain `timestamp` columns without one
/// (treated as UTC).
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, de::Error};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use axum::{
        Json, Router,
        extract::{Query, State},
        http::{HeaderMap, StatusCode},
        routing::get,
    };
    use serde_json::{Value, json};

    use crate::config::SupabaseConfig;
    use crate::test_support::{sample_row_json, spawn_server};

    #[derive(Clone, Default)]
    struct Seen {
        queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
        headers: Arc<Mutex<Vec<HeaderMap>>>,
        bodies: Arc<Mutex<Vec<Value>>>,
    }

    async fn repo_against(router: Router) -> SupabaseAuthRequestRepo {
        let url = spawn_server(router).await;
        let config = SupabaseConfig {
            url,
            anon_key: "anon".into(),
            service_key: Some("service".into()),
        };
        SupabaseAuthRequestRepo::new(SupabaseClient::with_client(reqwest::Client::new(), &config))
    }

    fn new_row(provider_id: Uuid) -> NewAuthRequestRow {
        let now = Utc::now();
        NewAuthRequestRow {
            patient_name: "Jane Roe".into(),
            patient_id: "P-1001".into(),
            procedure_code: "72148".into(),
            procedure_description: "MRI lumbar spine".into(),
            diagnosis_code: "M54.5".into(),
            diagnosis_description: "Low back pain".into(),
            medical_justification: "Six weeks of failed conservative therapy".into(),
            priority: Priority::Urgent,
            payer_name: None,
            payer_id: None,
            status: "Pending".into(),
            provider_id,
            submitted_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn list_by_provider_filters_with_eq_and_service_key() {
        let seen = Seen::default();
        let provider_id = Uuid::new_v4();
        let row_id = Uuid::new_v4();

        let router = Router::new()
            .route(
                "/rest/v1/auth_requests",
                get(
                    move |State(seen): State<Seen>,
                          Query(q): Query<HashMap<String, String>>,
                          headers: HeaderMap| async move {
                        seen.queries.lock().unwrap().push(q);
                        seen.headers.lock().unwrap().push(headers);
                        Json(json!([sample_row_json(row_id, provider_id, "Pending")]))
                    },
                ),
            )
            .with_state(seen.clone());

        let repo = repo_against(router).await;
        let rows = repo.list_by_provider(provider_id).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].provider_id, provider_id);

        let queries = seen.queries.lock().unwrap();
        assert_eq!(queries[0].get("select").map(String::as_str), Some("*"));
        assert_eq!(
            queries[0].get("provider_id"),
            Some(&format!("eq.{provider_id}"))
        );
        let headers = seen.headers.lock().unwrap();
        assert_eq!(headers[0].get("apikey").unwrap(), "service");
        assert_eq!(headers[0].get("authorization").unwrap(), "Bearer service");
    }

    #[tokio::test]
    async fn insert_asks_for_representation_and_returns_first_row() {
        let seen = Seen::default();
        let provider_id = Uuid::new_v4();
        let id = Uuid::new_v4();

        let router = Router::new()
            .route(
                "/rest/v1/auth_requests",
                axum::routing::post(
                    move |State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>| async move {
                        seen.headers.lock().unwrap().push(headers);
                        seen.bodies.lock().unwrap().push(body);
                        (
                            StatusCode::CREATED,
                            Json(json!([sample_row_json(id, provider_id, "Pending")])),
                        )
                    },
                ),
            )
            .with_state(seen.clone());

        let repo = repo_against(router).await;
        let stored = repo.insert(&new_row(provider_id)).await.unwrap().unwrap();

        assert_eq!(stored.id, id);
        assert_eq!(stored.priority, Priority::Standard);

        let headers = seen.headers.lock().unwrap();
        assert_eq!(headers[0].get("prefer").unwrap(), "return=representation");
        let bodies = seen.bodies.lock().unwrap();
        assert_eq!(bodies[0]["priority"], "Urgent");
        assert_eq!(bodies[0]["status"], "Pending");
        assert_eq!(bodies[0]["provider_id"], provider_id.to_string());
    }

    #[tokio::test]
    async fn get_returns_none_for_empty_result() {
        let router = Router::new().route("/rest/v1/auth_requests", get(|| async { Json(json!([])) }));

        let repo = repo_against(router).await;
        assert!(repo.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_status_patches_status_and_timestamp() {
        let seen = Seen::default();
        let id = Uuid::new_v4();
        let provider_id = Uuid::new_v4();

        let router = Router::new()
            .route(
                "/rest/v1/auth_requests",
                axum::routing::patch(
                    move |State(seen): State<Seen>,
                          Query(q): Query<HashMap<String, String>>,
                          Json(body): Json<Value>| async move {
                        seen.queries.lock().unwrap().push(q);
                        seen.bodies.lock().unwrap().push(body);
                        Json(json!([sample_row_json(id, provider_id, "Approved")]))
                    },
                ),
            )
            .with_state(seen.clone());

        let repo = repo_against(router).await;
        let updated = repo
            .update_status(id, "Approved", Utc::now())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.status, "Approved");
        let queries = seen.queries.lock().unwrap();
        assert_eq!(queries[0].get("id"), Some(&format!("eq.{id}")));
        let bodies = seen.bodies.lock().unwrap();
        assert_eq!(bodies[0]["status"], "Approved");
        assert!(bodies[0]["updated_at"].is_string());
    }

    #[tokio::test]
    async fn provider_errors_surface_their_message() {
        let router = Router::new().route(
            "/rest/v1/auth_requests",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"code": "PGRST301", "message": "JWT expired"})),
                )
            }),
        );

        let repo = repo_against(router).await;
        match repo.list_by_provider(Uuid::new_v4()).await {
            Err(RepoError::Status { status, message }) => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(message, "JWT expired");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn timestamps_parse_with_and_without_offset() {
        let with_offset = timestamp::parse("2025-03-01T10:15:30.123456+00:00").unwrap();
        let naive = timestamp::parse("2025-03-01T10:15:30.123456").unwrap();
        assert_eq!(with_offset, naive);
        assert!(timestamp::parse("yesterday").is_none());
    }
}
