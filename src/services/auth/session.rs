//! Delegated session verification.
//!
//! Tokens are never decoded locally: the hosted auth API is the only authority
//! on whether a bearer token belongs to a live session.
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::services::auth::Identity;
use crate::services::supabase::{self, SupabaseClient};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("auth provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("auth provider rejected token ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
    #[error("auth provider returned no user")]
    NoUser,
}

#[async_trait]
pub trait SessionVerifier: Send + Sync {
    async fn verify(&self, access_token: &str) -> Result<Identity, SessionError>;
}

#[derive(Debug, Deserialize)]
struct SessionUser {
    #[serde(default)]
    id: Option<Uuid>,
    #[serde(default)]
    role: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SupabaseSessionVerifier {
    client: SupabaseClient,
}

impl SupabaseSessionVerifier {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionVerifier for SupabaseSessionVerifier {
    async fn verify(&self, access_token: &str) -> Result<Identity, SessionError> {
        let resp = self
            .client
            .user_request(Method::GET, self.client.auth_url("user"), access_token)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(SessionError::Rejected {
                status,
                message: supabase::error_message(&body),
            });
        }

        let user: SessionUser = serde_json::from_str(&body).map_err(|_| SessionError::NoUser)?;
        let id = user.id.ok_or(SessionError::NoUser)?;
        Ok(Identity::user(
            id,
            user.role.unwrap_or_else(|| "authenticated".to_string()),
        ))
    }
}
