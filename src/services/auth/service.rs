/*
 * Responsibility
 * - Turn a bearer token into an Identity or fail with Unauthorized
 * - Reserved service token → fixed service identity (configured, not compiled in)
 * - Anything else → delegated session check
 */
use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::services::auth::{Identity, SessionVerifier};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing or invalid authorization header")]
    MissingCredentials,
    #[error("Invalid user token: {0}")]
    InvalidToken(String),
}

pub struct AuthService {
    service_token: Option<String>,
    service_user_id: Uuid,
    verifier: Arc<dyn SessionVerifier>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("service_token", &self.service_token.as_ref().map(|_| "<redacted>"))
            .field("service_user_id", &self.service_user_id)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(
        service_token: Option<String>,
        service_user_id: Uuid,
        verifier: Arc<dyn SessionVerifier>,
    ) -> Self {
        Self {
            // an empty secret must never authenticate anyone
            service_token: service_token.filter(|t| !t.is_empty()),
            service_user_id,
            verifier,
        }
    }

    pub fn service_user_id(&self) -> Uuid {
        self.service_user_id
    }

    pub async fn authenticate(&self, token: &str) -> Result<Identity, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        if let Some(service_token) = &self.service_token
            && digest_eq(service_token, token)
        {
            tracing::debug!("service token presented");
            return Ok(Identity::service(self.service_user_id));
        }

        match self.verifier.verify(token).await {
            Ok(identity) => {
                tracing::debug!(user_id = %identity.id, role = %identity.role, "session verified");
                Ok(identity)
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    token = %token_fingerprint(token),
                    "session verification failed"
                );
                Err(AuthError::InvalidToken(err.to_string()))
            }
        }
    }
}

/// Short, non-reversible token handle for log correlation.
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    URL_SAFE_NO_PAD.encode(&digest[..9])
}

// compares fixed-length digests so the secret's length does not leak through timing
fn digest_eq(a: &str, b: &str) -> bool {
    let (a, b) = (Sha256::digest(a.as_bytes()), Sha256::digest(b.as_bytes()));
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
