//! Thin HTTP client for the hosted database service (PostgREST + GoTrue).
//!
//! Only URL building and credential headers live here; table semantics belong
//! to `repos`, session semantics to `services::auth`.
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use url::Url;

use crate::config::SupabaseConfig;

#[derive(Clone)]
pub struct SupabaseClient {
    http: Client,
    base_url: Url,
    anon_key: String,
    /// Key used for table access: service tier when configured, else anon.
    db_key: String,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig, timeout: Duration) -> reqwest::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, config))
    }

    pub fn with_client(http: Client, config: &SupabaseConfig) -> Self {
        let db_key = config
            .service_key
            .clone()
            .unwrap_or_else(|| config.anon_key.clone());

        Self {
            http,
            base_url: config.url.clone(),
            anon_key: config.anon_key.clone(),
            db_key,
        }
    }

    /// `{base}/rest/v1/{table}`
    pub fn table_url(&self, table: &str) -> Url {
        self.endpoint(&["rest", "v1", table])
    }

    /// `{base}/auth/v1/{path}`
    pub fn auth_url(&self, path: &str) -> Url {
        self.endpoint(&["auth", "v1", path])
    }

    /// Request against a table, authenticated with the database credential tier.
    pub fn table_request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.db_key)
            .bearer_auth(&self.db_key)
    }

    /// Request against the auth API on behalf of the holder of `access_token`.
    pub fn user_request(&self, method: Method, url: Url, access_token: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot-be-a-base URLs are rejected by Config (http/https only in practice)
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Pulls the human-readable message out of a PostgREST / GoTrue error body.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(|m| m.as_str()).map(str::to_owned))
        })
        .unwrap_or_else(|| body.to_string())
}
