/*
 * Responsibility
 * - Load settings from the environment (.env is honoured via dotenvy)
 * - Validate settings up front (missing database credentials abort startup)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;
use uuid::Uuid;

pub const DEFAULT_SERVICE_ROLE_USER_ID: &str = "00000000-0000-0000-0000-000000000001";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Hosted database endpoint plus its two credential tiers.
#[derive(Clone)]
pub struct SupabaseConfig {
    pub url: Url,
    pub anon_key: String,
    pub service_key: Option<String>,
}

impl fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url.as_str())
            .field("service_key", &self.service_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: Url,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_file_size: usize,
    pub allowed_file_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            allowed_file_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "application/pdf".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub supabase: SupabaseConfig,
    pub service_role_user_id: Uuid,

    pub openai: OpenAiConfig,

    pub upload: UploadPolicy,
    pub max_request_body_bytes: usize,
    pub request_timeout: Duration,
    pub upstream_timeout: Duration,

    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup (the process environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // empty values count as unset
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port: u16 = parse_or(var("PORT"), 8000, "PORT")?;
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(var("APP_ENV"));

        let cors_allowed_origins = split_list(
            var("CORS_ALLOWED_ORIGINS")
                .as_deref()
                .unwrap_or("http://localhost:3000,http://localhost:8000"),
        );

        let supabase_url = var("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?;
        let supabase_url =
            Url::parse(&supabase_url).map_err(|_| ConfigError::Invalid("SUPABASE_URL"))?;
        let anon_key = var("SUPABASE_ANON_KEY").ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?;
        let service_key = var("SUPABASE_SERVICE_KEY");

        let service_role_user_id = Uuid::parse_str(
            var("SERVICE_ROLE_USER_ID")
                .as_deref()
                .unwrap_or(DEFAULT_SERVICE_ROLE_USER_ID),
        )
        .map_err(|_| ConfigError::Invalid("SERVICE_ROLE_USER_ID"))?;

        let openai_base_url = var("OPENAI_BASE_URL")
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string());
        let openai = OpenAiConfig {
            api_key: var("OPENAI_API_KEY").unwrap_or_default(),
            base_url: Url::parse(&openai_base_url)
                .map_err(|_| ConfigError::Invalid("OPENAI_BASE_URL"))?,
            model: var("OPENAI_MODEL").unwrap_or_else(|| "gpt-4.1".to_string()),
            max_tokens: parse_or(var("OPENAI_MAX_TOKENS"), 4000, "OPENAI_MAX_TOKENS")?,
            temperature: parse_or(var("OPENAI_TEMPERATURE"), 0.1, "OPENAI_TEMPERATURE")?,
        };

        let defaults = UploadPolicy::default();
        let upload = UploadPolicy {
            max_file_size: parse_or(var("MAX_FILE_SIZE"), defaults.max_file_size, "MAX_FILE_SIZE")?,
            allowed_file_types: var("ALLOWED_FILE_TYPES")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.allowed_file_types),
        };

        let max_request_body_bytes = parse_or(
            var("MAX_REQUEST_BODY_BYTES"),
            50 * 1024 * 1024,
            "MAX_REQUEST_BODY_BYTES",
        )?;

        let request_timeout = Duration::from_secs(parse_or(
            var("REQUEST_TIMEOUT_SECONDS"),
            120,
            "REQUEST_TIMEOUT_SECONDS",
        )?);
        let upstream_timeout = Duration::from_secs(parse_or(
            var("UPSTREAM_TIMEOUT_SECONDS"),
            60,
            "UPSTREAM_TIMEOUT_SECONDS",
        )?);

        let log_level = var("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            supabase: SupabaseConfig {
                url: supabase_url,
                anon_key,
                service_key,
            },
            service_role_user_id,
            openai,
            upload,
            max_request_body_bytes,
            request_timeout,
            upstream_timeout,
            log_level,
        })
    }
}

fn parse_or<T: FromStr>(
    value: Option<String>,
    default: T,
    key: &'static str,
) -> Result<T, ConfigError> {
    match value {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
