/*
 * Responsibility
 * - One chat-completions call per extraction (instructions + notes + images)
 * - Strict JSON parse of the reply, then mapping into FormExtractionResult
 * - Token usage into processing metadata (zero when the provider omits it)
 */
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::file_handler::ImagePayload;
use super::mapper;
use super::prompt::build_prompt;
use super::types::{FormExtractionResult, ProcessingMetadata};
use super::ExtractionError;
use crate::config::OpenAiConfig;
use crate::services::supabase::error_message;

#[async_trait]
pub trait AiModelProcessor: Send + Sync {
    async fn process_content(
        &self,
        content: &[ImagePayload],
        additional_context: Option<&str>,
    ) -> Result<FormExtractionResult, ExtractionError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

/// Vision-capable chat model behind an OpenAI-compatible API.
#[derive(Clone)]
pub struct VisionProcessor {
    http: Client,
    config: OpenAiConfig,
}

impl std::fmt::Debug for VisionProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionProcessor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl VisionProcessor {
    pub fn new(config: OpenAiConfig, timeout: Duration) -> reqwest::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, config))
    }

    pub fn with_client(http: Client, config: OpenAiConfig) -> Self {
        Self { http, config }
    }

    fn completions_url(&self) -> url::Url {
        let mut url = self.config.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["chat", "completions"]);
        }
        url
    }

    fn build_request<'a>(
        &'a self,
        content: &[ImagePayload],
        additional_context: Option<&str>,
    ) -> ChatRequest<'a> {
        let mut parts = Vec::with_capacity(content.len() + 1);
        parts.push(ContentPart::Text {
            text: build_prompt(additional_context),
        });
        parts.extend(content.iter().map(|image| ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: image.data_url(),
            },
        }));

        ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: parts,
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        }
    }

    fn parse_reply(
        &self,
        response: ChatResponse,
        files_processed: usize,
    ) -> Result<FormExtractionResult, ExtractionError> {
        let raw = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ExtractionError::UpstreamUnavailable("Invalid response format: no choices".into())
            })?;

        let reply: Value = serde_json::from_str(&raw).map_err(|e| {
            tracing::warn!(error = %e, "model reply is not JSON");
            tracing::debug!(raw = %raw, "unparseable model reply");
            ExtractionError::MalformedModelOutput {
                raw: raw.clone(),
                error: e.to_string(),
            }
        })?;

        let usage = response.usage.unwrap_or_default();
        let metadata = ProcessingMetadata {
            model: self.config.model.clone(),
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
            total_files_processed: files_processed,
        };

        mapper::result_from_json(&reply, metadata)
            .map_err(|error| ExtractionError::MalformedModelOutput { raw, error })
    }
}

#[async_trait]
impl AiModelProcessor for VisionProcessor {
    async fn process_content(
        &self,
        content: &[ImagePayload],
        additional_context: Option<&str>,
    ) -> Result<FormExtractionResult, ExtractionError> {
        if content.is_empty() {
            return Err(ExtractionError::EmptyInput);
        }

        let request = self.build_request(content, additional_context);
        let started = Instant::now();

        let resp = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractionError::UpstreamUnavailable(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ExtractionError::UpstreamUnavailable(e.to_string()))?;

        if !status.is_success() {
            tracing::error!(%status, "model call failed");
            return Err(ExtractionError::UpstreamUnavailable(format!(
                "{status}: {}",
                error_message_from_openai(&body)
            )));
        }

        let response: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            ExtractionError::UpstreamUnavailable(format!("Invalid response format: {e}"))
        })?;

        let result = self.parse_reply(response, content.len())?;
        tracing::info!(
            model = %result.processing_metadata.model,
            images = content.len(),
            total_tokens = result.processing_metadata.total_tokens,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "form extraction completed"
        );
        Ok(result)
    }
}

// {"error": {"message": "..."}}
fn error_message_from_openai(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| error_message(body))
}
