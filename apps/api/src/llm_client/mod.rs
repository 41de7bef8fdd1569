/// LLM Client: the model invocation adapter for the interview engine.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// All model interactions MUST go through this module.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Default model for interview turns. Override via `INTERVIEW_MODEL`.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;
/// Transient failures get two retries: 500ms, then 1500ms.
const RETRY_DELAYS_MS: [u64; 2] = [500, 1500];
/// Upper bound on a single model call. The turn loop must never hang on a
/// stuck upstream request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("model service unavailable: {0}")]
    Unavailable(String),

    #[error("model call timed out")]
    Timeout,

    #[error("model API rejected credentials (status {status}): {message}")]
    Auth { status: u16, message: String },

    #[error("model API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("model returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// Transient errors are worth retrying; auth and client errors are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, LlmError::Unavailable(_) | LlmError::Timeout)
    }
}

/// Adapter configuration. Built once at startup from `Config` and handed to
/// the constructor; the adapter never reads the environment itself.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub request_timeout: Duration,
}

impl LlmConfig {
    pub fn new(api_key: String, model: Option<String>) -> Self {
        Self {
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// The seam to the external model service. The engine depends on this trait
/// so tests can script model replies without a network.
///
/// Carried in `AppState` as `Arc<dyn ModelClient>`.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Submits one prompt and returns the model's raw text reply.
    async fn generate(&self, prompt: &str, system: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// The single LLM client used by the interview engine.
/// Wraps the Anthropic Messages API with bounded retry and a hard timeout.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(config.request_timeout)
                .build()
                .expect("Failed to build HTTP client"),
            config,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Makes a raw call to the model API, returning the full response object.
    /// Retries transient failures (network, timeout, 429, 5xx) with bounded
    /// backoff; fails fast on authentication and other client errors.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: &self.config.model,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..=RETRY_DELAYS_MS.len() {
            if attempt > 0 {
                let delay = Duration::from_millis(RETRY_DELAYS_MS[attempt - 1]);
                warn!(
                    "model call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.config.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) if e.is_timeout() => {
                    last_error = Some(LlmError::Timeout);
                    continue;
                }
                Err(e) => {
                    last_error = Some(LlmError::Unavailable(e.to_string()));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 401 || status.as_u16() == 403 {
                let message = read_error_message(response).await;
                return Err(LlmError::Auth {
                    status: status.as_u16(),
                    message,
                });
            }

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("model API returned {}: {}", status, body);
                last_error = Some(LlmError::Unavailable(format!("status {status}: {body}")));
                continue;
            }

            if !status.is_success() {
                let message = read_error_message(response).await;
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse = match response.json().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Unavailable(format!(
                        "undecodable API response: {e}"
                    )));
                    continue;
                }
            };

            debug!(
                "model call succeeded: input_tokens={}, output_tokens={}",
                llm_response.usage.input_tokens, llm_response.usage.output_tokens
            );

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::Unavailable(
            "retry budget exhausted".to_string(),
        )))
    }
}

async fn read_error_message(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<AnthropicError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

#[async_trait]
impl ModelClient for LlmClient {
    async fn generate(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let response = self.call(prompt, system).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        Ok(text.to_string())
    }
}
