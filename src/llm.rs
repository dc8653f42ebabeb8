//! LLM provider for the [`AiService`] trait.
//!
//! - **[`DisabledAi`]**: every call fails. Used when `[llm] provider = "disabled"`.
//! - **[`OpenAiService`]**: OpenAI-compatible chat completions with the
//!   schema sent as a `json_schema` response format.
//!
//! Transient failures are retried with exponential backoff:
//! - HTTP 429 (rate limited) and 5xx → retry
//! - HTTP 4xx (other) → fail immediately
//! - Network errors → retry

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use knowledge_hub_core::ai::{AiError, AiService, DisabledAi};

use crate::config::LlmConfig;

const SYSTEM_PROMPT: &str =
    "You are the assistant behind a technical knowledge base. Answer only with JSON matching the requested schema.";

/// Build the configured [`AiService`].
///
/// # Errors
///
/// Fails for unknown providers, or for `openai` when `OPENAI_API_KEY` is
/// not set.
pub fn create_service(config: &LlmConfig) -> Result<Box<dyn AiService>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledAi)),
        "openai" => Ok(Box::new(OpenAiService::new(config)?)),
        other => bail!("Unknown llm provider: {}", other),
    }
}

/// OpenAI chat-completions client.
pub struct OpenAiService {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    max_retries: u32,
}

impl OpenAiService {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("llm.model required for OpenAI provider"))?;
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
        })
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat<'a>,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'static str,
    strict: bool,
    schema: &'a Value,
}

/// Delay before retry `attempt` (1-based): 1s, 2s, 4s, ... capped at 32s.
fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1 << (attempt - 1).min(5))
}

#[async_trait]
impl AiService for OpenAiService {
    async fn invoke(&self, prompt: &str, schema: &Value) -> Result<Value, AiError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: "structured_response",
                    strict: false,
                    schema,
                },
            },
        };
        let url = format!("{}/chat/completions", self.base_url);

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff(attempt);
                debug!(attempt, delay_secs = delay.as_secs(), "retrying LLM request");
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: Value = response
                            .json()
                            .await
                            .map_err(|e| AiError::Malformed(e.to_string()))?;
                        return parse_completion(&json);
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    let err = AiError::Provider(format!("OpenAI API error {}: {}", status, body_text));
                    if status.as_u16() == 429 || status.is_server_error() {
                        warn!(%status, attempt, "transient LLM error");
                        last_err = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    warn!(error = %e, attempt, "LLM request failed");
                    last_err = Some(AiError::Provider(e.to_string()));
                }
            }
        }

        Err(last_err.unwrap_or_else(|| AiError::Provider("LLM request failed after retries".into())))
    }
}

/// Extract and parse `choices[0].message.content` as JSON.
fn parse_completion(json: &Value) -> Result<Value, AiError> {
    let content = json
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .ok_or_else(|| AiError::Malformed("missing choices[0].message.content".into()))?;
    serde_json::from_str(content).map_err(|e| AiError::Malformed(e.to_string()))
}
