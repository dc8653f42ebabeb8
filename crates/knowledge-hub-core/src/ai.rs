//! AI invocation abstraction.
//!
//! Every AI-backed operation in Knowledge Hub (semantic search synthesis,
//! document summaries, simulated scraping, report writing) goes through a
//! single call: a prompt plus a JSON schema describing the expected
//! response. Implementations wrap a concrete LLM provider.
//!
//! No retry is expected of callers: a failed [`AiService::invoke`] is
//! terminal for that call.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Errors from an AI invocation.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    /// No provider is configured.
    #[error("AI provider is disabled")]
    Disabled,

    /// Network failure or non-success response from the provider.
    #[error("AI provider error: {0}")]
    Provider(String),

    /// The response did not match the requested schema.
    #[error("malformed AI response: {0}")]
    Malformed(String),
}

/// A structured-output LLM call.
#[async_trait]
pub trait AiService: Send + Sync {
    /// Send `prompt` and return a JSON value conforming to `schema`.
    async fn invoke(&self, prompt: &str, schema: &Value) -> Result<Value, AiError>;
}

/// Invoke and deserialize the response into `T`.
///
/// A response that does not deserialize is reported as [`AiError::Malformed`].
pub async fn invoke_as<T, A>(ai: &A, prompt: &str, schema: &Value) -> Result<T, AiError>
where
    T: DeserializeOwned,
    A: AiService + ?Sized,
{
    let value = ai.invoke(prompt, schema).await?;
    serde_json::from_value(value).map_err(|e| AiError::Malformed(e.to_string()))
}

/// An [`AiService`] that always fails with [`AiError::Disabled`].
pub struct DisabledAi;

#[async_trait]
impl AiService for DisabledAi {
    async fn invoke(&self, _prompt: &str, _schema: &Value) -> Result<Value, AiError> {
        Err(AiError::Disabled)
    }
}
