use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

/// Failure causes kept distinct so the synthesizer can log what actually
/// went wrong; none of these ever reach the end user directly.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("request timed out")]
    Timeout,
    #[error("authentication rejected")]
    Auth,
    #[error("rate limited")]
    RateLimit,
    #[error("connection reset")]
    ConnectionReset,
    #[error("API key not configured")]
    MissingCredentials,
    #[error("API error: {0}")]
    Api(String),
}

#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<String, LlmError>;
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns an L2-normalized vector of fixed dimensionality.
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}
