use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

use crate::providers::traits::{ChatCompletion, ChatMessage, GenerationParams, LlmError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct DeepSeekProvider {
    api_key: Option<String>,
    api_url: String,
    model: String,
    client: Client,
}

impl DeepSeekProvider {
    pub fn new(api_key: Option<String>, api_url: String, model: String) -> Self {
        if api_key.is_none() {
            log::warn!("DeepSeek provider created without an API key; completions will fail fast");
        }
        Self {
            api_key,
            api_url,
            model,
            client: Client::new(),
        }
    }

    fn classify_transport_error(e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout
        } else if e.is_connect() {
            LlmError::ConnectionReset
        } else {
            LlmError::Api(e.to_string())
        }
    }
}

#[async_trait]
impl ChatCompletion for DeepSeekProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &GenerationParams,
    ) -> Result<String, LlmError> {
        let api_key = self.api_key.as_ref().ok_or(LlmError::MissingCredentials)?;

        let response = self
            .client
            .post(&self.api_url)
            .timeout(REQUEST_TIMEOUT)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&json!({
                "model": self.model,
                "messages": messages,
                "temperature": params.temperature,
                "max_tokens": params.max_tokens,
            }))
            .send()
            .await
            .map_err(Self::classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::Auth,
                StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimit,
                _ => LlmError::Api(format!("status {}: {}", status, body)),
            });
        }

        let response_json: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Api(format!("invalid response body: {}", e)))?;

        if let Some(error) = response_json.get("error") {
            return Err(LlmError::Api(error.to_string()));
        }

        response_json
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                let debug_json = serde_json::to_string(&response_json).unwrap_or_default();
                LlmError::Api(format!("unexpected response format: {}", debug_json))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_complete_without_credentials_fails_fast() {
        let provider = DeepSeekProvider::new(
            None,
            "https://api.deepseek.com/v1/chat/completions".to_string(),
            "deepseek-chat".to_string(),
        );
        let messages = vec![ChatMessage::user("hello")];
        let err = provider
            .complete(&messages, &GenerationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::MissingCredentials));
    }
}
