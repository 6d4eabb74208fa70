use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::providers::traits::EmbeddingProvider;

pub const EMBEDDING_DIM: usize = 1536;

/// Group size and pacing for the offline population path. The serving path
/// embeds one question at a time and never batches.
const BATCH_SIZE: usize = 16;
const BATCH_DELAY: Duration = Duration::from_millis(500);

#[derive(Clone)]
pub struct EmbeddingClient {
    api_url: String,
    api_key: String,
    model: String,
    client: Client,
}

impl EmbeddingClient {
    pub fn new(api_url: String, api_key: String, model: String) -> Self {
        Self {
            api_url,
            api_key,
            model,
            client: Client::new(),
        }
    }

    pub async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&json!({
                "model": self.model,
                "input": text,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("embedding request failed: {} {}", status, body));
        }

        let response_json: Value = response.json().await?;
        let numbers: Vec<f32> = response_json
            .get("data")
            .and_then(|data| data.get(0))
            .and_then(|row| row.get("embedding"))
            .and_then(|emb| emb.as_array())
            .ok_or_else(|| anyhow!("embedding response missing data[0].embedding"))?
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect();

        if numbers.len() != EMBEDDING_DIM {
            return Err(anyhow!(
                "embedding has wrong size: {} (expected {})",
                numbers.len(),
                EMBEDDING_DIM
            ));
        }

        Ok(normalize(numbers))
    }

    /// Sequential fixed-size batches with a small pause between them, to keep
    /// the offline population job from hammering the provider.
    pub async fn generate_batch_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for (i, group) in texts.chunks(BATCH_SIZE).enumerate() {
            if i > 0 {
                tokio::time::sleep(BATCH_DELAY).await;
            }
            for text in group {
                embeddings.push(self.generate_embedding(text).await?);
            }
        }
        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for EmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.generate_embedding(text).await
    }
}

fn normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let magnitude = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for x in vector.iter_mut() {
            *x /= magnitude;
        }
    }
    vector
}
