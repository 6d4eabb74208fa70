pub mod store;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use store::RestKnowledgeStore;

/// Knowledge category a retrieved snippet came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextSource {
    RightsGuide,
    Faq,
    EmploymentLaw,
    MigrationStatistics,
}

/// One snippet of knowledge handed to the answer synthesizer. Built fresh
/// per question and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedContext {
    pub id: String,
    pub content: String,
    /// Citation label shown to the user; may be empty.
    pub reference: String,
    pub source: ContextSource,
}

/// Write-only conversation log row. Never read back by the serving path.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationRecord {
    pub session_id: String,
    pub question: String,
    pub answer: String,
    pub source: String,
    pub citations: Vec<String>,
    pub language: String,
    pub response_time_ms: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store rejected request: status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("could not decode store response: {0}")]
    Decode(String),
}

/// Seam over the external Postgres-backed knowledge store. The live
/// implementation is [`RestKnowledgeStore`]; tests substitute mocks.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Vector-similarity procedure: ranked rows at or above `threshold`.
    async fn match_knowledge(
        &self,
        embedding: &[f32],
        threshold: f32,
        limit: u32,
    ) -> Result<Vec<RetrievedContext>, StoreError>;

    async fn search_rights_guides(
        &self,
        term: &str,
        limit: u32,
    ) -> Result<Vec<RetrievedContext>, StoreError>;

    async fn search_faqs(&self, term: &str, limit: u32)
        -> Result<Vec<RetrievedContext>, StoreError>;

    async fn search_employment_laws(
        &self,
        term: &str,
        limit: u32,
    ) -> Result<Vec<RetrievedContext>, StoreError>;

    async fn search_statistics(
        &self,
        term: &str,
        limit: u32,
    ) -> Result<Vec<RetrievedContext>, StoreError>;

    /// Top states by recorded worker count, for statistics questions that
    /// name no particular state.
    async fn statistics_overview(&self, limit: u32) -> Result<Vec<RetrievedContext>, StoreError>;

    async fn log_conversation(&self, record: &ConversationRecord) -> Result<(), StoreError>;
}
