pub mod chat;
pub mod relevance;
pub mod retrieval;
pub mod wage;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::config::Config;
use crate::knowledge::RestKnowledgeStore;
use crate::llm::EmbeddingClient;
use crate::providers::deepseek::DeepSeekProvider;

pub use chat::ChatbotService;
pub use retrieval::RetrievalOrchestrator;
pub use wage::{calculate_wage, WageCalculation};

/// Languages the platform serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    En,
    #[serde(rename = "ms")]
    Ms,
    #[serde(rename = "ne")]
    Ne,
    #[serde(rename = "bn")]
    Bn,
    #[serde(rename = "my")]
    My,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ms => "ms",
            Language::Ne => "ne",
            Language::Bn => "bn",
            Language::My => "my",
        }
    }

    pub fn english_name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Ms => "Malay (Bahasa Melayu)",
            Language::Ne => "Nepali",
            Language::Bn => "Bengali",
            Language::My => "Burmese",
        }
    }
}

/// Where the answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    KnowledgeBase,
    GeneralKnowledge,
    OffTopic,
}

impl AnswerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerSource::KnowledgeBase => "knowledge_base",
            AnswerSource::GeneralKnowledge => "general_knowledge",
            AnswerSource::OffTopic => "off_topic",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub answer: String,
    pub source: AnswerSource,
    pub citations: Vec<String>,
    pub elapsed_ms: u64,
}

static CHATBOT: OnceCell<Arc<ChatbotService>> = OnceCell::const_new();

/// Process-wide chatbot instance. The `OnceCell` guard makes concurrent
/// first calls initialize exactly once.
pub async fn global_chatbot(config: &Config) -> Arc<ChatbotService> {
    CHATBOT
        .get_or_init(|| async {
            let store = Arc::new(RestKnowledgeStore::new(
                config.knowledge_api_url.clone(),
                config.knowledge_api_key.clone(),
            ));
            let embedder = Arc::new(EmbeddingClient::new(
                config.embedding_api_url.clone(),
                config.embedding_api_key.clone(),
                config.embedding_model.clone(),
            ));
            let provider = Arc::new(DeepSeekProvider::new(
                config.deepseek_api_key.clone(),
                config.deepseek_api_url.clone(),
                config.deepseek_model.clone(),
            ));
            Arc::new(ChatbotService::new(
                provider,
                store.clone(),
                embedder,
                config.insights_url.clone(),
            ))
        })
        .await
        .clone()
}
