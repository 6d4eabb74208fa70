use std::env;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub knowledge_api_url: String,
    pub knowledge_api_key: String,
    pub deepseek_api_key: Option<String>,
    pub deepseek_api_url: String,
    pub deepseek_model: String,
    pub embedding_api_url: String,
    pub embedding_api_key: String,
    pub embedding_model: String,
    pub insights_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let knowledge_api_url = env::var("KNOWLEDGE_API_URL")
            .unwrap_or_else(|_| "http://localhost:54321".to_string());
        let knowledge_api_key = env::var("KNOWLEDGE_API_KEY").unwrap_or_default();

        // Missing chat credential is survivable: the chatbot degrades to
        // retrieval-only fallback answers. Warn loudly instead of aborting.
        let deepseek_api_key = match env::var("DEEPSEEK_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Some(key),
            _ => {
                log::warn!(
                    "DEEPSEEK_API_KEY not set; chatbot will answer from retrieved context only"
                );
                None
            }
        };

        let deepseek_api_url = env::var("DEEPSEEK_API_URL")
            .unwrap_or_else(|_| "https://api.deepseek.com/v1/chat/completions".to_string());
        let deepseek_model =
            env::var("DEEPSEEK_MODEL").unwrap_or_else(|_| "deepseek-chat".to_string());

        let embedding_api_url = env::var("EMBEDDING_API_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1/embeddings".to_string());
        let embedding_api_key = env::var("EMBEDDING_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .unwrap_or_default();
        let embedding_model =
            env::var("EMBEDDING_MODEL").unwrap_or_else(|_| "text-embedding-ada-002".to_string());

        let insights_url = env::var("INSIGHTS_API_URL").ok();

        Self {
            knowledge_api_url,
            knowledge_api_key,
            deepseek_api_key,
            deepseek_api_url,
            deepseek_model,
            embedding_api_url,
            embedding_api_key,
            embedding_model,
            insights_url,
        }
    }
}
