use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::chatbot::relevance::is_relevant;
use crate::chatbot::retrieval::{is_statistics_question, RetrievalOrchestrator};
use crate::chatbot::{AnswerSource, ChatReply, Language};
use crate::knowledge::{ContextSource, ConversationRecord, KnowledgeStore, RetrievedContext};
use crate::providers::traits::{ChatCompletion, ChatMessage, EmbeddingProvider, GenerationParams};

/// Always in English regardless of the requested language.
const REFUSAL_MESSAGE: &str = "I can only help with questions about working in Malaysia: wages, \
    employment contracts, documents, workplace safety, and migrant worker statistics. Please ask \
    me something in those areas, or try the wage calculator.";

const APOLOGY_MESSAGE: &str = "Sorry, we are having technical difficulties answering right now. \
    Please try again in a moment, or use the wage calculator for salary questions.";

lazy_static! {
    static ref CITATION_MARKER: Regex = Regex::new(r"\[Source: ([^\]]+)\]").unwrap();
}

/// Questions the LLM fallback knows how to route to a matching context.
const FALLBACK_BUCKETS: &[(&str, &[&str])] = &[
    (
        "overtime",
        &["overtime", "lebih masa", "ओभरटाइम", "ওভারটাইম", "အချိန်ပို"],
    ),
    (
        "wage",
        &[
            "wage", "salary", "pay", "gaji", "upah", "तलब", "ज्याला", "বেতন", "মজুরি",
            "လစာ", "လုပ်ခ",
        ],
    ),
    (
        "leave",
        &["leave", "holiday", "cuti", "बिदा", "ছুটি", "ခွင့်"],
    ),
    (
        "statistics",
        &[
            "statistic", "statistik", "how many", "berapa", "तथ्याङ्क", "পরিসংখ্যান",
            "စာရင်းအင်း",
        ],
    ),
];

pub struct ChatbotService {
    provider: Arc<dyn ChatCompletion>,
    store: Arc<dyn KnowledgeStore>,
    retrieval: RetrievalOrchestrator,
}

impl ChatbotService {
    pub fn new(
        provider: Arc<dyn ChatCompletion>,
        store: Arc<dyn KnowledgeStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        insights_url: Option<String>,
    ) -> Self {
        let retrieval = RetrievalOrchestrator::new(store.clone(), embedder, insights_url);
        Self {
            provider,
            store,
            retrieval,
        }
    }

    /// Answer a question. Never errors: every failure mode degrades to a
    /// usable reply with an honest source classification.
    pub async fn chat(
        &self,
        question: &str,
        language: Language,
        session_id: Option<String>,
    ) -> ChatReply {
        let started = Instant::now();

        if !is_relevant(question) {
            let reply = ChatReply {
                answer: REFUSAL_MESSAGE.to_string(),
                source: AnswerSource::OffTopic,
                citations: Vec::new(),
                elapsed_ms: started.elapsed().as_millis() as u64,
            };
            self.log_conversation(question, language, session_id, &reply);
            return reply;
        }

        let contexts = self.retrieval.retrieve(question).await;

        // Statistics answers must carry exact figures, so the LLM is never
        // allowed to paraphrase them.
        if is_statistics_question(question) {
            let stats: Vec<&RetrievedContext> = contexts
                .iter()
                .filter(|c| c.source == ContextSource::MigrationStatistics)
                .collect();
            if !stats.is_empty() {
                let joined = stats
                    .iter()
                    .map(|c| c.content.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                let mut citations = Vec::new();
                for context in &stats {
                    if !context.reference.is_empty() && !citations.contains(&context.reference) {
                        citations.push(context.reference.clone());
                    }
                }
                let reply = ChatReply {
                    answer: format!("Based on our database: {}", joined),
                    source: AnswerSource::KnowledgeBase,
                    citations,
                    elapsed_ms: started.elapsed().as_millis() as u64,
                };
                self.log_conversation(question, language, session_id, &reply);
                return reply;
            }
        }

        let messages = build_messages(question, language, &contexts);
        let reply = match self
            .provider
            .complete(&messages, &GenerationParams::default())
            .await
        {
            Ok(answer) => {
                let citations = extract_citations(&answer, &contexts);
                let source = if contexts.is_empty() {
                    AnswerSource::GeneralKnowledge
                } else {
                    AnswerSource::KnowledgeBase
                };
                ChatReply {
                    answer,
                    source,
                    citations,
                    elapsed_ms: started.elapsed().as_millis() as u64,
                }
            }
            Err(e) => {
                log::warn!("LLM call failed ({}), synthesizing fallback answer", e);
                if contexts.is_empty() {
                    ChatReply {
                        answer: APOLOGY_MESSAGE.to_string(),
                        source: AnswerSource::GeneralKnowledge,
                        citations: Vec::new(),
                        elapsed_ms: started.elapsed().as_millis() as u64,
                    }
                } else {
                    let (answer, citations) = fallback_answer(question, &contexts);
                    ChatReply {
                        answer,
                        source: AnswerSource::KnowledgeBase,
                        citations,
                        elapsed_ms: started.elapsed().as_millis() as u64,
                    }
                }
            }
        };

        self.log_conversation(question, language, session_id, &reply);
        reply
    }

    /// Fire-and-forget: the reply has already been built when this spawns,
    /// and a logging failure must never reach the caller.
    fn log_conversation(
        &self,
        question: &str,
        language: Language,
        session_id: Option<String>,
        reply: &ChatReply,
    ) {
        let record = ConversationRecord {
            session_id: session_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            question: question.to_string(),
            answer: reply.answer.clone(),
            source: reply.source.as_str().to_string(),
            citations: reply.citations.clone(),
            language: language.code().to_string(),
            response_time_ms: reply.elapsed_ms,
            created_at: Utc::now(),
        };
        let store = self.store.clone();
        tokio::spawn(async move {
            if let Err(e) = store.log_conversation(&record).await {
                log::warn!("failed to log conversation: {}", e);
            }
        });
    }
}

fn build_messages(
    question: &str,
    language: Language,
    contexts: &[RetrievedContext],
) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(format!(
        "You are PekerjaAI, an assistant for migrant workers in Malaysia. \
         Respond entirely in {}. Do not use markdown, bullet points, or asterisk \
         formatting; write plain sentences. Use the provided context as your primary \
         source. If you answer from general knowledge instead of the provided context, \
         label the answer with \"(General Information)\". Only answer questions about \
         labor rights, wages, employment documents, workplace safety, and migrant \
         worker statistics in Malaysia.",
        language.english_name()
    ))];

    if !contexts.is_empty() {
        let mut listing = String::from(
            "Knowledge base entries retrieved for this question. Cite an entry you use \
             with its inline marker exactly as shown.\n",
        );
        for (i, context) in contexts.iter().enumerate() {
            if context.reference.is_empty() {
                listing.push_str(&format!("{}. {}\n", i + 1, context.content));
            } else {
                listing.push_str(&format!(
                    "{}. {} [Source: {}]\n",
                    i + 1,
                    context.content,
                    context.reference
                ));
            }
        }
        messages.push(ChatMessage::system(listing));
    }

    messages.push(ChatMessage::user(question));
    messages
}

/// Inline markers in order of first appearance, duplicates preserved,
/// restricted to references that were actually supplied to the prompt.
fn extract_citations(answer: &str, contexts: &[RetrievedContext]) -> Vec<String> {
    CITATION_MARKER
        .captures_iter(answer)
        .map(|captures| captures[1].to_string())
        .filter(|label| contexts.iter().any(|c| &c.reference == label))
        .collect()
}

/// Templated answer used when the LLM is unavailable but retrieval found
/// something: route by topic bucket, else hand back the top context.
fn fallback_answer(question: &str, contexts: &[RetrievedContext]) -> (String, Vec<String>) {
    let normalized = question.trim().to_lowercase();
    for (topic, terms) in FALLBACK_BUCKETS {
        if !terms.iter().any(|t| normalized.contains(t)) {
            continue;
        }
        if let Some(context) = contexts
            .iter()
            .find(|c| c.content.to_lowercase().contains(topic) || terms.iter().any(|t| c.content.to_lowercase().contains(t)))
        {
            let citations = if context.reference.is_empty() {
                Vec::new()
            } else {
                vec![context.reference.clone()]
            };
            return (
                format!("Based on our records about {}: {}", topic, context.content),
                citations,
            );
        }
    }

    let top = &contexts[0];
    let citations = if top.reference.is_empty() {
        Vec::new()
    } else {
        vec![top.reference.clone()]
    };
    (top.content.clone(), citations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::knowledge::StoreError;
    use crate::providers::traits::LlmError;

    fn context(reference: &str, content: &str, source: ContextSource) -> RetrievedContext {
        RetrievedContext {
            id: reference.to_lowercase().replace(' ', "-"),
            content: content.to_string(),
            reference: reference.to_string(),
            source,
        }
    }

    struct MockProvider {
        calls: AtomicUsize,
        result: Result<String, LlmError>,
    }

    impl MockProvider {
        fn ok(answer: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result: Ok(answer.to_string()),
            }
        }

        fn failing(error: LlmError) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result: Err(error),
            }
        }
    }

    #[async_trait]
    impl ChatCompletion for MockProvider {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _params: &GenerationParams,
        ) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(answer) => Ok(answer.clone()),
                Err(LlmError::Timeout) => Err(LlmError::Timeout),
                Err(LlmError::Auth) => Err(LlmError::Auth),
                Err(LlmError::RateLimit) => Err(LlmError::RateLimit),
                Err(LlmError::ConnectionReset) => Err(LlmError::ConnectionReset),
                Err(LlmError::MissingCredentials) => Err(LlmError::MissingCredentials),
                Err(LlmError::Api(msg)) => Err(LlmError::Api(msg.clone())),
            }
        }
    }

    #[derive(Default)]
    struct MockStore {
        search_calls: AtomicUsize,
        vector_results: Vec<RetrievedContext>,
        statistics_results: Vec<RetrievedContext>,
        log_calls: AtomicUsize,
        log_fails: bool,
    }

    #[async_trait]
    impl KnowledgeStore for MockStore {
        async fn match_knowledge(
            &self,
            _embedding: &[f32],
            _threshold: f32,
            _limit: u32,
        ) -> Result<Vec<RetrievedContext>, StoreError> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.vector_results.clone())
        }

        async fn search_rights_guides(
            &self,
            _term: &str,
            _limit: u32,
        ) -> Result<Vec<RetrievedContext>, StoreError> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn search_faqs(
            &self,
            _term: &str,
            _limit: u32,
        ) -> Result<Vec<RetrievedContext>, StoreError> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn search_employment_laws(
            &self,
            _term: &str,
            _limit: u32,
        ) -> Result<Vec<RetrievedContext>, StoreError> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn search_statistics(
            &self,
            _term: &str,
            _limit: u32,
        ) -> Result<Vec<RetrievedContext>, StoreError> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.statistics_results.clone())
        }

        async fn statistics_overview(
            &self,
            _limit: u32,
        ) -> Result<Vec<RetrievedContext>, StoreError> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.statistics_results.clone())
        }

        async fn log_conversation(&self, _record: &ConversationRecord) -> Result<(), StoreError> {
            self.log_calls.fetch_add(1, Ordering::SeqCst);
            if self.log_fails {
                return Err(StoreError::Api {
                    status: 500,
                    body: "log sink down".to_string(),
                });
            }
            Ok(())
        }
    }

    struct MockEmbedder;

    #[async_trait]
    impl EmbeddingProvider for MockEmbedder {
        async fn embed(&self, _text: &str) -> anyhow::Result<Vec<f32>> {
            Ok(vec![0.1; 8])
        }
    }

    fn service(
        provider: Arc<MockProvider>,
        store: Arc<MockStore>,
    ) -> ChatbotService {
        ChatbotService::new(provider, store, Arc::new(MockEmbedder), None)
    }

    #[tokio::test]
    async fn test_off_topic_question_short_circuits() {
        let provider = Arc::new(MockProvider::ok("unused"));
        let store = Arc::new(MockStore::default());
        let chatbot = service(provider.clone(), store.clone());

        let reply = chatbot
            .chat(
                "Tell me your favourite football team and the latest match score please",
                Language::En,
                None,
            )
            .await;

        assert_eq!(reply.source, AnswerSource::OffTopic);
        assert!(reply.citations.is_empty());
        assert_eq!(reply.answer, REFUSAL_MESSAGE);
        // Neither retrieval nor the LLM was consulted.
        assert_eq!(store.search_calls.load(Ordering::SeqCst), 0);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_statistics_answer_keeps_exact_figures() {
        let provider = Arc::new(MockProvider::ok("paraphrased nonsense"));
        let store = Arc::new(MockStore {
            statistics_results: vec![context(
                "Migration statistics 2023",
                "In 2023, Johor recorded 123456 documented migrant workers from Indonesia.",
                ContextSource::MigrationStatistics,
            )],
            ..Default::default()
        });
        let chatbot = service(provider.clone(), store.clone());

        let reply = chatbot
            .chat("How many migrant workers are in Johor?", Language::En, None)
            .await;

        assert_eq!(reply.source, AnswerSource::KnowledgeBase);
        assert!(reply.answer.starts_with("Based on our database:"));
        assert!(reply.answer.contains("123456"));
        assert_eq!(reply.citations, vec!["Migration statistics 2023"]);
        // The LLM never saw a statistics question.
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_citations_in_order_with_duplicates() {
        let contexts = vec![
            context("Employment Act 1955, Section 60A", "Overtime is capped.", ContextSource::EmploymentLaw),
            context("FAQ: overtime", "Q: overtime? A: 1.5x rate.", ContextSource::Faq),
        ];
        let provider = Arc::new(MockProvider::ok(
            "Overtime pays 1.5x [Source: FAQ: overtime]. The cap is set by law \
             [Source: Employment Act 1955, Section 60A] and repeated here \
             [Source: FAQ: overtime]. Unknown marker [Source: Wikipedia] is dropped.",
        ));
        let store = Arc::new(MockStore {
            vector_results: contexts,
            ..Default::default()
        });
        let chatbot = service(provider, store);

        let reply = chatbot
            .chat("What is the overtime rate for my salary?", Language::En, None)
            .await;

        assert_eq!(reply.source, AnswerSource::KnowledgeBase);
        assert_eq!(
            reply.citations,
            vec![
                "FAQ: overtime",
                "Employment Act 1955, Section 60A",
                "FAQ: overtime",
            ]
        );
    }

    #[tokio::test]
    async fn test_llm_failure_with_context_yields_fallback() {
        for error in [
            LlmError::Timeout,
            LlmError::Auth,
            LlmError::RateLimit,
            LlmError::ConnectionReset,
            LlmError::MissingCredentials,
        ] {
            let provider = Arc::new(MockProvider::failing(error));
            let store = Arc::new(MockStore {
                vector_results: vec![context(
                    "Employment Act 1955, Section 60A",
                    "Overtime must be paid at 1.5 times the hourly rate.",
                    ContextSource::EmploymentLaw,
                )],
                ..Default::default()
            });
            let chatbot = service(provider, store);

            let reply = chatbot
                .chat("How much overtime pay should I get?", Language::En, None)
                .await;

            assert_eq!(reply.source, AnswerSource::KnowledgeBase);
            assert!(!reply.answer.is_empty());
            assert!(reply.answer.contains("Overtime must be paid"));
            assert_eq!(reply.citations, vec!["Employment Act 1955, Section 60A"]);
        }
    }

    #[tokio::test]
    async fn test_llm_failure_without_context_yields_apology() {
        let provider = Arc::new(MockProvider::failing(LlmError::Timeout));
        let store = Arc::new(MockStore::default());
        let chatbot = service(provider, store);

        let reply = chatbot
            .chat("What documents do I need for a work permit?", Language::En, None)
            .await;

        assert_eq!(reply.source, AnswerSource::GeneralKnowledge);
        assert_eq!(reply.answer, APOLOGY_MESSAGE);
        assert!(reply.citations.is_empty());
    }

    #[tokio::test]
    async fn test_general_knowledge_classification_without_context() {
        let provider = Arc::new(MockProvider::ok(
            "(General Information) Keep copies of your permit.",
        ));
        let store = Arc::new(MockStore::default());
        let chatbot = service(provider, store);

        let reply = chatbot
            .chat("What documents should I keep for my permit?", Language::En, None)
            .await;

        assert_eq!(reply.source, AnswerSource::GeneralKnowledge);
        assert!(reply.citations.is_empty());
    }

    #[tokio::test]
    async fn test_logging_failure_does_not_affect_reply() {
        let provider = Arc::new(MockProvider::ok("Your salary is protected by law."));
        let store = Arc::new(MockStore {
            log_fails: true,
            ..Default::default()
        });
        let chatbot = service(provider, store.clone());

        let reply = chatbot
            .chat("Is my salary protected?", Language::En, Some("session-1".to_string()))
            .await;
        assert!(!reply.answer.is_empty());

        // Give the detached logging task a chance to run and fail.
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(store.log_calls.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_build_messages_numbered_listing() {
        let contexts = vec![
            context("Rights guide: Passports", "Your employer may not keep your passport.", ContextSource::RightsGuide),
            RetrievedContext {
                id: "no-ref".to_string(),
                content: "Unlabeled entry.".to_string(),
                reference: String::new(),
                source: ContextSource::Faq,
            },
        ];
        let messages = build_messages("Can my employer keep my passport?", Language::Ms, &contexts);

        assert_eq!(messages.len(), 3);
        assert!(messages[0].content.contains("Malay"));
        assert!(messages[1].content.contains("1. Your employer may not keep your passport. [Source: Rights guide: Passports]"));
        assert!(messages[1].content.contains("2. Unlabeled entry.\n"));
        assert_eq!(messages[2].content, "Can my employer keep my passport?");
    }

    #[test]
    fn test_extract_citations_empty_when_no_contexts() {
        let citations = extract_citations("Answer citing [Source: Anything]", &[]);
        assert!(citations.is_empty());
    }
}
