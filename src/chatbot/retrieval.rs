use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::knowledge::{ContextSource, KnowledgeStore, RetrievedContext};
use crate::providers::traits::EmbeddingProvider;

/// Soft bound on the vector-search branch. The losing branch of the race is
/// left running; its result is simply never observed.
const VECTOR_SEARCH_TIMEOUT: Duration = Duration::from_millis(3000);
const SIMILARITY_THRESHOLD: f32 = 0.7;
const VECTOR_RESULT_LIMIT: u32 = 10;

const RIGHTS_GUIDE_LIMIT: u32 = 3;
const FAQ_LIMIT: u32 = 3;
const EMPLOYMENT_LAW_LIMIT: u32 = 2;
const STATISTICS_LIMIT: u32 = 5;
const STATISTICS_OVERVIEW_LIMIT: u32 = 10;

const MALAYSIAN_STATES: &[&str] = &[
    "johor",
    "kedah",
    "kelantan",
    "kuala lumpur",
    "labuan",
    "melaka",
    "malacca",
    "negeri sembilan",
    "pahang",
    "penang",
    "pulau pinang",
    "perak",
    "perlis",
    "putrajaya",
    "sabah",
    "sarawak",
    "selangor",
    "terengganu",
];

const STATISTICS_MARKERS: &[&str] = &[
    "statistic",
    "statistik",
    "how many",
    "number of",
    "berapa ramai",
    "bilangan",
    "jumlah pekerja",
    "migrant worker",
    "migrant workers",
    "pekerja asing",
    "pekerja migran",
    "तथ्याङ्क",
    "कति कामदार",
    "পরিসংখ্যান",
    "কতজন শ্রমিক",
    "စာရင်းအင်း",
];

/// Statistics questions need exact counts; embeddings may rank the right
/// row below the threshold, so these skip vector search entirely.
pub fn is_statistics_question(question: &str) -> bool {
    let normalized = question.trim().to_lowercase();
    if STATISTICS_MARKERS.iter().any(|m| normalized.contains(m)) {
        return true;
    }
    let mentions_workers = normalized.contains("worker")
        || normalized.contains("pekerja")
        || normalized.contains("कामदार")
        || normalized.contains("শ্রমিক")
        || normalized.contains("အလုပ်သမား");
    mentions_workers && detect_state(&normalized).is_some()
}

pub fn detect_state(normalized_question: &str) -> Option<&'static str> {
    MALAYSIAN_STATES
        .iter()
        .find(|state| normalized_question.contains(*state))
        .copied()
}

/// Row shape returned by the sibling insights endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct InsightRow {
    pub state: String,
    pub origin_country: String,
    pub worker_count: i64,
    pub year: i32,
}

pub fn filter_insight_rows(rows: Vec<InsightRow>, term: &str) -> Vec<RetrievedContext> {
    let term = term.to_lowercase();
    rows.into_iter()
        .filter(|row| {
            term.contains(&row.state.to_lowercase())
                || term.contains(&row.origin_country.to_lowercase())
                || row.state.to_lowercase().contains(&term)
        })
        .map(|row| RetrievedContext {
            id: format!("insight-{}-{}", row.state.to_lowercase(), row.year),
            content: format!(
                "In {}, {} recorded {} documented migrant workers from {}.",
                row.year, row.state, row.worker_count, row.origin_country
            ),
            reference: format!("Migration statistics {}", row.year),
            source: ContextSource::MigrationStatistics,
        })
        .collect()
}

pub struct RetrievalOrchestrator {
    store: Arc<dyn KnowledgeStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    insights_url: Option<String>,
    http: reqwest::Client,
}

impl RetrievalOrchestrator {
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        insights_url: Option<String>,
    ) -> Self {
        Self {
            store,
            embedder,
            insights_url,
            http: reqwest::Client::new(),
        }
    }

    /// Bounded-latency retrieval. Never errors: any irrecoverable failure
    /// yields an empty context list.
    pub async fn retrieve(&self, question: &str) -> Vec<RetrievedContext> {
        if is_statistics_question(question) {
            return self.keyword_search(question).await;
        }

        let store = self.store.clone();
        let embedder = self.embedder.clone();
        let query = question.to_string();
        let mut vector_branch = tokio::spawn(async move {
            let embedding = embedder.embed(&query).await?;
            store
                .match_knowledge(&embedding, SIMILARITY_THRESHOLD, VECTOR_RESULT_LIMIT)
                .await
                .map_err(anyhow::Error::from)
        });

        tokio::select! {
            joined = &mut vector_branch => {
                match joined {
                    Ok(Ok(contexts)) if !contexts.is_empty() => contexts,
                    Ok(Ok(_)) => self.keyword_search(question).await,
                    Ok(Err(e)) => {
                        log::warn!("vector search failed, using keyword search: {}", e);
                        self.keyword_search(question).await
                    }
                    Err(e) => {
                        log::warn!("vector search task failed, using keyword search: {}", e);
                        self.keyword_search(question).await
                    }
                }
            }
            _ = tokio::time::sleep(VECTOR_SEARCH_TIMEOUT) => {
                log::warn!("vector search exceeded {}ms, returning no context", VECTOR_SEARCH_TIMEOUT.as_millis());
                Vec::new()
            }
        }
    }

    /// Independent substring searches against the four knowledge
    /// categories. Per-category failures are logged and skipped.
    async fn keyword_search(&self, question: &str) -> Vec<RetrievedContext> {
        let term = question.trim().to_lowercase();
        let mut contexts = Vec::new();

        let (guides, faqs, laws) = futures::join!(
            self.store.search_rights_guides(&term, RIGHTS_GUIDE_LIMIT),
            self.store.search_faqs(&term, FAQ_LIMIT),
            self.store.search_employment_laws(&term, EMPLOYMENT_LAW_LIMIT),
        );
        match guides {
            Ok(mut rows) => contexts.append(&mut rows),
            Err(e) => log::warn!("rights guide search failed: {}", e),
        }
        match faqs {
            Ok(mut rows) => contexts.append(&mut rows),
            Err(e) => log::warn!("FAQ search failed: {}", e),
        }
        match laws {
            Ok(mut rows) => contexts.append(&mut rows),
            Err(e) => log::warn!("employment law search failed: {}", e),
        }

        let statistics = match detect_state(&term) {
            Some(state) => self.store.search_statistics(state, STATISTICS_LIMIT).await,
            None if is_statistics_question(question) => {
                self.store.statistics_overview(STATISTICS_OVERVIEW_LIMIT).await
            }
            None => self.store.search_statistics(&term, STATISTICS_LIMIT).await,
        };
        match statistics {
            Ok(mut rows) => contexts.append(&mut rows),
            Err(e) => {
                log::warn!("statistics search failed, trying insights endpoint: {}", e);
                contexts.append(&mut self.insights_fallback(&term).await);
            }
        }

        contexts
    }

    /// Last-resort statistics source: the public insights endpoint, with
    /// rows filtered by substring against the search term.
    async fn insights_fallback(&self, term: &str) -> Vec<RetrievedContext> {
        let Some(url) = &self.insights_url else {
            return Vec::new();
        };
        let rows = match self.http.get(url).send().await {
            Ok(response) => match response.json::<Vec<InsightRow>>().await {
                Ok(rows) => rows,
                Err(e) => {
                    log::warn!("insights endpoint returned invalid body: {}", e);
                    return Vec::new();
                }
            },
            Err(e) => {
                log::warn!("insights endpoint unreachable: {}", e);
                return Vec::new();
            }
        };
        filter_insight_rows(rows, term)
    }
}
