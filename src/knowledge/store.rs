use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::knowledge::{
    ContextSource, ConversationRecord, KnowledgeStore, RetrievedContext, StoreError,
};

/// PostgREST-style client for the knowledge database: one RPC for vector
/// similarity, `ilike` filters for keyword search, plain inserts for the
/// conversation log.
#[derive(Clone)]
pub struct RestKnowledgeStore {
    base_url: String,
    api_key: String,
    client: Client,
}

#[derive(Deserialize)]
struct MatchRow {
    id: serde_json::Value,
    content: String,
    #[serde(default)]
    reference: String,
    #[serde(default)]
    source: Option<ContextSource>,
}

#[derive(Deserialize)]
struct RightsGuideRow {
    id: serde_json::Value,
    title: String,
    content: String,
    #[serde(default)]
    reference: String,
}

#[derive(Deserialize)]
struct FaqRow {
    id: serde_json::Value,
    question: String,
    answer: String,
}

#[derive(Deserialize)]
struct EmploymentLawRow {
    id: serde_json::Value,
    section: String,
    title: String,
    description: String,
}

#[derive(Deserialize, Serialize)]
pub struct StatisticsRow {
    pub id: serde_json::Value,
    pub state: String,
    pub origin_country: String,
    pub worker_count: i64,
    pub year: i32,
}

#[derive(Deserialize)]
struct KnowledgeRow {
    id: serde_json::Value,
    content: String,
}

fn row_id(id: &serde_json::Value) -> String {
    match id {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// PostgREST treats commas and parentheses inside an `or=(...)` filter as
/// syntax, so the ILIKE operand must be double-quoted. Embedded quotes and
/// backslashes are stripped rather than escaped; they carry no meaning for
/// a substring search.
fn ilike_pattern(term: &str) -> String {
    let cleaned: String = term
        .chars()
        .filter(|c| *c != '"' && *c != '\\')
        .collect();
    format!("\"*{}*\"", cleaned)
}

fn or_ilike(fields: &[&str], term: &str) -> String {
    let pattern = ilike_pattern(term);
    let clauses: Vec<String> = fields
        .iter()
        .map(|field| format!("{}.ilike.{}", field, pattern))
        .collect();
    format!("({})", clauses.join(","))
}

fn match_context(row: MatchRow) -> Option<RetrievedContext> {
    let Some(source) = row.source else {
        log::warn!(
            "similarity row {} has no recognizable source tag, skipping",
            row_id(&row.id)
        );
        return None;
    };
    Some(RetrievedContext {
        id: row_id(&row.id),
        content: row.content,
        reference: row.reference,
        source,
    })
}

pub fn statistics_context(row: &StatisticsRow) -> RetrievedContext {
    RetrievedContext {
        id: row_id(&row.id),
        content: format!(
            "In {}, {} recorded {} documented migrant workers from {}.",
            row.year, row.state, row.worker_count, row.origin_country
        ),
        reference: format!("Migration statistics {}", row.year),
        source: ContextSource::MigrationStatistics,
    }
}

impl RestKnowledgeStore {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn get_rows<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, StoreError> {
        let response = self
            .client
            .get(self.table_url(table))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .query(query)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Raw statistics rows for the public insights endpoint.
    pub async fn fetch_statistics_rows(
        &self,
        search: Option<&str>,
        limit: u32,
    ) -> Result<Vec<StatisticsRow>, StoreError> {
        let mut query = vec![
            (
                "select",
                "id,state,origin_country,worker_count,year".to_string(),
            ),
            ("order", "worker_count.desc".to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(term) = search {
            query.push(("or", or_ilike(&["state", "origin_country"], term)));
        }
        self.get_rows("migration_statistics", &query).await
    }

    /// Rows whose embedding column is still null; used by the offline
    /// population binary only.
    pub async fn fetch_unembedded(&self, limit: u32) -> Result<Vec<(String, String)>, StoreError> {
        let rows: Vec<KnowledgeRow> = self
            .get_rows(
                "knowledge",
                &[
                    ("select", "id,content".to_string()),
                    ("embedding", "is.null".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| (row_id(&r.id), r.content))
            .collect())
    }

    pub async fn update_embedding(&self, id: &str, embedding: &[f32]) -> Result<(), StoreError> {
        let response = self
            .client
            .patch(self.table_url("knowledge"))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .query(&[("id", format!("eq.{}", id))])
            .json(&json!({ "embedding": embedding }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl KnowledgeStore for RestKnowledgeStore {
    async fn match_knowledge(
        &self,
        embedding: &[f32],
        threshold: f32,
        limit: u32,
    ) -> Result<Vec<RetrievedContext>, StoreError> {
        let response = self
            .client
            .post(format!("{}/rest/v1/rpc/match_knowledge", self.base_url))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "query_embedding": embedding,
                "match_threshold": threshold,
                "match_count": limit,
            }))
            .send()
            .await?;

        let rows: Vec<MatchRow> = Self::decode(response).await?;
        Ok(rows.into_iter().filter_map(match_context).collect())
    }

    async fn search_rights_guides(
        &self,
        term: &str,
        limit: u32,
    ) -> Result<Vec<RetrievedContext>, StoreError> {
        let rows: Vec<RightsGuideRow> = self
            .get_rows(
                "rights_guides",
                &[
                    ("select", "id,title,content,reference".to_string()),
                    ("or", or_ilike(&["title", "content"], term)),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let reference = if row.reference.is_empty() {
                    format!("Rights guide: {}", row.title)
                } else {
                    row.reference
                };
                RetrievedContext {
                    id: row_id(&row.id),
                    content: format!("{}: {}", row.title, row.content),
                    reference,
                    source: ContextSource::RightsGuide,
                }
            })
            .collect())
    }

    async fn search_faqs(
        &self,
        term: &str,
        limit: u32,
    ) -> Result<Vec<RetrievedContext>, StoreError> {
        let rows: Vec<FaqRow> = self
            .get_rows(
                "faqs",
                &[
                    ("select", "id,question,answer".to_string()),
                    ("or", or_ilike(&["question", "answer"], term)),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| RetrievedContext {
                id: row_id(&row.id),
                content: format!("Q: {} A: {}", row.question, row.answer),
                reference: format!("FAQ: {}", row.question),
                source: ContextSource::Faq,
            })
            .collect())
    }

    async fn search_employment_laws(
        &self,
        term: &str,
        limit: u32,
    ) -> Result<Vec<RetrievedContext>, StoreError> {
        let rows: Vec<EmploymentLawRow> = self
            .get_rows(
                "employment_laws",
                &[
                    ("select", "id,section,title,description".to_string()),
                    ("or", or_ilike(&["title", "description"], term)),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| RetrievedContext {
                id: row_id(&row.id),
                content: format!(
                    "Employment Act Section {} ({}): {}",
                    row.section, row.title, row.description
                ),
                reference: format!("Employment Act 1955, Section {}", row.section),
                source: ContextSource::EmploymentLaw,
            })
            .collect())
    }

    async fn search_statistics(
        &self,
        term: &str,
        limit: u32,
    ) -> Result<Vec<RetrievedContext>, StoreError> {
        let rows: Vec<StatisticsRow> = self
            .get_rows(
                "migration_statistics",
                &[
                    (
                        "select",
                        "id,state,origin_country,worker_count,year".to_string(),
                    ),
                    ("or", or_ilike(&["state", "origin_country"], term)),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(rows.iter().map(statistics_context).collect())
    }

    async fn statistics_overview(&self, limit: u32) -> Result<Vec<RetrievedContext>, StoreError> {
        let rows: Vec<StatisticsRow> = self
            .get_rows(
                "migration_statistics",
                &[
                    (
                        "select",
                        "id,state,origin_country,worker_count,year".to_string(),
                    ),
                    ("order", "worker_count.desc".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(rows.iter().map(statistics_context).collect())
    }

    async fn log_conversation(&self, record: &ConversationRecord) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.table_url("conversations"))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(record)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
