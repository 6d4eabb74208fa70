//! Offline embedding population: embeds knowledge rows that do not have a
//! vector yet and writes the vectors back. Not part of the serving path.

use dotenv::dotenv;

use pekerja_backend::config::Config;
use pekerja_backend::knowledge::RestKnowledgeStore;
use pekerja_backend::llm::EmbeddingClient;

const FETCH_LIMIT: u32 = 200;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let store = RestKnowledgeStore::new(config.knowledge_api_url, config.knowledge_api_key);
    let embedder = EmbeddingClient::new(
        config.embedding_api_url,
        config.embedding_api_key,
        config.embedding_model,
    );

    let mut total = 0usize;
    loop {
        let rows = store.fetch_unembedded(FETCH_LIMIT).await?;
        if rows.is_empty() {
            break;
        }

        let texts: Vec<String> = rows.iter().map(|(_, content)| content.clone()).collect();
        let embeddings = embedder.generate_batch_embeddings(&texts).await?;

        for ((id, _), embedding) in rows.iter().zip(embeddings.iter()) {
            store.update_embedding(id, embedding).await?;
            total += 1;
        }
        log::info!("embedded {} rows so far", total);
    }

    log::info!("done, {} rows embedded", total);
    Ok(())
}
