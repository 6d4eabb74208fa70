use clap::Parser;
use dotenv::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use pekerja_backend::api;
use pekerja_backend::chatbot;
use pekerja_backend::config::Config;
use pekerja_backend::knowledge::RestKnowledgeStore;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(long, default_value = "3000")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = Config::from_env();

    let chatbot = chatbot::global_chatbot(&config).await;
    let store = Arc::new(RestKnowledgeStore::new(
        config.knowledge_api_url.clone(),
        config.knowledge_api_key.clone(),
    ));

    let app = api::create_api(chatbot, store);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    log::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
