use finance_chat_orchestrator::{
    agent::ChatOrchestrator,
    api::start_server,
    data::data_store_from_env,
    llm::GeminiChatClient,
    tools::HttpToolClient,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    if std::env::var("GEMINI_API_KEY").is_err() {
        eprintln!("⚠️  GEMINI_API_KEY not set in .env");
        eprintln!("📌 Chat turns will fail with a configuration message until it is set");
    }

    let api_port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("API_PORT"))
        .unwrap_or_else(|_| "8080".to_string())
        .parse()?;

    info!("🚀 Finance Chat Orchestrator - API Server");
    info!("📍 Port: {}", api_port);

    // Create components
    let store = data_store_from_env();
    let chat = Arc::new(GeminiChatClient::from_env());
    let tools = Arc::new(HttpToolClient::from_env());

    let orchestrator = Arc::new(ChatOrchestrator::new(chat, tools, store));

    info!("✅ Orchestrator initialized");
    info!("📡 Starting API server...");

    start_server(orchestrator, api_port).await?;

    Ok(())
}
