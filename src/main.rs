use tracing_subscriber::EnvFilter;

use math_router::api;
use math_router::config::Config;
use math_router::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("LLM provider: {} ({})", config.llm.provider, config.llm.base_url);
    if config.llm.provider == "openai" && config.llm.api_key.is_none() {
        tracing::warn!("LLM_API_KEY is not set; LLM calls will fall back");
    }
    if config.search.api_key.is_none() {
        tracing::warn!("TAVILY_API_KEY is not set; web search is disabled");
    }
    if let Some(path) = &config.feedback_path {
        tracing::info!("Feedback file: {}", path.display());
    }

    let state = AppState::new(config.clone())?;
    tracing::info!("Knowledge base ready with {} entries", state.knowledge.len());

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
