use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use dashchat::config::ServerConfig;
use dashchat::llm::openai_compatible::OpenAICompatibleBackend;
use dashchat::orchestration::conversation::{ChatOrchestrator, OrchestratorOptions};
use dashchat::server::{router, AppState};
use dashchat::tools::registry::ToolRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env();
    let backend = Arc::new(OpenAICompatibleBackend::new(config.model.clone())?);
    let registry = Arc::new(ToolRegistry::with_builtin_tools());
    let orchestrator = Arc::new(
        ChatOrchestrator::new(backend, registry).with_options(OrchestratorOptions {
            max_rounds: config.max_rounds,
        }),
    );

    let app = router(AppState { orchestrator });
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("server running on http://{addr}");
    tracing::info!("chat endpoint: POST http://{addr}/api/chat");
    axum::serve(listener, app).await?;
    Ok(())
}
