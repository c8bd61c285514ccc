use std::net::SocketAddr;
use std::sync::Arc;

use talktally::audio::ChunkBuffer;
use talktally::config::AppConfig;
use talktally::diarize::PyannoteAdapter;
use talktally::resolve::ResolutionSession;
use talktally::server::{self, AppState};
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let provider = match &config.api_url {
        Some(url) => PyannoteAdapter::with_base_url(config.api_key.clone(), url.clone()),
        None => PyannoteAdapter::new(config.api_key.clone()),
    };

    let state = AppState {
        session: Arc::new(Mutex::new(ResolutionSession::new(config.strategy.matcher()))),
        buffer: Arc::new(Mutex::new(ChunkBuffer::new())),
        provider: Arc::new(provider),
        webhook_url: config.webhook_url.clone(),
    };

    let app = server::router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    tracing::info!("Backend server starting on http://localhost:{}", config.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
