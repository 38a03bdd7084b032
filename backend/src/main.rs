use std::sync::Arc;

use backend::api::{self, AppState};
use backend::game::spawn_game_server;
use backend::scores::{InMemoryScoreStore, ScoreStore};
use chess_match::core::ServerConfig;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::load()?;
    info!(
        "[BACKEND] Match threshold {}, grace period {:?}",
        config.matching.match_threshold,
        config.matching.grace_period()
    );

    let scores: Arc<dyn ScoreStore> = Arc::new(InMemoryScoreStore::new());
    let server = spawn_game_server(&config, Arc::clone(&scores));
    let app = api::router(AppState { server, scores });

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!("[BACKEND] Listening on {}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
