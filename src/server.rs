mod adapters;
mod api;
mod config;
mod domain;
mod engine;
mod scanner;
mod strategy;

use eyre::Result;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::adapters::database::Database;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(
            "venue_arb_bot=info,tower_http=info",
        ))
        .init();

    let config = Config::load()?;
    let db = Database::new(&config.db_path).await?;

    let app_state = Arc::new(api::AppState {
        db,
        start_time: Instant::now(),
    });

    let app = api::router(app_state);
    let port = config.dashboard_port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Dashboard server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await?;

    Ok(())
}
