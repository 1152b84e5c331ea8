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
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::adapters::alpha_vantage::{AlphaVantageClient, QuoteCollector};
use crate::adapters::database::Database;
use crate::adapters::latency::LatencyMonitor;
use crate::config::Config;
use crate::domain::Opportunity;
use crate::engine::executor::{ExecutionLoop, PaperTrader};
use crate::scanner::Scanner;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "venue_arb_bot=info,tower_http=info".into()),
        )
        .init();

    info!("Venue arbitrage bot starting up...");

    let config = Config::load()?;
    info!(
        "Config loaded. {} symbols, {} venues, floor {} bps",
        config.symbols.len(),
        config.detection.venues.len(),
        config.detection.min_profit_bps
    );

    // Database
    let db = Database::new(&config.db_path).await?;
    info!("Database initialized at {}", config.db_path);

    // Ranked opportunities flow to a single executor; the channel hand-off
    // is what prevents double execution.
    let (opportunity_tx, opportunity_rx) = mpsc::channel::<Opportunity>(256);

    let trader = PaperTrader::new(config.execution.clone());

    // --- Quote collector ---
    match &config.alpha_vantage_api_key {
        Some(key) => {
            let client = AlphaVantageClient::new(key.clone())?;
            let collector = QuoteCollector::new(
                client,
                db.clone(),
                config.symbols.clone(),
                config.quote_ttl_secs,
                config.fetch_delay_ms,
                config.collect_interval_secs,
            );
            tokio::spawn(async move { collector.run().await });
        }
        None => warn!("ALPHA_VANTAGE_API_KEY not set — quote collection disabled, detection runs off stored quotes"),
    }

    // --- Latency monitor ---
    let monitor = LatencyMonitor::new(
        db.clone(),
        config.venue_endpoints.clone(),
        config.latency_ttl_secs,
        config.latency_probe_interval_secs,
    );
    tokio::spawn(async move { monitor.run().await });

    // --- Detection cycle ---
    let scanner = Scanner::new(
        db.clone(),
        config.detection.clone(),
        config.symbols.clone(),
        config.quote_ttl_secs,
        opportunity_tx,
    );
    tokio::spawn(async move { scanner.run().await });

    // --- Paper execution ---
    let execution_loop = ExecutionLoop::new(trader, db.clone(), opportunity_rx);
    tokio::spawn(async move { execution_loop.run().await });

    // --- Dashboard API ---
    let app_state = Arc::new(api::AppState {
        db: db.clone(),
        start_time: Instant::now(),
    });
    let app = api::router(app_state);
    let port = config.dashboard_port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Dashboard API running on http://0.0.0.0:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Bot shutting down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    info!("Shutdown signal received");
}
