use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;

use crate::adapters::database::Database;

pub struct AppState {
    pub db: Database,
    pub start_time: Instant,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/status", get(status))
        .route("/api/quotes", get(quotes))
        .route("/api/history/{symbol}", get(quote_history))
        .route("/api/latencies", get(latencies))
        .route("/api/opportunities", get(opportunities))
        .route("/api/trades", get(trades))
        .route("/api/performance", get(performance))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct StatusResponse {
    uptime_secs: u64,
    symbols_quoted: usize,
    live_opportunities: usize,
    total_pnl: f64,
    trades_executed: u64,
    success_rate: f64,
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let quotes = state.db.get_quotes().await.unwrap_or_default();
    let opportunities = state.db.get_opportunities().await.unwrap_or_default();
    let performance = state.db.get_performance().await.unwrap_or_default();

    let (total_pnl, trades_executed, success_rate) = performance
        .map(|p| (p.total_pnl, p.trades_executed, p.success_rate))
        .unwrap_or((0.0, 0, 0.0));

    Json(StatusResponse {
        uptime_secs: state.start_time.elapsed().as_secs(),
        symbols_quoted: quotes.len(),
        live_opportunities: opportunities.len(),
        total_pnl,
        trades_executed,
        success_rate,
    })
}

async fn quotes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let quotes = state
        .db
        .get_quotes()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(serde_json::to_value(quotes).unwrap_or_default()))
}

async fn quote_history(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let history = state
        .db
        .get_quote_history(&symbol.to_uppercase(), 100)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(serde_json::to_value(history).unwrap_or_default()))
}

async fn latencies(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let latencies = state
        .db
        .get_latencies()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(serde_json::to_value(latencies).unwrap_or_default()))
}

async fn opportunities(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let opportunities = state
        .db
        .get_opportunities()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(serde_json::to_value(opportunities).unwrap_or_default()))
}

async fn trades(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let trades = state
        .db
        .get_recent_trades(100)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(serde_json::to_value(trades).unwrap_or_default()))
}

async fn performance(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let snapshot = state
        .db
        .get_performance()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(serde_json::to_value(snapshot).unwrap_or_default()))
}
